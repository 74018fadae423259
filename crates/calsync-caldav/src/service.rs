//! Calendar operations composed from a [`CalendarStore`], the iCalendar
//! codec and the recurrence expander.
//!
//! Reads are expanded before they reach the caller. Writes that modify an
//! existing resource fetch it, merge, and write it back under `If-Match`,
//! so a concurrent modification surfaces as [`ServiceError::Conflict`]
//! instead of being silently overwritten.
//!
//! A recurring series changes in two ways:
//!
//! - editing one occurrence stores a separate exception resource whose
//!   `RECURRENCE-ID` names the original start; the master is untouched
//! - deleting one occurrence adds its date to the master's `EXDATE`s

use calsync_core::time::{format_ical_datetime, start_of_day};
use calsync_core::{
    DecodeError, Event, RecurrenceRule, RuleError, decode_calendar, encode_calendar, expand,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{CalendarInfo, CalendarStore, WriteCondition, WriteStatus};

/// Why a calendar operation failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The resource does not exist or could not be fetched.
    #[error("event {uid} not found")]
    NotFound { uid: String },

    /// The stored calendar data is not a usable event.
    #[error("event {uid} could not be decoded: {source}")]
    Decode { uid: String, source: DecodeError },

    /// An occurrence-level operation targeted an event without a recurrence rule.
    #[error("event {uid} is not recurring")]
    NotRecurring { uid: String },

    /// The resource changed between read and write.
    #[error("event {uid} was modified by someone else, retry the operation")]
    Conflict { uid: String },

    /// The server rejected or did not answer the write.
    #[error("writing event {uid} failed")]
    WriteFailed { uid: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Fields of a new event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub location: Option<String>,
    pub description: Option<String>,
    pub recurrence: Option<RecurrenceRule>,
}

impl EventDraft {
    pub fn new(title: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            start,
            end: None,
            all_day: false,
            location: None,
            description: None,
            recurrence: None,
        }
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// All-day events keep only the date of `start` and `end`.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    fn into_event(self, uid: String) -> ServiceResult<Event> {
        let mut event = Event::new(uid, self.title, self.start).with_all_day(self.all_day);
        event.end = self.end;
        event.location = self.location;
        event.description = self.description;
        event.recurrence = self.recurrence;
        normalize(&mut event)?;
        Ok(event)
    }
}

/// Field overrides for an existing event or a single occurrence.
///
/// `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl EventPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the overrides. Moving the start without a new end keeps the
    /// event's duration.
    fn apply(self, event: &mut Event) -> ServiceResult<()> {
        let duration = event.duration();

        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(location) = self.location {
            event.location = Some(location);
        }
        if let Some(description) = self.description {
            event.description = Some(description);
        }
        if let Some(all_day) = self.all_day {
            event.all_day = all_day;
        }

        if let Some(start) = self.start {
            event.start = start;
            if self.end.is_none() && event.end.is_some() {
                let end = start.checked_add_signed(duration).ok_or_else(|| {
                    ServiceError::InvalidInput(format!("start {} is out of range", start))
                })?;
                event.end = Some(end);
            }
        }
        if let Some(end) = self.end {
            event.end = Some(end);
        }

        normalize(event)
    }
}

/// What to do with an event's recurrence rule on update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecurrenceChange {
    /// Keep the rule and its excluded dates.
    #[default]
    Keep,
    /// Make the event non-recurring.
    Remove,
    /// Use a new rule; previously excluded dates are dropped.
    Replace(RecurrenceRule),
}

impl RecurrenceChange {
    /// Maps a command-line value: absent keeps, empty removes, anything else
    /// is parsed as an RRULE.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, RuleError> {
        match arg.map(str::trim) {
            None => Ok(Self::Keep),
            Some("") => Ok(Self::Remove),
            Some(rule) => rule.parse().map(Self::Replace),
        }
    }
}

/// Rejects an end before the start and snaps all-day events to date
/// boundaries.
///
/// An all-day end is rounded up to the next midnight, and an end on the
/// start date itself covers that whole day, so `DTEND` always lies after
/// `DTSTART`.
fn normalize(event: &mut Event) -> ServiceResult<()> {
    if let Some(end) = event.end {
        if end < event.start {
            return Err(ServiceError::InvalidInput(format!(
                "end {} is before start {}",
                end, event.start
            )));
        }
    }
    if !event.all_day {
        return Ok(());
    }

    let out_of_range =
        |instant: DateTime<Utc>| ServiceError::InvalidInput(format!("{} is out of range", instant));
    event.start = start_of_day(event.start.date_naive());
    if let Some(end) = event.end {
        let mut day_end = start_of_day(end.date_naive());
        if day_end < end {
            day_end = day_end
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| out_of_range(end))?;
        }
        if day_end <= event.start {
            day_end = event
                .start
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| out_of_range(end))?;
        }
        event.end = Some(day_end);
    }
    Ok(())
}

/// Identifier of the exception resource for the occurrence of `master_uid`
/// originally starting at `original_start`.
pub fn exception_uid(master_uid: &str, original_start: DateTime<Utc>) -> String {
    format!(
        "{}-exception-{}",
        master_uid,
        format_ical_datetime(original_start)
    )
}

/// Calendar operations over a [`CalendarStore`].
pub struct CalendarService<S> {
    store: S,
}

impl<S: CalendarStore> CalendarService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn list_calendars(&self) -> Vec<CalendarInfo> {
        self.store.discover_calendars().await
    }

    /// Returns the events overlapping `[start, end]` with every recurring
    /// series expanded into occurrences. Exceptions are returned next to the
    /// generated occurrence they replace; hiding that occurrence is up to
    /// the caller unless its date is also excluded.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<Event> {
        let result = self.store.query_events(calendar_id, start, end).await;
        expand(result.events, start, end)
    }

    /// Stores a new event under a generated UID and returns the UID.
    pub async fn create_event(&self, calendar_id: &str, draft: EventDraft) -> ServiceResult<String> {
        let uid = Uuid::new_v4().to_string();
        let event = draft.into_event(uid.clone())?;

        self.write(calendar_id, &uid, std::slice::from_ref(&event), WriteCondition::CreateOnly)
            .await?;
        info!(calendar = %calendar_id, uid = %uid, "Created event");
        Ok(uid)
    }

    /// Merges `patch` and `recurrence` into the stored event and writes it back.
    pub async fn update_event(
        &self,
        calendar_id: &str,
        uid: &str,
        patch: EventPatch,
        recurrence: RecurrenceChange,
    ) -> ServiceResult<Event> {
        let mut stored = self.fetch(calendar_id, uid).await?;

        patch.apply(&mut stored.event)?;
        match recurrence {
            RecurrenceChange::Keep => {}
            RecurrenceChange::Remove => {
                stored.event.recurrence = None;
                stored.clear_series_changes();
            }
            RecurrenceChange::Replace(rule) => {
                stored.event.recurrence = Some(rule);
                stored.clear_series_changes();
            }
        }

        self.write_back(calendar_id, uid, &stored).await?;
        info!(calendar = %calendar_id, uid = %uid, "Updated event");
        Ok(stored.event)
    }

    /// Overrides the occurrence of `master_uid` that starts at
    /// `original_start` and returns the UID of the exception resource.
    ///
    /// Fields not in `patch` are inherited from the master; without a new
    /// end the occurrence keeps the master's duration. Editing the same
    /// occurrence again rewrites the same exception.
    pub async fn update_recurring_instance(
        &self,
        calendar_id: &str,
        master_uid: &str,
        original_start: DateTime<Utc>,
        patch: EventPatch,
    ) -> ServiceResult<String> {
        let master = self.fetch(calendar_id, master_uid).await?.event;
        if master.recurrence.is_none() {
            return Err(ServiceError::NotRecurring {
                uid: master_uid.to_string(),
            });
        }

        let uid = exception_uid(master_uid, original_start);
        let duration = master.duration();
        let mut exception = master;
        exception.uid = uid.clone();
        exception.start = original_start;
        exception.end = original_start.checked_add_signed(duration);
        exception.recurrence = None;
        exception.exdates.clear();
        exception.recurrence_id = Some(original_start);
        patch.apply(&mut exception)?;

        let condition = match self.store.get_event(calendar_id, &uid).await {
            Some(existing) => WriteCondition::from_etag(existing.etag),
            None => WriteCondition::CreateOnly,
        };
        self.write(calendar_id, &uid, std::slice::from_ref(&exception), condition)
            .await?;

        info!(
            calendar = %calendar_id,
            master = %master_uid,
            uid = %uid,
            "Stored occurrence exception"
        );
        Ok(uid)
    }

    /// Excludes the occurrence of `master_uid` on `date` from the series.
    ///
    /// Excluding an already excluded date succeeds without writing.
    pub async fn delete_recurring_instance(
        &self,
        calendar_id: &str,
        master_uid: &str,
        date: NaiveDate,
    ) -> ServiceResult<()> {
        let mut stored = self.fetch(calendar_id, master_uid).await?;
        if stored.event.recurrence.is_none() {
            return Err(ServiceError::NotRecurring {
                uid: master_uid.to_string(),
            });
        }

        if !stored.event.exdates.insert(date) {
            debug!(uid = %master_uid, %date, "Occurrence already excluded");
            return Ok(());
        }

        self.write_back(calendar_id, master_uid, &stored).await?;
        info!(calendar = %calendar_id, uid = %master_uid, %date, "Excluded occurrence");
        Ok(())
    }

    pub async fn delete_event(&self, calendar_id: &str, uid: &str) -> ServiceResult<()> {
        if self.store.delete_event(calendar_id, uid).await {
            info!(calendar = %calendar_id, uid = %uid, "Deleted event");
            Ok(())
        } else {
            Err(ServiceError::WriteFailed {
                uid: uid.to_string(),
            })
        }
    }

    /// Reads and decodes a resource. Any block that fails to decode fails
    /// the read, so a later write-back cannot drop it.
    async fn fetch(&self, calendar_id: &str, uid: &str) -> ServiceResult<StoredEvent> {
        let resource = self
            .store
            .get_event(calendar_id, uid)
            .await
            .ok_or_else(|| ServiceError::NotFound {
                uid: uid.to_string(),
            })?;

        let mut events = Vec::new();
        for decoded in decode_calendar(&resource.ics) {
            let event = decoded.map_err(|source| ServiceError::Decode {
                uid: uid.to_string(),
                source,
            })?;
            events.push(event);
        }

        // The master comes first; a standalone exception is its own primary.
        let primary = events
            .iter()
            .position(|e| e.recurrence_id.is_none())
            .unwrap_or(0);
        let event = events.remove(primary);

        Ok(StoredEvent {
            event,
            overrides: events,
            etag: resource.etag,
        })
    }

    /// Writes the primary event and the overrides stored with it under `If-Match`.
    async fn write_back(
        &self,
        calendar_id: &str,
        uid: &str,
        stored: &StoredEvent,
    ) -> ServiceResult<()> {
        let mut events = Vec::with_capacity(stored.overrides.len() + 1);
        events.push(stored.event.clone());
        events.extend(stored.overrides.iter().cloned());
        let condition = WriteCondition::from_etag(stored.etag.clone());
        self.write(calendar_id, uid, &events, condition).await
    }

    async fn write(
        &self,
        calendar_id: &str,
        uid: &str,
        events: &[Event],
        condition: WriteCondition,
    ) -> ServiceResult<()> {
        let ics = encode_calendar(events);
        match self.store.put_event(calendar_id, uid, ics, condition).await {
            WriteStatus::Written { .. } => Ok(()),
            WriteStatus::PreconditionFailed => Err(ServiceError::Conflict {
                uid: uid.to_string(),
            }),
            WriteStatus::Failed => Err(ServiceError::WriteFailed {
                uid: uid.to_string(),
            }),
        }
    }
}

/// A fetched resource: its primary event, the same-UID overrides stored
/// next to it, and the ETag to write back against.
struct StoredEvent {
    event: Event,
    overrides: Vec<Event>,
    etag: Option<String>,
}

impl StoredEvent {
    /// Drops excluded dates and stored overrides, which only make sense for
    /// the rule they were made against.
    fn clear_series_changes(&mut self) {
        self.event.exdates.clear();
        self.overrides.clear();
    }
}
