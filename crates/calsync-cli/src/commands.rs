//! Command handlers.
//!
//! Each handler drives a [`CalendarService`] and returns the text to print,
//! which keeps them testable against any [`CalendarStore`].

use calsync_caldav::{
    CalendarInfo, CalendarService, CalendarStore, EventDraft, EventPatch, RecurrenceChange,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::cli::{Details, FieldChanges};
use crate::error::{CliError, CliResult};
use crate::output::{
    OutputFormat, arrange_events, render_calendars, render_event, render_events, render_uid,
};

/// Arguments of `create`.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub details: Details,
    pub rrule: Option<String>,
}

pub async fn calendars<S: CalendarStore>(
    service: &CalendarService<S>,
    format: OutputFormat,
) -> CliResult<String> {
    let calendars = event_calendars(service.list_calendars().await);
    render_calendars(&calendars, format)
}

/// Keeps the calendars that can hold events, e.g. dropping task lists.
fn event_calendars(calendars: Vec<CalendarInfo>) -> Vec<CalendarInfo> {
    calendars.into_iter().filter(CalendarInfo::supports_events).collect()
}

/// Lists `[from, to]`; `to` defaults to `from + window_days`.
pub async fn events<S: CalendarStore>(
    service: &CalendarService<S>,
    calendar_id: &str,
    from: DateTime<Utc>,
    to: Option<DateTime<Utc>>,
    window_days: u32,
    format: OutputFormat,
) -> CliResult<String> {
    let to = match to {
        Some(to) => to,
        None => from
            .checked_add_signed(Duration::days(i64::from(window_days)))
            .ok_or_else(|| CliError::InvalidArgument(format!("--from {} is out of range", from)))?,
    };
    if to < from {
        return Err(CliError::InvalidArgument(format!(
            "--to {} is before --from {}",
            to, from
        )));
    }

    let events = arrange_events(service.list_events(calendar_id, from, to).await);
    render_events(&events, format)
}

pub async fn create<S: CalendarStore>(
    service: &CalendarService<S>,
    calendar_id: &str,
    new: NewEvent,
    format: OutputFormat,
) -> CliResult<String> {
    let mut draft = EventDraft::new(new.title, new.start).with_all_day(new.all_day);
    if let Some(end) = new.end {
        draft = draft.with_end(end);
    }
    if let Some(location) = new.details.location {
        draft = draft.with_location(location);
    }
    if let Some(description) = new.details.description {
        draft = draft.with_description(description);
    }
    if let Some(rrule) = new.rrule.as_deref().filter(|r| !r.trim().is_empty()) {
        draft = draft.with_recurrence(rrule.parse()?);
    }

    let uid = service.create_event(calendar_id, draft).await?;
    render_uid(&uid, format)
}

pub async fn update<S: CalendarStore>(
    service: &CalendarService<S>,
    calendar_id: &str,
    uid: &str,
    fields: FieldChanges,
    rrule: Option<String>,
    format: OutputFormat,
) -> CliResult<String> {
    let recurrence = RecurrenceChange::from_arg(rrule.as_deref())?;
    let patch = patch_from(fields);
    if patch.is_empty() && recurrence == RecurrenceChange::Keep {
        return Err(CliError::InvalidArgument("nothing to update".to_string()));
    }

    let event = service
        .update_event(calendar_id, uid, patch, recurrence)
        .await?;
    render_event(&event, format)
}

pub async fn edit_occurrence<S: CalendarStore>(
    service: &CalendarService<S>,
    calendar_id: &str,
    uid: &str,
    occurrence: DateTime<Utc>,
    fields: FieldChanges,
    format: OutputFormat,
) -> CliResult<String> {
    let patch = patch_from(fields);
    if patch.is_empty() {
        return Err(CliError::InvalidArgument("nothing to change".to_string()));
    }

    let exception = service
        .update_recurring_instance(calendar_id, uid, occurrence, patch)
        .await?;
    render_uid(&exception, format)
}

pub async fn skip_occurrence<S: CalendarStore>(
    service: &CalendarService<S>,
    calendar_id: &str,
    uid: &str,
    date: NaiveDate,
) -> CliResult<String> {
    service
        .delete_recurring_instance(calendar_id, uid, date)
        .await?;
    Ok(format!("Skipped {} on {}", uid, date))
}

pub async fn delete<S: CalendarStore>(
    service: &CalendarService<S>,
    calendar_id: &str,
    uid: &str,
) -> CliResult<String> {
    service.delete_event(calendar_id, uid).await?;
    Ok(format!("Deleted {}", uid))
}

fn patch_from(fields: FieldChanges) -> EventPatch {
    let mut patch = EventPatch::new();
    if let Some(title) = fields.title {
        patch = patch.with_title(title);
    }
    if let Some(start) = fields.start {
        patch = patch.with_start(start);
    }
    if let Some(end) = fields.end {
        patch = patch.with_end(end);
    }
    if let Some(all_day) = fields.all_day {
        patch = patch.with_all_day(all_day);
    }
    if let Some(location) = fields.details.location {
        patch = patch.with_location(location);
    }
    if let Some(description) = fields.details.description {
        patch = patch.with_description(description);
    }
    patch
}
