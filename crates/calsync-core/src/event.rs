//! The calendar event record.
//!
//! An [`Event`] is one of three kinds (see [`EventKind`]):
//!
//! - **master**: carries a [`RecurrenceRule`], defines a series
//! - **exception**: carries a `recurrence_id`, overrides one occurrence of a master
//! - **plain**: neither
//!
//! Occurrences produced by the expander are copies of a master with
//! [`Event::occurrence`] set. That field is never written to the wire.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;
use crate::time::EventTime;

/// Duration assumed when an event has no usable end: one hour for timed
/// events, one day for all-day events.
pub fn default_duration(all_day: bool) -> Duration {
    if all_day {
        Duration::days(1)
    } else {
        Duration::hours(1)
    }
}

/// The role an event plays in a recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Master,
    Exception,
    Plain,
}

/// Back-reference carried by an expanded occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceInfo {
    /// Synthesized identifier: `{master_uid}_{instant}`.
    pub id: String,
    /// UID of the master event this occurrence was generated from.
    pub master_uid: String,
    /// Date the occurrence falls on.
    pub instance_date: NaiveDate,
}

/// A single calendar entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Protocol-level primary key.
    pub uid: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start instant. Midnight UTC for all-day events.
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    /// Set when the start was a bare date on the wire.
    #[serde(default)]
    pub all_day: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<DateTime<Utc>>,
    /// Dates excluded from the series. Only meaningful on a master.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exdates: BTreeSet<NaiveDate>,
    /// Set only on expanded occurrences.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<OccurrenceInfo>,
}

impl Event {
    /// Creates a plain timed event.
    pub fn new(uid: impl Into<String>, title: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            title: title.into(),
            location: None,
            description: None,
            start,
            end: None,
            all_day: false,
            recurrence: None,
            recurrence_id: None,
            exdates: BTreeSet::new(),
            occurrence: None,
        }
    }

    /// Builder: set the end instant.
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder: mark as all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    /// Builder: set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder: attach a recurrence rule.
    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    /// Builder: mark as an exception for the occurrence at `original_start`.
    pub fn with_recurrence_id(mut self, original_start: DateTime<Utc>) -> Self {
        self.recurrence_id = Some(original_start);
        self
    }

    /// Builder: exclude a date from the series.
    pub fn with_exdate(mut self, date: NaiveDate) -> Self {
        self.exdates.insert(date);
        self
    }

    /// Returns the event's role in a series.
    ///
    /// An event with both fields set is treated as an exception.
    pub fn kind(&self) -> EventKind {
        if self.recurrence_id.is_some() {
            EventKind::Exception
        } else if self.recurrence.is_some() {
            EventKind::Master
        } else {
            EventKind::Plain
        }
    }

    /// Returns the identifier to show callers: the synthesized occurrence id
    /// for expanded occurrences, the UID otherwise.
    pub fn id(&self) -> &str {
        self.occurrence
            .as_ref()
            .map(|o| o.id.as_str())
            .unwrap_or(&self.uid)
    }

    /// Returns `true` for occurrences produced by the expander.
    pub fn is_recurring_instance(&self) -> bool {
        self.occurrence.is_some()
    }

    /// Returns `end - start`, or the default duration when there is no usable end.
    pub fn duration(&self) -> Duration {
        match self.end {
            Some(end) if end >= self.start => end - self.start,
            _ => default_duration(self.all_day),
        }
    }

    /// Returns the end instant, falling back to `start + duration()`.
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end.unwrap_or_else(|| self.start + self.duration())
    }

    /// Returns the start in its wire shape.
    pub fn start_time(&self) -> EventTime {
        self.as_event_time(self.start)
    }

    /// Returns an instant of this event (start, end, recurrence id) in its wire shape.
    pub fn as_event_time(&self, instant: DateTime<Utc>) -> EventTime {
        if self.all_day {
            EventTime::AllDay(instant.date_naive())
        } else {
            EventTime::DateTime(instant)
        }
    }

    /// Returns `true` if the event overlaps the inclusive window.
    pub fn overlaps(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> bool {
        self.start <= window_end && self.effective_end() >= window_start
    }
}
