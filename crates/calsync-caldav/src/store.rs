//! The [`CalendarStore`] trait: the five remote operations the service needs.
//!
//! Every operation is a single round trip and reports failure through its
//! return value (empty list, `None`, `false`, [`WriteStatus::Failed`])
//! rather than an error. The remote server's availability is outside the
//! engine's control, so callers branch on the result instead.

use std::future::Future;
use std::pin::Pin;

use calsync_core::{DecodeError, Event};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A boxed future so the trait stays object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A calendar collection found under the principal's calendar home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarInfo {
    /// Last path segment of `href`, percent-decoded.
    pub id: String,
    /// Display name, falling back to `id`.
    pub name: String,
    pub href: String,
    /// Collection change tag, when the server reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctag: Option<String>,
    /// Component types the calendar accepts (`VEVENT`, `VTODO`, ...).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<String>,
}

impl CalendarInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            href: href.into(),
            ctag: None,
            components: Vec::new(),
        }
    }

    /// Returns `true` if the calendar can hold events. A server that does
    /// not advertise its component set is assumed to accept them.
    pub fn supports_events(&self) -> bool {
        self.components.is_empty() || self.components.iter().any(|c| c == "VEVENT")
    }
}

/// A query result entry that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub href: String,
    pub error: DecodeError,
}

/// Events returned by a time-range query.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    /// Decoded events, masters unexpanded.
    pub events: Vec<Event>,
    /// Entries dropped because their calendar data did not decode.
    pub skipped: Vec<SkippedEntry>,
}

/// A fetched event resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventResource {
    /// Raw iCalendar text.
    pub ics: String,
    /// Entity tag, used to guard the next write.
    pub etag: Option<String>,
}

/// Precondition attached to a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteCondition {
    /// Only create; fail if the resource exists (`If-None-Match: *`).
    CreateOnly,
    /// Only overwrite the version with this entity tag (`If-Match`).
    IfMatch(String),
    /// Write regardless of the current state.
    Unconditional,
}

impl WriteCondition {
    /// `IfMatch` when an entity tag is known, `Unconditional` otherwise.
    pub fn from_etag(etag: Option<String>) -> Self {
        match etag {
            Some(etag) => Self::IfMatch(etag),
            None => Self::Unconditional,
        }
    }
}

/// Outcome of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// Stored; carries the new entity tag when the server returned one.
    Written { etag: Option<String> },
    /// The write condition did not hold (`412`).
    PreconditionFailed,
    /// Any other failure.
    Failed,
}

impl WriteStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}

/// Remote calendar storage.
pub trait CalendarStore: Send + Sync {
    /// Lists the calendars under the configured principal.
    fn discover_calendars(&self) -> BoxFuture<'_, Vec<CalendarInfo>>;

    /// Fetches the events of `calendar_id` overlapping `[start, end]`.
    fn query_events<'a>(
        &'a self,
        calendar_id: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, QueryResult>;

    /// Fetches the resource holding event `uid`.
    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        uid: &'a str,
    ) -> BoxFuture<'a, Option<EventResource>>;

    /// Writes `ics` as the resource for event `uid`.
    fn put_event<'a>(
        &'a self,
        calendar_id: &'a str,
        uid: &'a str,
        ics: String,
        condition: WriteCondition,
    ) -> BoxFuture<'a, WriteStatus>;

    /// Removes the resource for event `uid`.
    fn delete_event<'a>(&'a self, calendar_id: &'a str, uid: &'a str) -> BoxFuture<'a, bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_without_component_set_supports_events() {
        let mut info = CalendarInfo::new("work", "Work", "/cal/alice/work/");
        assert!(info.supports_events());

        info.components = vec!["VTODO".to_string()];
        assert!(!info.supports_events());

        info.components.push("VEVENT".to_string());
        assert!(info.supports_events());
    }

    #[test]
    fn condition_from_etag() {
        assert_eq!(
            WriteCondition::from_etag(Some("\"v1\"".to_string())),
            WriteCondition::IfMatch("\"v1\"".to_string())
        );
        assert_eq!(WriteCondition::from_etag(None), WriteCondition::Unconditional);
    }

    #[test]
    fn calendar_info_json_skips_empty_fields() {
        let info = CalendarInfo::new("work", "Work", "/cal/alice/work/");
        insta::assert_json_snapshot!(info, @r#"
        {
          "id": "work",
          "name": "Work",
          "href": "/cal/alice/work/"
        }
        "#);
    }
}
