//! In-memory [`CalendarStore`] for service tests.
//!
//! Stores raw iCalendar text per `(calendar, uid)` with a numeric ETag and
//! honours write conditions the way a CalDAV server does.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use calsync_core::{EventKind, decode_calendar};
use chrono::{DateTime, Utc};

use crate::store::{
    BoxFuture, CalendarInfo, CalendarStore, EventResource, QueryResult, SkippedEntry,
    WriteCondition, WriteStatus,
};

struct Stored {
    ics: String,
    etag: String,
}

pub(crate) struct MemoryStore {
    calendar: CalendarInfo,
    resources: Mutex<BTreeMap<(String, String), Stored>>,
    version: AtomicU64,
    interfere: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn new(calendar_id: &str) -> Self {
        Self {
            calendar: CalendarInfo::new(calendar_id, calendar_id, format!("/{}/", calendar_id)),
            resources: Mutex::new(BTreeMap::new()),
            version: AtomicU64::new(0),
            interfere: AtomicBool::new(false),
        }
    }

    fn next_etag(&self) -> String {
        format!("\"{}\"", self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Stores text as-is, bypassing the codec.
    pub(crate) fn insert_raw(&self, calendar_id: &str, uid: &str, ics: &str) {
        let etag = self.next_etag();
        self.resources.lock().unwrap().insert(
            (calendar_id.to_string(), uid.to_string()),
            Stored {
                ics: ics.to_string(),
                etag,
            },
        );
    }

    pub(crate) fn raw(&self, calendar_id: &str, uid: &str) -> Option<String> {
        self.resources
            .lock()
            .unwrap()
            .get(&(calendar_id.to_string(), uid.to_string()))
            .map(|s| s.ics.clone())
    }

    /// Makes the next write see a resource changed by another client.
    pub(crate) fn interfere_with_next_write(&self) {
        self.interfere.store(true, Ordering::SeqCst);
    }

    fn put(&self, calendar_id: &str, uid: &str, ics: String, condition: WriteCondition) -> WriteStatus {
        let key = (calendar_id.to_string(), uid.to_string());
        let mut resources = self.resources.lock().unwrap();

        if self.interfere.swap(false, Ordering::SeqCst) {
            if let Some(stored) = resources.get_mut(&key) {
                stored.etag = self.next_etag();
            }
        }

        let current = resources.get(&key).map(|s| s.etag.as_str());
        let allowed = match (&condition, current) {
            (WriteCondition::CreateOnly, Some(_)) => false,
            (WriteCondition::IfMatch(expected), Some(actual)) => expected == actual,
            (WriteCondition::IfMatch(_), None) => false,
            _ => true,
        };
        if !allowed {
            return WriteStatus::PreconditionFailed;
        }

        let etag = self.next_etag();
        resources.insert(
            key,
            Stored {
                ics,
                etag: etag.clone(),
            },
        );
        WriteStatus::Written { etag: Some(etag) }
    }

    fn query(&self, calendar_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> QueryResult {
        let resources = self.resources.lock().unwrap();
        let mut result = QueryResult::default();

        for ((calendar, uid), stored) in resources.iter() {
            if calendar != calendar_id {
                continue;
            }
            for decoded in decode_calendar(&stored.ics) {
                match decoded {
                    Ok(event) if event.kind() == EventKind::Master || event.overlaps(start, end) => {
                        result.events.push(event)
                    }
                    Ok(_) => {}
                    Err(error) => result.skipped.push(SkippedEntry {
                        href: format!("/{}/{}.ics", calendar, uid),
                        error,
                    }),
                }
            }
        }

        result
    }
}

impl CalendarStore for MemoryStore {
    fn discover_calendars(&self) -> BoxFuture<'_, Vec<CalendarInfo>> {
        let calendars = vec![self.calendar.clone()];
        Box::pin(async move { calendars })
    }

    fn query_events<'a>(
        &'a self,
        calendar_id: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, QueryResult> {
        let result = self.query(calendar_id, start, end);
        Box::pin(async move { result })
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        uid: &'a str,
    ) -> BoxFuture<'a, Option<EventResource>> {
        let resource = self
            .resources
            .lock()
            .unwrap()
            .get(&(calendar_id.to_string(), uid.to_string()))
            .map(|s| EventResource {
                ics: s.ics.clone(),
                etag: Some(s.etag.clone()),
            });
        Box::pin(async move { resource })
    }

    fn put_event<'a>(
        &'a self,
        calendar_id: &'a str,
        uid: &'a str,
        ics: String,
        condition: WriteCondition,
    ) -> BoxFuture<'a, WriteStatus> {
        let status = self.put(calendar_id, uid, ics, condition);
        Box::pin(async move { status })
    }

    fn delete_event<'a>(&'a self, calendar_id: &'a str, uid: &'a str) -> BoxFuture<'a, bool> {
        let removed = self
            .resources
            .lock()
            .unwrap()
            .remove(&(calendar_id.to_string(), uid.to_string()))
            .is_some();
        Box::pin(async move { removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_conditions() {
        let store = MemoryStore::new("cal");
        assert!(store.put("cal", "a", "v1".into(), WriteCondition::CreateOnly).is_written());
        assert_eq!(
            store.put("cal", "a", "v2".into(), WriteCondition::CreateOnly),
            WriteStatus::PreconditionFailed
        );
        assert_eq!(
            store.put("cal", "a", "v2".into(), WriteCondition::IfMatch("\"0\"".into())),
            WriteStatus::PreconditionFailed
        );
        assert!(
            store
                .put("cal", "a", "v2".into(), WriteCondition::IfMatch("\"1\"".into()))
                .is_written()
        );
        assert_eq!(store.raw("cal", "a").as_deref(), Some("v2"));
    }
}
