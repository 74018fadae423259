//! [`CalendarStore`] over CalDAV.

use calsync_core::decode_calendar;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::CalDavResult;
use crate::store::{
    BoxFuture, CalendarInfo, CalendarStore, EventResource, QueryResult, SkippedEntry,
    WriteCondition, WriteStatus,
};

use super::client::CalDavClient;
use super::config::CalDavConfig;
use super::xml::{
    ReportEntry, calendar_query_body, parse_propfind_response, parse_report_response,
    propfind_calendars_body,
};

/// Calendar storage on a CalDAV server.
///
/// Failures are logged and turned into fail-soft results; nothing here
/// returns an error to the caller.
pub struct CalDavTransport {
    client: CalDavClient,
}

impl CalDavTransport {
    pub fn new(config: CalDavConfig) -> CalDavResult<Self> {
        Ok(Self {
            client: CalDavClient::new(config)?,
        })
    }

    pub fn config(&self) -> &CalDavConfig {
        self.client.config()
    }

    async fn try_discover(&self) -> CalDavResult<Vec<CalendarInfo>> {
        let url = self.config().calendar_home_url();
        debug!(url = %url, "Discovering calendars via PROPFIND");

        let body = propfind_calendars_body()?;
        let response = self.client.propfind(&url, &body, 1).await?;
        let calendars = parse_propfind_response(&response);

        info!(count = calendars.len(), "Discovered calendars");
        Ok(calendars)
    }

    async fn try_query(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> CalDavResult<Vec<ReportEntry>> {
        let url = self.config().calendar_url(calendar_id);
        debug!(calendar = %calendar_id, start = %start, end = %end, "Querying events with REPORT");

        let body = calendar_query_body(start, end)?;
        let response = self.client.report(&url, &body).await?;
        Ok(parse_report_response(&response))
    }
}

/// Decodes every REPORT entry, keeping failures on the side.
fn decode_entries(entries: Vec<ReportEntry>) -> QueryResult {
    let mut result = QueryResult::default();

    for entry in entries {
        for decoded in decode_calendar(&entry.calendar_data) {
            match decoded {
                Ok(event) => result.events.push(event),
                Err(error) => {
                    warn!(href = %entry.href, error = %error, "Skipping undecodable entry");
                    result.skipped.push(SkippedEntry {
                        href: entry.href.clone(),
                        error,
                    });
                }
            }
        }
    }

    result
}

impl CalendarStore for CalDavTransport {
    fn discover_calendars(&self) -> BoxFuture<'_, Vec<CalendarInfo>> {
        Box::pin(async move {
            match self.try_discover().await {
                Ok(calendars) => calendars,
                Err(e) => {
                    warn!(error = %e, "Calendar discovery failed");
                    Vec::new()
                }
            }
        })
    }

    fn query_events<'a>(
        &'a self,
        calendar_id: &'a str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> BoxFuture<'a, QueryResult> {
        Box::pin(async move {
            match self.try_query(calendar_id, start, end).await {
                Ok(entries) => {
                    let result = decode_entries(entries);
                    info!(
                        calendar = %calendar_id,
                        count = result.events.len(),
                        skipped = result.skipped.len(),
                        "Fetched events"
                    );
                    result
                }
                Err(e) => {
                    warn!(calendar = %calendar_id, error = %e, "Event query failed");
                    QueryResult::default()
                }
            }
        })
    }

    fn get_event<'a>(
        &'a self,
        calendar_id: &'a str,
        uid: &'a str,
    ) -> BoxFuture<'a, Option<EventResource>> {
        Box::pin(async move {
            let url = self.config().event_url(calendar_id, uid);
            match self.client.get(&url).await {
                Ok(resource) => Some(resource),
                Err(e) => {
                    warn!(calendar = %calendar_id, uid = %uid, error = %e, "Fetching event failed");
                    None
                }
            }
        })
    }

    fn put_event<'a>(
        &'a self,
        calendar_id: &'a str,
        uid: &'a str,
        ics: String,
        condition: WriteCondition,
    ) -> BoxFuture<'a, WriteStatus> {
        Box::pin(async move {
            let url = self.config().event_url(calendar_id, uid);
            match self.client.put(&url, ics, &condition).await {
                Ok(etag) => {
                    debug!(calendar = %calendar_id, uid = %uid, "Stored event");
                    WriteStatus::Written { etag }
                }
                Err(e) if e.is_precondition_failed() => {
                    warn!(calendar = %calendar_id, uid = %uid, ?condition, "Write precondition failed");
                    WriteStatus::PreconditionFailed
                }
                Err(e) => {
                    warn!(calendar = %calendar_id, uid = %uid, error = %e, "Storing event failed");
                    WriteStatus::Failed
                }
            }
        })
    }

    fn delete_event<'a>(&'a self, calendar_id: &'a str, uid: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let url = self.config().event_url(calendar_id, uid);
            match self.client.delete(&url).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(calendar = %calendar_id, uid = %uid, error = %e, "Deleting event failed");
                    false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::DecodeError;
    use std::time::Duration;

    fn entry(href: &str, data: &str) -> ReportEntry {
        ReportEntry {
            href: href.to_string(),
            etag: None,
            calendar_data: data.to_string(),
        }
    }

    #[test]
    fn one_bad_entry_does_not_drop_the_batch() {
        let entries = vec![
            entry(
                "/cal/a.ics",
                "BEGIN:VEVENT\nUID:a\nSUMMARY:Good\nDTSTART:20240101T090000Z\nEND:VEVENT",
            ),
            entry(
                "/cal/b.ics",
                "BEGIN:VEVENT\nUID:b\nDTSTART:20240101T090000Z\nEND:VEVENT",
            ),
            entry(
                "/cal/c.ics",
                "BEGIN:VEVENT\nUID:c\nSUMMARY:Master\nDTSTART:20240101T090000Z\nRRULE:FREQ=DAILY\nEND:VEVENT\n\
                 BEGIN:VEVENT\nUID:c\nSUMMARY:Moved\nDTSTART:20240102T100000Z\nRECURRENCE-ID:20240102T090000Z\nEND:VEVENT",
            ),
        ];

        let result = decode_entries(entries);
        let uids: Vec<_> = result.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(uids, vec!["Good", "Master", "Moved"]);
        assert_eq!(
            result.skipped,
            vec![SkippedEntry {
                href: "/cal/b.ics".to_string(),
                error: DecodeError::MissingTitle {
                    uid: "b".to_string()
                },
            }]
        );
    }

    #[tokio::test]
    async fn unreachable_server_fails_soft() {
        let config = CalDavConfig::new("http://127.0.0.1:9/", "alice")
            .unwrap()
            .with_timeout(Duration::from_secs(2));
        let transport = CalDavTransport::new(config).unwrap();

        assert!(transport.discover_calendars().await.is_empty());
        assert!(transport.get_event("work", "missing").await.is_none());
        assert_eq!(
            transport
                .put_event("work", "x", String::new(), WriteCondition::CreateOnly)
                .await,
            WriteStatus::Failed
        );
        assert!(!transport.delete_event("work", "x").await);
    }
}
