//! Recurrence expansion.
//!
//! Turns master events into the concrete occurrences that overlap a query
//! window. Exceptions and plain events pass through untouched. Generation
//! is delegated to the `rrule` crate; this module owns the window math,
//! the excluded-date filter and the shape of the emitted occurrences.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rrule::RRuleSet;
use tracing::{debug, warn};

use crate::error::ExpandError;
use crate::event::{Event, EventKind, OccurrenceInfo};
use crate::recurrence::RecurrenceRule;
use crate::time::{EventTime, end_of_day, format_ical_datetime};

/// Upper bound on generated instances per master and query.
pub const MAX_OCCURRENCES: u16 = 1000;

/// Format of the instant part of a synthesized occurrence id.
const OCCURRENCE_ID_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Expands every master in `events` over the inclusive window.
///
/// Exceptions and plain events are returned unchanged. A master that cannot
/// be expanded is returned as-is, so one broken rule never empties a batch.
pub fn expand(
    events: Vec<Event>,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<Event> {
    let mut out = Vec::with_capacity(events.len());

    for event in events {
        if event.kind() != EventKind::Master {
            out.push(event);
            continue;
        }

        match expand_event(&event, window_start, window_end) {
            Ok(occurrences) => {
                debug!(
                    uid = %event.uid,
                    count = occurrences.len(),
                    "Expanded recurring event"
                );
                out.extend(occurrences);
            }
            Err(e) => {
                warn!(uid = %event.uid, error = %e, "Returning recurring event unexpanded");
                out.push(event);
            }
        }
    }

    out
}

/// Generates the occurrences of a single master that overlap the window.
///
/// The search starts one event duration before `window_start`, so an
/// occurrence that begins earlier but runs into the window is included.
/// Candidates whose date is in the master's `exdates` are dropped.
/// Non-masters yield an empty list.
pub fn expand_event(
    master: &Event,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Event>, ExpandError> {
    let Some(ref rule) = master.recurrence else {
        return Ok(Vec::new());
    };
    if master.recurrence_id.is_some() {
        return Ok(Vec::new());
    }

    let overflow = || ExpandError::Overflow {
        uid: master.uid.clone(),
    };

    let duration = master.duration();
    let search_start = window_start
        .checked_sub_signed(duration)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    if window_end < search_start || window_end < master.start {
        return Ok(Vec::new());
    }

    let set: RRuleSet = rrule_text(master.start, rule)
        .parse::<RRuleSet>()
        .map_err(|e| ExpandError::Rule {
            uid: master.uid.clone(),
            message: e.to_string(),
        })?;

    // `after`/`before` are exclusive; widen by a second and filter exactly below.
    let one_second = Duration::seconds(1);
    let after = search_start
        .max(master.start)
        .checked_sub_signed(one_second)
        .ok_or_else(overflow)?;
    let before = window_end
        .checked_add_signed(one_second)
        .ok_or_else(overflow)?;

    let tz: rrule::Tz = Utc.into();
    let result = set
        .after(after.with_timezone(&tz))
        .before(before.with_timezone(&tz))
        .all(MAX_OCCURRENCES);

    if result.dates.len() >= usize::from(MAX_OCCURRENCES) {
        warn!(
            uid = %master.uid,
            limit = MAX_OCCURRENCES,
            "Occurrence limit reached, later instances are omitted"
        );
    }

    let mut occurrences = Vec::new();
    for date in &result.dates {
        let start = date.with_timezone(&Utc);
        if start < search_start || start > window_end {
            continue;
        }
        let instance_date = start.date_naive();
        if master.exdates.contains(&instance_date) {
            continue;
        }

        let end = start.checked_add_signed(duration).ok_or_else(overflow)?;
        occurrences.push(occurrence_of(master, start, end));
    }

    Ok(occurrences)
}

fn occurrence_of(master: &Event, start: DateTime<Utc>, end: DateTime<Utc>) -> Event {
    let mut occurrence = master.clone();
    occurrence.start = start;
    occurrence.end = Some(end);
    occurrence.occurrence = Some(OccurrenceInfo {
        id: occurrence_id(&master.uid, start),
        master_uid: master.uid.clone(),
        instance_date: start.date_naive(),
    });
    occurrence
}

/// Builds the id of the occurrence of `master_uid` starting at `start`.
pub fn occurrence_id(master_uid: &str, start: DateTime<Utc>) -> String {
    format!("{}_{}", master_uid, start.format(OCCURRENCE_ID_FORMAT))
}

/// Composes the `DTSTART` + `RRULE` text the `rrule` parser expects.
///
/// A date-only `UNTIL` covers its whole day, and the engine needs a UTC
/// `UNTIL` to match the UTC `DTSTART`.
fn rrule_text(start: DateTime<Utc>, rule: &RecurrenceRule) -> String {
    let rule = match rule.until() {
        Some(EventTime::AllDay(date)) => rule
            .clone()
            .with_until(EventTime::DateTime(end_of_day(date))),
        _ => rule.clone(),
    };
    format!("DTSTART:{}\nRRULE:{}", format_ical_datetime(start), rule)
}
