//! Time values as they appear on the iCalendar wire.
//!
//! Three shapes are accepted for `DTSTART`, `DTEND`, `RECURRENCE-ID`,
//! `EXDATE` and `UNTIL` values:
//!
//! - `20250205T100000Z` (UTC)
//! - `20250205T100000` (floating local time, read as UTC)
//! - `20250205` (date only, all-day)
//!
//! Anything else is kept as [`ParsedDate::Unparsed`] so callers have to
//! decide what an unreadable value means for them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Format of a UTC date-time on the wire.
pub const ICAL_UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Format of a date-only value on the wire.
pub const ICAL_DATE_FORMAT: &str = "%Y%m%d";

const ICAL_FLOATING_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A point in time or an all-day date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// A calendar date without a time of day.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Returns `true` for the date-only form.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the instant, using midnight UTC for all-day dates.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => start_of_day(*date),
        }
    }

    /// Returns the date portion.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }

    /// Formats the value the way it is written after the property colon.
    pub fn to_ical_string(&self) -> String {
        match self {
            Self::DateTime(dt) => format_ical_datetime(*dt),
            Self::AllDay(date) => format_ical_date(*date),
        }
    }
}

/// Result of reading a wire date.
///
/// Unreadable values are carried verbatim instead of being compared as if
/// they were instants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedDate {
    /// The value matched one of the supported shapes.
    Valid(EventTime),
    /// The original text, untouched.
    Unparsed(String),
}

impl ParsedDate {
    /// Returns the parsed value, if any.
    pub fn valid(self) -> Option<EventTime> {
        match self {
            Self::Valid(time) => Some(time),
            Self::Unparsed(_) => None,
        }
    }
}

/// Parses an iCalendar date or date-time value.
pub fn parse_ical_date(raw: &str) -> ParsedDate {
    let s = raw.trim();

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        return match NaiveDate::parse_from_str(s, ICAL_DATE_FORMAT) {
            Ok(date) => ParsedDate::Valid(EventTime::AllDay(date)),
            Err(_) => ParsedDate::Unparsed(raw.to_string()),
        };
    }

    let naive = s.strip_suffix('Z').unwrap_or(s);
    match NaiveDateTime::parse_from_str(naive, ICAL_FLOATING_FORMAT) {
        Ok(dt) => ParsedDate::Valid(EventTime::DateTime(Utc.from_utc_datetime(&dt))),
        Err(_) => ParsedDate::Unparsed(raw.to_string()),
    }
}

/// Formats an instant as `YYYYMMDDTHHMMSSZ`.
pub fn format_ical_datetime(dt: DateTime<Utc>) -> String {
    dt.format(ICAL_UTC_FORMAT).to_string()
}

/// Formats a date as `YYYYMMDD`.
pub fn format_ical_date(date: NaiveDate) -> String {
    date.format(ICAL_DATE_FORMAT).to_string()
}

/// Midnight UTC on the given date.
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

/// The last whole second of the given date, UTC.
pub fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    date.and_time(last_second).and_utc()
}
