//! Parsing of date and time arguments.
//!
//! Accepted forms, all read as UTC unless an offset is given:
//!
//! - `2024-03-01T09:30:00+01:00` (RFC 3339)
//! - `2024-03-01T09:30`, `2024-03-01 09:30`, with optional seconds
//! - `20240301T093000Z` (iCalendar)
//! - `2024-03-01` or `20240301` (midnight)

use calsync_core::time::start_of_day;
use calsync_core::parse_ical_date;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub fn parse_datetime(arg: &str) -> Result<DateTime<Utc>, String> {
    let arg = arg.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(arg) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(arg, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(arg, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }
    parse_ical_date(arg)
        .valid()
        .map(|time| time.to_utc_datetime())
        .ok_or_else(|| format!("unrecognized date or time {:?}", arg))
}

pub fn parse_date(arg: &str) -> Result<NaiveDate, String> {
    let arg = arg.trim();
    NaiveDate::parse_from_str(arg, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(arg, "%Y%m%d"))
        .map_err(|_| format!("unrecognized date {:?}, expected YYYY-MM-DD", arg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn datetime_forms() {
        let expected = utc(2024, 3, 1, 9, 30);
        assert_eq!(parse_datetime("2024-03-01T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01T10:30:00+01:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01T09:30").unwrap(), expected);
        assert_eq!(parse_datetime("2024-03-01 09:30:00").unwrap(), expected);
        assert_eq!(parse_datetime(" 2024-03-01 09:30 ").unwrap(), expected);
        assert_eq!(parse_datetime("20240301T093000Z").unwrap(), expected);
    }

    #[test]
    fn bare_dates_are_midnight() {
        assert_eq!(parse_datetime("2024-03-01").unwrap(), utc(2024, 3, 1, 0, 0));
        assert_eq!(parse_datetime("20240301").unwrap(), utc(2024, 3, 1, 0, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("next tuesday").is_err());
        assert!(parse_datetime("2024-13-01").is_err());
        assert!(parse_date("01/03/2024").is_err());
    }

    #[test]
    fn date_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(parse_date("2024-02-29").unwrap(), expected);
        assert_eq!(parse_date("20240229").unwrap(), expected);
    }
}
