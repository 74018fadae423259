//! iCalendar (RFC 5545) codec for the VEVENT subset the engine reads and writes.
//!
//! Decoding walks the unfolded content lines of a calendar object and builds
//! one [`Event`] per `VEVENT` block. Each block succeeds or fails on its own,
//! so one malformed entry never takes the rest of a batch with it.
//!
//! Encoding produces a complete `VCALENDAR` object with CRLF line endings
//! and 75-octet line folding.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, trace, warn};

use crate::error::DecodeError;
use crate::event::Event;
use crate::recurrence::RecurrenceRule;
use crate::time::{EventTime, ParsedDate, format_ical_datetime, parse_ical_date};

/// Product identifier written into every calendar object.
pub const PRODID: &str = "-//calsync//calsync-core//EN";

const MAX_LINE_OCTETS: usize = 75;

/// Decodes every VEVENT block in `ics`.
///
/// Returns one result per block, in document order. Text without any
/// VEVENT yields a single [`DecodeError::NoEvent`].
pub fn decode_calendar(ics: &str) -> Vec<Result<Event, DecodeError>> {
    let mut results = Vec::new();
    let mut current: Option<VeventFields> = None;
    // Depth of components nested inside the current VEVENT (VALARM and friends).
    let mut nested = 0usize;

    for line in unfold(ics) {
        let Some(prop) = ContentLine::parse(&line) else {
            continue;
        };

        let component = prop.value.trim().to_ascii_uppercase();
        match (prop.name.as_str(), component.as_str()) {
            ("BEGIN", "VEVENT") if current.is_none() => {
                current = Some(VeventFields::default());
                nested = 0;
            }
            ("END", "VEVENT") if nested == 0 => {
                if let Some(fields) = current.take() {
                    results.push(fields.finish());
                }
            }
            ("BEGIN", _) if current.is_some() => nested += 1,
            ("END", _) if current.is_some() => nested = nested.saturating_sub(1),
            _ => {
                if nested == 0 {
                    if let Some(fields) = current.as_mut() {
                        fields.apply(&prop);
                    }
                }
            }
        }
    }

    if results.is_empty() {
        results.push(Err(DecodeError::NoEvent));
    }
    results
}

/// Decodes the primary event of a calendar object.
///
/// When the object holds several VEVENTs (a master stored with its
/// exceptions), the one without a `RECURRENCE-ID` is preferred.
pub fn decode_event(ics: &str) -> Result<Event, DecodeError> {
    let mut first_error = None;
    let mut fallback = None;

    for result in decode_calendar(ics) {
        match result {
            Ok(event) if event.recurrence_id.is_none() => return Ok(event),
            Ok(event) => {
                fallback.get_or_insert(event);
            }
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }

    match (fallback, first_error) {
        (Some(event), _) => Ok(event),
        (None, Some(e)) => Err(e),
        (None, None) => Err(DecodeError::NoEvent),
    }
}

/// Encodes an event as a complete calendar object, stamped with the current time.
pub fn encode_event(event: &Event) -> String {
    encode_event_at(event, Utc::now())
}

/// Encodes an event as a complete calendar object with the given `DTSTAMP`.
pub fn encode_event_at(event: &Event, stamp: DateTime<Utc>) -> String {
    encode_calendar_at(std::slice::from_ref(event), stamp)
}

/// Encodes several VEVENTs into one calendar object, e.g. a master stored
/// together with its exceptions.
pub fn encode_calendar(events: &[Event]) -> String {
    encode_calendar_at(events, Utc::now())
}

pub fn encode_calendar_at(events: &[Event], stamp: DateTime<Utc>) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", PRODID),
    ];
    for event in events {
        push_vevent(&mut lines, event, stamp);
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines
        .iter()
        .map(|line| fold_line(line))
        .collect::<Vec<_>>()
        .join("\r\n");
    out.push_str("\r\n");
    out
}

fn push_vevent(lines: &mut Vec<String>, event: &Event, stamp: DateTime<Utc>) {
    lines.extend([
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", event.uid),
        format!("DTSTAMP:{}", format_ical_datetime(stamp)),
        date_property("DTSTART", event.start_time()),
        date_property("DTEND", event.as_event_time(event.effective_end())),
        format!("SUMMARY:{}", escape_text(&event.title)),
    ]);

    if let Some(ref location) = event.location {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    if let Some(ref description) = event.description {
        lines.push(format!("DESCRIPTION:{}", escape_text(description)));
    }
    if let Some(recurrence_id) = event.recurrence_id {
        lines.push(date_property(
            "RECURRENCE-ID",
            event.as_event_time(recurrence_id),
        ));
    }
    if let Some(ref rule) = event.recurrence {
        lines.push(format!("RRULE:{}", rule));
    }
    for date in &event.exdates {
        lines.push(date_property("EXDATE", exdate_time(event, *date)));
    }
    lines.push("END:VEVENT".to_string());
}

/// Timed series exclude the occurrence at the master's time of day.
fn exdate_time(event: &Event, date: NaiveDate) -> EventTime {
    if event.all_day {
        EventTime::AllDay(date)
    } else {
        EventTime::DateTime(date.and_time(event.start.time()).and_utc())
    }
}

fn date_property(name: &str, time: EventTime) -> String {
    match time {
        EventTime::AllDay(_) => format!("{};VALUE=DATE:{}", name, time.to_ical_string()),
        EventTime::DateTime(_) => format!("{}:{}", name, time.to_ical_string()),
    }
}

/// One `NAME;PARAM=VALUE:VALUE` content line.
struct ContentLine<'a> {
    name: String,
    params: Vec<(&'a str, &'a str)>,
    value: &'a str,
}

impl<'a> ContentLine<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let (head, value) = line.split_once(':')?;
        let mut segments = head.split(';');
        let name = segments.next()?.trim().to_ascii_uppercase();
        if name.is_empty() {
            return None;
        }
        let params = segments
            .filter_map(|p| p.split_once('='))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();
        Some(Self {
            name,
            params,
            value,
        })
    }

    fn is_date_only(&self) -> bool {
        self.params
            .iter()
            .any(|(k, v)| k.eq_ignore_ascii_case("VALUE") && v.eq_ignore_ascii_case("DATE"))
    }
}

/// Properties collected from one VEVENT block.
#[derive(Default)]
struct VeventFields {
    uid: Option<String>,
    title: Option<String>,
    location: Option<String>,
    description: Option<String>,
    start: Option<(ParsedDate, bool)>,
    end: Option<ParsedDate>,
    rrule: Option<String>,
    recurrence_id: Option<ParsedDate>,
    exdates: Vec<NaiveDate>,
}

impl VeventFields {
    fn apply(&mut self, prop: &ContentLine<'_>) {
        match prop.name.as_str() {
            "UID" => self.uid = Some(prop.value.trim().to_string()),
            "SUMMARY" => self.title = Some(unescape_text(prop.value)),
            "LOCATION" => self.location = Some(unescape_text(prop.value)),
            "DESCRIPTION" => self.description = Some(unescape_text(prop.value)),
            "DTSTART" => self.start = Some((parse_ical_date(prop.value), prop.is_date_only())),
            "DTEND" => self.end = Some(parse_ical_date(prop.value)),
            "RRULE" => self.rrule = Some(prop.value.trim().to_string()),
            "RECURRENCE-ID" => self.recurrence_id = Some(parse_ical_date(prop.value)),
            "EXDATE" => {
                for raw in prop.value.split(',') {
                    match parse_ical_date(raw) {
                        ParsedDate::Valid(time) => self.exdates.push(time.date()),
                        ParsedDate::Unparsed(raw) => {
                            warn!(value = %raw, "Ignoring unreadable EXDATE value");
                        }
                    }
                }
            }
            other => trace!(property = %other, "Ignoring unsupported VEVENT property"),
        }
    }

    fn finish(self) -> Result<Event, DecodeError> {
        let uid = self
            .uid
            .filter(|u| !u.is_empty())
            .ok_or(DecodeError::MissingUid)?;

        let title = self
            .title
            .ok_or_else(|| DecodeError::MissingTitle { uid: uid.clone() })?;

        let (start, all_day) = match self.start {
            Some((ParsedDate::Valid(time), date_param)) => {
                (time.to_utc_datetime(), date_param || time.is_all_day())
            }
            Some((ParsedDate::Unparsed(raw), _)) => {
                return Err(DecodeError::InvalidDate {
                    uid,
                    property: "DTSTART",
                    raw,
                });
            }
            None => return Err(DecodeError::MissingStart { uid }),
        };

        let end = match self.end {
            Some(ParsedDate::Valid(time)) => Some(time.to_utc_datetime()),
            Some(ParsedDate::Unparsed(raw)) => {
                warn!(uid = %uid, value = %raw, "Ignoring unreadable DTEND value");
                None
            }
            None => None,
        };

        let recurrence_id = match self.recurrence_id {
            Some(ParsedDate::Valid(time)) => Some(time.to_utc_datetime()),
            Some(ParsedDate::Unparsed(raw)) => {
                return Err(DecodeError::InvalidDate {
                    uid,
                    property: "RECURRENCE-ID",
                    raw,
                });
            }
            None => None,
        };

        let recurrence = match self.rrule {
            Some(_) if recurrence_id.is_some() => {
                debug!(uid = %uid, "Exception carries an RRULE, ignoring it");
                None
            }
            Some(raw) => match raw.parse::<RecurrenceRule>() {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(uid = %uid, rrule = %raw, error = %e, "Treating event as non-recurring");
                    None
                }
            },
            None => None,
        };

        let mut event = Event::new(uid, title, start).with_all_day(all_day);
        event.location = self.location;
        event.description = self.description;
        event.end = end;
        event.recurrence = recurrence;
        event.recurrence_id = recurrence_id;
        event.exdates = self.exdates.into_iter().collect();

        trace!(uid = %event.uid, kind = ?event.kind(), "Decoded VEVENT");
        Ok(event)
    }
}

/// Joins folded continuation lines (CRLF or LF followed by a space or tab).
fn unfold(ics: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in ics.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        match raw.strip_prefix([' ', '\t']) {
            Some(rest) if !lines.is_empty() => {
                if let Some(last) = lines.last_mut() {
                    last.push_str(rest);
                }
            }
            _ => lines.push(raw.to_string()),
        }
    }
    lines
}

/// Splits a content line into 75-octet chunks joined by CRLF + space.
fn fold_line(line: &str) -> String {
    if line.len() <= MAX_LINE_OCTETS {
        return line.to_string();
    }

    let mut out = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    // Continuation lines start with a space, leaving 74 octets of content.
    let mut limit = MAX_LINE_OCTETS;
    for c in line.chars() {
        let len = c.len_utf8();
        if width + len > limit {
            out.push_str("\r\n ");
            width = 0;
            limit = MAX_LINE_OCTETS - 1;
        }
        out.push(c);
        width += len;
    }
    out
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            _ => out.push(c),
        }
    }
    out
}

fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::recurrence::{Frequency, WeekdayNum};
    use crate::time::start_of_day;
    use chrono::{TimeZone, Weekday};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_ics() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:test-event-1@example.com\r\n\
         DTSTAMP:20250101T000000Z\r\n\
         DTSTART:20250205T100000Z\r\n\
         DTEND:20250205T110000Z\r\n\
         SUMMARY:Team Meeting\r\n\
         DESCRIPTION:Weekly sync.\\nBring notes\\, please\r\n\
         LOCATION:Conference Room A\r\n\
         STATUS:CONFIRMED\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    #[test]
    fn decode_basic_event() {
        let event = decode_event(sample_ics()).unwrap();

        assert_eq!(event.uid, "test-event-1@example.com");
        assert_eq!(event.title, "Team Meeting");
        assert_eq!(event.start, utc(2025, 2, 5, 10, 0));
        assert_eq!(event.end, Some(utc(2025, 2, 5, 11, 0)));
        assert_eq!(event.location.as_deref(), Some("Conference Room A"));
        assert_eq!(
            event.description.as_deref(),
            Some("Weekly sync.\nBring notes, please")
        );
        assert!(!event.all_day);
        assert_eq!(event.kind(), EventKind::Plain);
    }

    #[test]
    fn decode_all_day_from_value_param_and_bare_date() {
        let ics = "BEGIN:VEVENT\nUID:a\nSUMMARY:Holiday\nDTSTART;VALUE=DATE:20250210\nDTEND;VALUE=DATE:20250211\nEND:VEVENT";
        let event = decode_event(ics).unwrap();
        assert!(event.all_day);
        assert_eq!(event.start, utc(2025, 2, 10, 0, 0));
        assert_eq!(event.end, Some(utc(2025, 2, 11, 0, 0)));

        let ics = "BEGIN:VEVENT\nUID:b\nSUMMARY:Holiday\nDTSTART:20250210\nEND:VEVENT";
        assert!(decode_event(ics).unwrap().all_day);
    }

    #[test]
    fn decode_master_with_accumulated_exdates() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:series\r\n\
                   SUMMARY:Standup\r\n\
                   DTSTART:20240101T090000Z\r\n\
                   RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
                   EXDATE:20240108T090000Z\r\n\
                   EXDATE:20240115T090000Z,20240122T090000Z\r\n\
                   EXDATE:garbage\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";
        let event = decode_event(ics).unwrap();

        assert_eq!(event.kind(), EventKind::Master);
        assert_eq!(
            event.recurrence,
            Some(
                RecurrenceRule::new(Frequency::Weekly).with_by_day(WeekdayNum::every(Weekday::Mon))
            )
        );
        assert_eq!(
            event.exdates.iter().copied().collect::<Vec<_>>(),
            vec![date(2024, 1, 8), date(2024, 1, 15), date(2024, 1, 22)]
        );
    }

    #[test]
    fn bad_rrule_degrades_to_plain_event() {
        let ics = "BEGIN:VEVENT\nUID:x\nSUMMARY:Odd\nDTSTART:20240101T090000Z\nRRULE:FREQ=SOMETIMES\nEND:VEVENT";
        let event = decode_event(ics).unwrap();
        assert!(event.recurrence.is_none());
        assert_eq!(event.kind(), EventKind::Plain);
    }

    #[test]
    fn exception_drops_rrule() {
        let ics = "BEGIN:VEVENT\nUID:x-exception\nSUMMARY:Moved\nDTSTART:20240108T100000Z\nRECURRENCE-ID:20240108T090000Z\nRRULE:FREQ=DAILY\nEND:VEVENT";
        let event = decode_event(ics).unwrap();
        assert_eq!(event.kind(), EventKind::Exception);
        assert_eq!(event.recurrence_id, Some(utc(2024, 1, 8, 9, 0)));
        assert!(event.recurrence.is_none());
    }

    #[test]
    fn decode_errors_are_per_block() {
        let ics = "BEGIN:VCALENDAR\n\
                   BEGIN:VEVENT\nUID:no-title\nDTSTART:20240101T090000Z\nEND:VEVENT\n\
                   BEGIN:VEVENT\nUID:ok\nSUMMARY:Fine\nDTSTART:20240101T090000Z\nEND:VEVENT\n\
                   BEGIN:VEVENT\nUID:bad-start\nSUMMARY:Bad\nDTSTART:tomorrow\nEND:VEVENT\n\
                   BEGIN:VEVENT\nSUMMARY:No uid\nDTSTART:20240101T090000Z\nEND:VEVENT\n\
                   END:VCALENDAR";
        let results = decode_calendar(ics);

        assert_eq!(results.len(), 4);
        assert_eq!(
            results[0],
            Err(DecodeError::MissingTitle {
                uid: "no-title".to_string()
            })
        );
        assert_eq!(results[1].as_ref().unwrap().uid, "ok");
        assert!(matches!(
            results[2],
            Err(DecodeError::InvalidDate {
                property: "DTSTART",
                ..
            })
        ));
        assert_eq!(results[3], Err(DecodeError::MissingUid));
    }

    #[test]
    fn no_vevent_is_an_error() {
        assert_eq!(
            decode_event("BEGIN:VCALENDAR\nVERSION:2.0\nEND:VCALENDAR"),
            Err(DecodeError::NoEvent)
        );
    }

    #[test]
    fn nested_alarm_properties_are_ignored() {
        let ics = "BEGIN:VEVENT\nUID:a\nSUMMARY:Dentist\nDTSTART:20240301T140000Z\n\
                   BEGIN:VALARM\nACTION:DISPLAY\nDESCRIPTION:Reminder\nEND:VALARM\n\
                   END:VEVENT";
        let event = decode_event(ics).unwrap();
        assert_eq!(event.title, "Dentist");
        assert!(event.description.is_none());
    }

    #[test]
    fn decode_prefers_master_over_exceptions() {
        let ics = "BEGIN:VCALENDAR\n\
                   BEGIN:VEVENT\nUID:s\nSUMMARY:Moved\nDTSTART:20240108T100000Z\nRECURRENCE-ID:20240108T090000Z\nEND:VEVENT\n\
                   BEGIN:VEVENT\nUID:s\nSUMMARY:Series\nDTSTART:20240101T090000Z\nRRULE:FREQ=WEEKLY\nEND:VEVENT\n\
                   END:VCALENDAR";
        let event = decode_event(ics).unwrap();
        assert_eq!(event.title, "Series");
    }

    #[test]
    fn folded_lines_are_joined() {
        let ics = "BEGIN:VEVENT\r\nUID:a\r\nSUMMARY:A very long\r\n  title\r\nDTSTART:20240101T090000Z\r\nEND:VEVENT\r\n";
        assert_eq!(decode_event(ics).unwrap().title, "A very long title");
    }

    #[test]
    fn encode_timed_master() {
        let event = Event::new("series@example.com", "Standup", utc(2024, 1, 1, 9, 0))
            .with_end(utc(2024, 1, 1, 9, 15))
            .with_location("Room 1, 2nd floor")
            .with_recurrence(
                RecurrenceRule::new(Frequency::Weekly)
                    .with_by_day(WeekdayNum::every(Weekday::Mon))
                    .with_count(3),
            )
            .with_exdate(date(2024, 1, 8));

        let ics = encode_event_at(&event, utc(2024, 1, 1, 0, 0));
        insta::assert_snapshot!(ics.replace("\r\n", "\n"), @r"
        BEGIN:VCALENDAR
        VERSION:2.0
        PRODID:-//calsync//calsync-core//EN
        BEGIN:VEVENT
        UID:series@example.com
        DTSTAMP:20240101T000000Z
        DTSTART:20240101T090000Z
        DTEND:20240101T091500Z
        SUMMARY:Standup
        LOCATION:Room 1\, 2nd floor
        RRULE:FREQ=WEEKLY;BYDAY=MO;COUNT=3
        EXDATE:20240108T090000Z
        END:VEVENT
        END:VCALENDAR
        ");
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn encode_all_day_uses_value_date() {
        let event = Event::new("h", "Holiday", utc(2024, 12, 25, 0, 0))
            .with_all_day(true)
            .with_recurrence(RecurrenceRule::new(Frequency::Yearly))
            .with_exdate(date(2025, 12, 25));
        let ics = encode_event_at(&event, utc(2024, 1, 1, 0, 0));

        assert!(ics.contains("DTSTART;VALUE=DATE:20241225\r\n"));
        assert!(ics.contains("DTEND;VALUE=DATE:20241226\r\n"));
        assert!(ics.contains("EXDATE;VALUE=DATE:20251225\r\n"));
    }

    #[test]
    fn encode_exception_writes_recurrence_id() {
        let event = Event::new("s-exception", "Moved", utc(2024, 1, 8, 10, 0))
            .with_recurrence_id(utc(2024, 1, 8, 9, 0));
        let ics = encode_event_at(&event, utc(2024, 1, 1, 0, 0));
        assert!(ics.contains("RECURRENCE-ID:20240108T090000Z\r\n"));
        assert!(!ics.contains("RRULE"));
    }

    #[test]
    fn all_day_round_trip_keeps_date_form() {
        let event = Event::new("h", "Offsite", start_of_day(date(2024, 6, 3))).with_all_day(true);
        let decoded = decode_event(&encode_event(&event)).unwrap();

        assert!(decoded.all_day);
        assert_eq!(decoded.start, utc(2024, 6, 3, 0, 0));
        assert_eq!(decoded.start_time(), EventTime::AllDay(date(2024, 6, 3)));
    }

    #[test]
    fn text_round_trip_survives_escaping_and_folding() {
        let description = "Agenda; review, plan\\decide\nSecond line ".repeat(5);
        let event = Event::new("t", "Planning", utc(2024, 1, 1, 9, 0))
            .with_description(description.clone());
        let ics = encode_event(&event);

        assert!(ics.split("\r\n").all(|line| line.len() <= MAX_LINE_OCTETS));
        let decoded = decode_event(&ics).unwrap();
        assert_eq!(decoded.description.as_deref(), Some(description.as_str()));
    }

    #[test]
    fn fold_respects_utf8_boundaries() {
        let line = format!("SUMMARY:{}", "é".repeat(60));
        let folded = fold_line(&line);
        for segment in folded.split("\r\n") {
            assert!(segment.len() <= MAX_LINE_OCTETS);
        }
        assert_eq!(folded.replace("\r\n ", ""), line);
    }

    #[test]
    fn component_names_are_case_insensitive() {
        let ics = "begin:vcalendar\nBegin:VEvent\nUID:x\nSUMMARY:Lower\n\
                   DTSTART:20240101T090000Z\nend:vevent\nend:vcalendar";
        let event = decode_event(ics).unwrap();
        assert_eq!(event.title, "Lower");
    }

    #[test]
    fn master_and_exception_share_one_object() {
        let master = Event::new("s", "Standup", utc(2024, 1, 1, 9, 0))
            .with_end(utc(2024, 1, 1, 9, 15))
            .with_recurrence(RecurrenceRule::new(Frequency::Weekly))
            .with_exdate(date(2024, 1, 15));
        let moved = Event::new("s", "Moved", utc(2024, 1, 8, 11, 0))
            .with_end(utc(2024, 1, 8, 11, 15))
            .with_recurrence_id(utc(2024, 1, 8, 9, 0));

        let ics = encode_calendar_at(&[master.clone(), moved.clone()], utc(2024, 1, 1, 0, 0));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert_eq!(ics.matches("BEGIN:VCALENDAR").count(), 1);

        let decoded: Vec<_> = decode_calendar(&ics).into_iter().map(Result::unwrap).collect();
        assert_eq!(decoded, vec![master.clone(), moved]);
        assert_eq!(decode_event(&ics).unwrap(), master);
    }
}
