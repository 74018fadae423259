//! Rendering of command results as text or JSON.

use std::collections::HashSet;

use calsync_caldav::{CalendarInfo, exception_uid};
use calsync_core::Event;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CliResult;

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Drops generated occurrences that an exception in the same listing
/// overrides, then sorts by start.
///
/// An exception overrides an occurrence when its `RECURRENCE-ID` equals the
/// occurrence start and it either shares the master's UID or is stored under
/// the UID given to edited occurrences.
pub fn arrange_events(events: Vec<Event>) -> Vec<Event> {
    let overrides: HashSet<(String, DateTime<Utc>)> = events
        .iter()
        .filter_map(|e| e.recurrence_id.map(|rid| (e.uid.clone(), rid)))
        .collect();

    let mut events: Vec<Event> = events
        .into_iter()
        .filter(|event| match &event.occurrence {
            Some(occurrence) => {
                let start = event.start;
                !overrides.contains(&(occurrence.master_uid.clone(), start))
                    && !overrides.contains(&(exception_uid(&occurrence.master_uid, start), start))
            }
            None => true,
        })
        .collect();

    events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.title.cmp(&b.title)));
    events
}

pub fn render_calendars(calendars: &[CalendarInfo], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(calendars),
        OutputFormat::Text if calendars.is_empty() => Ok("No calendars found".to_string()),
        OutputFormat::Text => Ok(calendars
            .iter()
            .map(|c| {
                if c.name == c.id {
                    c.id.clone()
                } else {
                    format!("{}  {}", c.id, c.name)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

pub fn render_events(events: &[Event], format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(events),
        OutputFormat::Text if events.is_empty() => Ok("No events".to_string()),
        OutputFormat::Text => Ok(events.iter().map(event_line).collect::<Vec<_>>().join("\n")),
    }
}

/// Renders a single identifier, e.g. the UID of a created event.
pub fn render_uid(uid: &str, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "uid": uid })),
        OutputFormat::Text => Ok(uid.to_string()),
    }
}

pub fn render_event(event: &Event, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_json(event),
        OutputFormat::Text => Ok(event_line(event)),
    }
}

fn event_line(event: &Event) -> String {
    let when = if event.all_day {
        let last_day = event.effective_end().date_naive().pred_opt();
        match last_day {
            Some(last) if last > event.start.date_naive() => {
                format!("{} - {}", event.start.format("%Y-%m-%d"), last.format("%Y-%m-%d"))
            }
            _ => format!("{} all-day", event.start.format("%Y-%m-%d")),
        }
    } else {
        format!(
            "{}-{}",
            event.start.format("%Y-%m-%d %H:%M"),
            event.effective_end().format("%H:%M")
        )
    };

    let mut line = format!("{}  {}", when, event.title);
    if let Some(location) = &event.location {
        line.push_str(&format!(" @ {}", location));
    }
    let marker = if event.recurrence_id.is_some() {
        " (moved)"
    } else if event.is_recurring_instance() {
        " (recurring)"
    } else {
        ""
    };
    line.push_str(marker);
    line.push_str(&format!("  [{}]", event.id()));
    line
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calsync_core::{Frequency, RecurrenceRule, expand};
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn standup() -> Event {
        Event::new("standup", "Standup", utc(2024, 1, 1, 10, 0))
            .with_end(utc(2024, 1, 1, 10, 15))
            .with_recurrence(RecurrenceRule::new(Frequency::Weekly).with_count(3))
    }

    #[test]
    fn exceptions_hide_the_occurrence_they_override() {
        let moved = Event::new(
            exception_uid("standup", utc(2024, 1, 8, 10, 0)),
            "Standup (moved)",
            utc(2024, 1, 8, 14, 0),
        )
        .with_recurrence_id(utc(2024, 1, 8, 10, 0));

        let expanded = expand(
            vec![standup(), moved],
            utc(2024, 1, 1, 0, 0),
            utc(2024, 1, 31, 0, 0),
        );
        assert_eq!(expanded.len(), 4);

        let arranged = arrange_events(expanded);
        let titles: Vec<_> = arranged
            .iter()
            .map(|e| (e.start.format("%m-%d %H:%M").to_string(), e.title.as_str()))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("01-01 10:00".to_string(), "Standup"),
                ("01-08 14:00".to_string(), "Standup (moved)"),
                ("01-15 10:00".to_string(), "Standup"),
            ]
        );
    }

    #[test]
    fn unrelated_exception_hides_nothing() {
        let other = Event::new("other", "Other", utc(2024, 1, 8, 10, 0))
            .with_recurrence_id(utc(2024, 1, 8, 10, 0));
        let expanded = expand(
            vec![standup(), other],
            utc(2024, 1, 1, 0, 0),
            utc(2024, 1, 31, 0, 0),
        );
        assert_eq!(arrange_events(expanded).len(), 4);
    }

    #[test]
    fn text_listing() {
        let events = arrange_events(expand(
            vec![
                standup(),
                Event::new("offsite", "Offsite", utc(2024, 1, 9, 0, 0))
                    .with_end(utc(2024, 1, 11, 0, 0))
                    .with_all_day(true)
                    .with_location("Berlin"),
                Event::new("holiday", "Holiday", utc(2024, 1, 2, 0, 0)).with_all_day(true),
            ],
            utc(2024, 1, 1, 0, 0),
            utc(2024, 1, 10, 0, 0),
        ));

        insta::assert_snapshot!(render_events(&events, OutputFormat::Text).unwrap(), @r"
        2024-01-01 10:00-10:15  Standup (recurring)  [standup_2024-01-01T10:00:00]
        2024-01-02 all-day  Holiday  [holiday]
        2024-01-08 10:00-10:15  Standup (recurring)  [standup_2024-01-08T10:00:00]
        2024-01-09 - 2024-01-10  Offsite @ Berlin  [offsite]
        ");
    }

    #[test]
    fn json_listing() {
        let event = Event::new("a", "Lunch", utc(2024, 1, 1, 12, 0)).with_end(utc(2024, 1, 1, 13, 0));
        insta::assert_snapshot!(render_events(&[event], OutputFormat::Json).unwrap(), @r#"
        [
          {
            "uid": "a",
            "title": "Lunch",
            "start": "2024-01-01T12:00:00Z",
            "end": "2024-01-01T13:00:00Z",
            "all_day": false
          }
        ]
        "#);
    }

    #[test]
    fn empty_results() {
        assert_eq!(render_events(&[], OutputFormat::Text).unwrap(), "No events");
        assert_eq!(render_calendars(&[], OutputFormat::Text).unwrap(), "No calendars found");
        assert_eq!(render_uid("x", OutputFormat::Json).unwrap(), "{\n  \"uid\": \"x\"\n}");
    }

    #[test]
    fn calendar_names() {
        let calendars = vec![
            CalendarInfo::new("work", "Work", "/alice/work/"),
            CalendarInfo::new("home", "home", "/alice/home/"),
        ];
        assert_eq!(
            render_calendars(&calendars, OutputFormat::Text).unwrap(),
            "work  Work\nhome"
        );
    }
}
