//! Core types: events, the iCalendar and RRULE codecs, recurrence expansion

pub mod error;
pub mod event;
pub mod expand;
pub mod ics;
pub mod recurrence;
pub mod time;
pub mod tracing;

pub use error::{DecodeError, ExpandError, RuleError};
pub use event::{Event, EventKind, OccurrenceInfo, default_duration};
pub use expand::{expand, expand_event, occurrence_id};
pub use ics::{
    decode_calendar, decode_event, encode_calendar, encode_calendar_at, encode_event,
    encode_event_at,
};
pub use recurrence::{Frequency, RecurrenceBound, RecurrenceRule, WeekdayNum};
pub use time::{EventTime, ParsedDate, parse_ical_date};
pub use self::tracing::{LogFormat, TracingConfig, TracingError, init_tracing};
