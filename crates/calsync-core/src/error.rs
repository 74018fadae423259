//! Error types for decoding and expanding calendar data.
//!
//! None of these are fatal to a batch: a [`DecodeError`] drops one VEVENT,
//! a [`RuleError`] degrades one event to non-recurring, and an
//! [`ExpandError`] leaves one master unexpanded.

use thiserror::Error;

/// Why a single VEVENT block could not be turned into an [`Event`](crate::Event).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The text contained no `BEGIN:VEVENT` block.
    #[error("no VEVENT component found")]
    NoEvent,

    /// The block has no `UID` property.
    #[error("VEVENT has no UID")]
    MissingUid,

    /// The block has no `SUMMARY` property.
    #[error("VEVENT {uid} has no SUMMARY")]
    MissingTitle { uid: String },

    /// The block has no `DTSTART` property.
    #[error("VEVENT {uid} has no DTSTART")]
    MissingStart { uid: String },

    /// A required date property could not be read.
    #[error("VEVENT {uid} has an unreadable {property} value: {raw:?}")]
    InvalidDate {
        uid: String,
        property: &'static str,
        raw: String,
    },
}

/// Why an `RRULE` value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// The rule has no `FREQ` part.
    #[error("RRULE has no FREQ")]
    MissingFrequency,

    /// `FREQ` is not one of DAILY, WEEKLY, MONTHLY, YEARLY.
    #[error("unsupported FREQ value {0:?}")]
    UnsupportedFrequency(String),

    /// A part is not of the form `KEY=VALUE`.
    #[error("malformed RRULE part {0:?}")]
    MalformedPart(String),

    /// A part has a value that does not fit its type or range.
    #[error("invalid {key} value {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

impl RuleError {
    pub(crate) fn invalid(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
        }
    }
}

/// Why a master event could not be expanded into occurrences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// The recurrence engine rejected the rule.
    #[error("recurrence rule for {uid} rejected: {message}")]
    Rule { uid: String, message: String },

    /// Date arithmetic left the representable range.
    #[error("date arithmetic overflow while expanding {uid}")]
    Overflow { uid: String },
}
