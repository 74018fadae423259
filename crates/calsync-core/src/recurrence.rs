//! RRULE parsing and building.
//!
//! [`RecurrenceRule`] is the structured form of an RFC 5545 `RRULE` value.
//! `FromStr` parses a rule string (with or without the `RRULE:` prefix) and
//! `Display` builds the canonical string back:
//!
//! ```
//! use calsync_core::RecurrenceRule;
//!
//! let rule: RecurrenceRule = "RRULE:FREQ=MONTHLY;BYDAY=-1FR;COUNT=3".parse().unwrap();
//! assert_eq!(rule.to_string(), "FREQ=MONTHLY;BYDAY=-1FR;COUNT=3");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::time::{EventTime, ParsedDate, parse_ical_date};

static WEEKDAY_NUM_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?\d+)?([A-Z]{2})$").expect("Invalid BYDAY regex"));

/// How often a rule repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the RRULE keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl FromStr for Frequency {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            "YEARLY" => Ok(Self::Yearly),
            other => Err(RuleError::UnsupportedFrequency(other.to_string())),
        }
    }
}

/// A `BYDAY` entry: a weekday with an optional signed ordinal.
///
/// `(Some(1), Mon)` is "first Monday", `(Some(-1), Fri)` is "last Friday",
/// `(None, Wed)` is "every Wednesday".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdayNum {
    pub ordinal: Option<i16>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// Every occurrence of the weekday in the period.
    pub fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// The nth occurrence of the weekday in the period (negative counts from the end).
    pub fn nth(ordinal: i16, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }

    /// Parses a token like `1MO`, `-1FR` or `WE`.
    ///
    /// Returns `None` for unrecognized weekday codes and zero ordinals.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = WEEKDAY_NUM_REGEX.captures(token.trim())?;
        let weekday = weekday_from_code(caps.get(2)?.as_str())?;
        let ordinal = match caps.get(1) {
            Some(m) => match m.as_str().parse::<i16>() {
                Ok(0) | Err(_) => return None,
                Ok(n) => Some(n),
            },
            None => None,
        };
        Some(Self { ordinal, weekday })
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{}", n)?;
        }
        f.write_str(weekday_code(self.weekday))
    }
}

fn weekday_from_code(code: &str) -> Option<Weekday> {
    match code {
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        "SU" => Some(Weekday::Sun),
        _ => None,
    }
}

fn weekday_code(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// What ends a recurrence. A rule carries at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceBound {
    /// Stop after this many occurrences.
    Count(u32),
    /// Stop after this instant or date (inclusive).
    Until(EventTime),
}

/// A parsed `RRULE`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecurrenceRule {
    pub freq: Frequency,
    /// Always at least 1.
    pub interval: u32,
    pub by_day: Vec<WeekdayNum>,
    pub by_month_day: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_set_pos: Option<i32>,
    /// `None` means the rule never ends.
    pub bound: Option<RecurrenceBound>,
}

impl RecurrenceRule {
    /// Creates an unbounded rule repeating every period.
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: 1,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
            by_set_pos: None,
            bound: None,
        }
    }

    /// Builder: repeat every `interval` periods (clamped to at least 1).
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Builder: add a `BYDAY` entry.
    pub fn with_by_day(mut self, day: WeekdayNum) -> Self {
        self.by_day.push(day);
        self
    }

    /// Builder: add a `BYMONTHDAY` entry.
    pub fn with_by_month_day(mut self, day: i8) -> Self {
        self.by_month_day.push(day);
        self
    }

    /// Builder: add a `BYMONTH` entry.
    pub fn with_by_month(mut self, month: u8) -> Self {
        self.by_month.push(month);
        self
    }

    /// Builder: set `BYSETPOS`.
    pub fn with_by_set_pos(mut self, pos: i32) -> Self {
        self.by_set_pos = Some(pos);
        self
    }

    /// Builder: stop after `count` occurrences.
    pub fn with_count(mut self, count: u32) -> Self {
        self.bound = Some(RecurrenceBound::Count(count));
        self
    }

    /// Builder: stop at `until` (inclusive).
    pub fn with_until(mut self, until: EventTime) -> Self {
        self.bound = Some(RecurrenceBound::Until(until));
        self
    }

    /// Returns the `COUNT` bound, if any.
    pub fn count(&self) -> Option<u32> {
        match self.bound {
            Some(RecurrenceBound::Count(n)) => Some(n),
            _ => None,
        }
    }

    /// Returns the `UNTIL` bound, if any.
    pub fn until(&self) -> Option<EventTime> {
        match self.bound {
            Some(RecurrenceBound::Until(t)) => Some(t),
            _ => None,
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.trim();
        let body = body.strip_prefix("RRULE:").unwrap_or(body);

        let mut parts = HashMap::new();
        for part in body.split(';').filter(|p| !p.trim().is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| RuleError::MalformedPart(part.to_string()))?;
            parts.insert(key.trim().to_ascii_uppercase(), value.trim().to_string());
        }

        let freq = parts
            .get("FREQ")
            .ok_or(RuleError::MissingFrequency)?
            .to_ascii_uppercase()
            .parse::<Frequency>()?;

        let mut rule = Self::new(freq);

        if let Some(value) = parts.get("INTERVAL") {
            rule.interval = match value.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(RuleError::invalid("INTERVAL", value.as_str())),
            };
        }

        if let Some(value) = parts.get("BYDAY") {
            rule.by_day = value
                .split(',')
                .filter_map(|token| WeekdayNum::parse(&token.to_ascii_uppercase()))
                .collect();
        }

        if let Some(value) = parts.get("BYMONTHDAY") {
            rule.by_month_day = parse_list("BYMONTHDAY", value, |n: &i8| {
                *n != 0 && (-31..=31).contains(n)
            })?;
        }

        if let Some(value) = parts.get("BYMONTH") {
            rule.by_month = parse_list("BYMONTH", value, |n: &u8| (1..=12).contains(n))?;
        }

        if let Some(value) = parts.get("BYSETPOS") {
            rule.by_set_pos = Some(
                value
                    .parse::<i32>()
                    .map_err(|_| RuleError::invalid("BYSETPOS", value.as_str()))?,
            );
        }

        // COUNT wins when a malformed rule carries both bounds.
        if let Some(value) = parts.get("COUNT") {
            let count = value
                .parse::<u32>()
                .map_err(|_| RuleError::invalid("COUNT", value.as_str()))?;
            rule.bound = Some(RecurrenceBound::Count(count));
        } else if let Some(value) = parts.get("UNTIL") {
            match parse_ical_date(value) {
                ParsedDate::Valid(until) => rule.bound = Some(RecurrenceBound::Until(until)),
                ParsedDate::Unparsed(raw) => return Err(RuleError::invalid("UNTIL", raw)),
            }
        }

        Ok(rule)
    }
}

fn parse_list<T: FromStr>(
    key: &'static str,
    value: &str,
    valid: impl Fn(&T) -> bool,
) -> Result<Vec<T>, RuleError> {
    value
        .split(',')
        .map(|item| match item.trim().parse::<T>() {
            Ok(n) if valid(&n) => Ok(n),
            _ => Err(RuleError::invalid(key, item)),
        })
        .collect()
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.freq.as_str())?;

        if self.interval > 1 {
            write!(f, ";INTERVAL={}", self.interval)?;
        }
        if !self.by_day.is_empty() {
            write!(f, ";BYDAY={}", join(&self.by_day))?;
        }
        if !self.by_month_day.is_empty() {
            write!(f, ";BYMONTHDAY={}", join(&self.by_month_day))?;
        }
        if !self.by_month.is_empty() {
            write!(f, ";BYMONTH={}", join(&self.by_month))?;
        }
        if let Some(pos) = self.by_set_pos {
            write!(f, ";BYSETPOS={}", pos)?;
        }

        match self.bound {
            Some(RecurrenceBound::Count(n)) => write!(f, ";COUNT={}", n),
            Some(RecurrenceBound::Until(until)) => write!(f, ";UNTIL={}", until.to_ical_string()),
            None => Ok(()),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl From<RecurrenceRule> for String {
    fn from(rule: RecurrenceRule) -> Self {
        rule.to_string()
    }
}

impl TryFrom<String> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
