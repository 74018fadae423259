//! Command-line interface definition.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use crate::dates::{parse_date, parse_datetime};

/// calsync - read and edit CalDAV calendars
#[derive(Debug, Parser)]
#[command(name = "calsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, global = true, env = "CALSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Print results and logs as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter directives, e.g. `calsync_caldav=trace` (overrides RUST_LOG)
    #[arg(long, global = true, env = "CALSYNC_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the calendars of the configured principal
    Calendars,

    /// List events in a time range, with recurring series expanded
    Events {
        #[arg(long)]
        calendar: Option<String>,

        /// Start of the range (default: today)
        #[arg(long, value_parser = parse_datetime)]
        from: Option<DateTime<Utc>>,

        /// End of the range, inclusive (default: start plus the configured window)
        #[arg(long, value_parser = parse_datetime)]
        to: Option<DateTime<Utc>>,
    },

    /// Create an event and print its UID
    Create {
        #[arg(long)]
        calendar: Option<String>,

        #[arg(long)]
        title: String,

        #[arg(long, value_parser = parse_datetime)]
        start: DateTime<Utc>,

        #[arg(long, value_parser = parse_datetime)]
        end: Option<DateTime<Utc>>,

        #[arg(long)]
        all_day: bool,

        #[command(flatten)]
        details: Details,

        /// Recurrence rule, e.g. `FREQ=WEEKLY;BYDAY=MO;COUNT=10`
        #[arg(long)]
        rrule: Option<String>,
    },

    /// Change fields of an event or a whole series
    Update {
        uid: String,

        #[arg(long)]
        calendar: Option<String>,

        #[command(flatten)]
        fields: FieldChanges,

        /// New recurrence rule; an empty value makes the event non-recurring
        #[arg(long)]
        rrule: Option<String>,
    },

    /// Change a single occurrence of a recurring event
    EditOccurrence {
        /// UID of the recurring event
        uid: String,

        #[arg(long)]
        calendar: Option<String>,

        /// Original start of the occurrence
        #[arg(long, value_parser = parse_datetime)]
        occurrence: DateTime<Utc>,

        #[command(flatten)]
        fields: FieldChanges,
    },

    /// Remove a single occurrence from a recurring event
    SkipOccurrence {
        /// UID of the recurring event
        uid: String,

        #[arg(long)]
        calendar: Option<String>,

        /// Date of the occurrence (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
    },

    /// Delete an event, including all occurrences of a series
    Delete {
        uid: String,

        #[arg(long)]
        calendar: Option<String>,
    },
}

/// Free-text event fields.
#[derive(Debug, Clone, Default, Args)]
pub struct Details {
    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub description: Option<String>,
}

/// Optional field overrides shared by `update` and `edit-occurrence`.
#[derive(Debug, Clone, Default, Args)]
pub struct FieldChanges {
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, value_parser = parse_datetime)]
    pub start: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_datetime)]
    pub end: Option<DateTime<Utc>>,

    /// Switch between all-day and timed
    #[arg(long)]
    pub all_day: Option<bool>,

    #[command(flatten)]
    pub details: Details,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["calsync", "calendars", "--json", "-v"]).unwrap();
        assert!(cli.json);
        assert!(cli.debug);
        assert!(matches!(cli.command, Command::Calendars));
        assert!(cli.log_filter.is_none());

        let cli =
            Cli::try_parse_from(["calsync", "--log-filter", "calsync_caldav=trace", "calendars"])
                .unwrap();
        assert_eq!(cli.log_filter.as_deref(), Some("calsync_caldav=trace"));
    }

    #[test]
    fn events_range() {
        let cli = Cli::try_parse_from([
            "calsync",
            "events",
            "--calendar",
            "work",
            "--from",
            "2024-01-01",
            "--to",
            "2024-01-31T23:59",
        ])
        .unwrap();
        match cli.command {
            Command::Events { calendar, from, to } => {
                assert_eq!(calendar.as_deref(), Some("work"));
                assert_eq!(from.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
                assert_eq!(to.unwrap().to_rfc3339(), "2024-01-31T23:59:00+00:00");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn update_with_empty_rrule() {
        let cli = Cli::try_parse_from([
            "calsync", "update", "abc", "--title", "Renamed", "--all-day", "true", "--rrule", "",
        ])
        .unwrap();
        match cli.command {
            Command::Update { uid, fields, rrule, .. } => {
                assert_eq!(uid, "abc");
                assert_eq!(fields.title.as_deref(), Some("Renamed"));
                assert_eq!(fields.all_day, Some(true));
                assert_eq!(rrule.as_deref(), Some(""));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn skip_occurrence_needs_a_date() {
        assert!(Cli::try_parse_from(["calsync", "skip-occurrence", "abc"]).is_err());
        assert!(
            Cli::try_parse_from(["calsync", "skip-occurrence", "abc", "--date", "tomorrow"])
                .is_err()
        );
        let cli =
            Cli::try_parse_from(["calsync", "skip-occurrence", "abc", "--date", "2024-01-08"])
                .unwrap();
        assert!(matches!(cli.command, Command::SkipOccurrence { .. }));
    }
}
