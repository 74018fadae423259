//! calsync CLI entry point.

use std::process::ExitCode;

use calsync_caldav::{CalDavTransport, CalendarService};
use calsync_core::time::start_of_day;
use calsync_core::{TracingConfig, init_tracing};
use chrono::Utc;
use clap::Parser;
use tracing::debug;

use calsync_cli::cli::{Cli, Command};
use calsync_cli::commands::{self, NewEvent};
use calsync_cli::config::Config;
use calsync_cli::error::CliResult;
use calsync_cli::output::OutputFormat;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut tracing_config = TracingConfig::from_flags(cli.debug, cli.json);
    if let Some(ref filter) = cli.log_filter {
        tracing_config = tracing_config.with_filter(filter.as_str());
    }
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<String> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let format = OutputFormat::from_flag(cli.json);

    let caldav = config.to_caldav_config()?;
    debug!(url = %caldav.url, principal = %caldav.principal, "Using CalDAV server");
    let service = CalendarService::new(CalDavTransport::new(caldav)?);

    match cli.command {
        Command::Calendars => commands::calendars(&service, format).await,
        Command::Events { calendar, from, to } => {
            let calendar = config.calendar(calendar)?;
            let from = from.unwrap_or_else(|| start_of_day(Utc::now().date_naive()));
            commands::events(
                &service,
                &calendar,
                from,
                to,
                config.defaults.window_days,
                format,
            )
            .await
        }
        Command::Create {
            calendar,
            title,
            start,
            end,
            all_day,
            details,
            rrule,
        } => {
            let calendar = config.calendar(calendar)?;
            let new = NewEvent {
                title,
                start,
                end,
                all_day,
                details,
                rrule,
            };
            commands::create(&service, &calendar, new, format).await
        }
        Command::Update {
            uid,
            calendar,
            fields,
            rrule,
        } => {
            let calendar = config.calendar(calendar)?;
            commands::update(&service, &calendar, &uid, fields, rrule, format).await
        }
        Command::EditOccurrence {
            uid,
            calendar,
            occurrence,
            fields,
        } => {
            let calendar = config.calendar(calendar)?;
            commands::edit_occurrence(&service, &calendar, &uid, occurrence, fields, format).await
        }
        Command::SkipOccurrence {
            uid,
            calendar,
            date,
        } => {
            let calendar = config.calendar(calendar)?;
            commands::skip_occurrence(&service, &calendar, &uid, date).await
        }
        Command::Delete { uid, calendar } => {
            let calendar = config.calendar(calendar)?;
            commands::delete(&service, &calendar, &uid).await
        }
    }
}
