//! CalDAV implementation of [`CalendarStore`](crate::CalendarStore).
//!
//! - preemptive HTTP Basic authentication
//! - `PROPFIND` for calendar discovery
//! - `REPORT` calendar-query with a VEVENT time-range filter
//! - `GET`/`PUT`/`DELETE` on `{calendar}/{uid}.ics`, writes guarded by ETags
//!
//! ```ignore
//! use calsync_caldav::caldav::{CalDavConfig, CalDavTransport};
//!
//! let config = CalDavConfig::new("https://dav.example.com/calendars", "alice")?
//!     .with_credentials("alice", "password");
//! let transport = CalDavTransport::new(config)?;
//! ```

mod auth;
mod client;
mod config;
mod transport;
mod xml;

pub use client::CalDavClient;
pub use config::CalDavConfig;
pub use transport::CalDavTransport;
