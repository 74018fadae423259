//! CalDAV transport, the `CalendarStore` trait, and the calendar service

pub mod caldav;
pub mod error;
pub mod service;
pub mod store;

#[cfg(test)]
mod memory;

pub use caldav::{CalDavConfig, CalDavTransport};
pub use error::{CalDavError, CalDavErrorCode, CalDavResult};
pub use service::{
    CalendarService, EventDraft, EventPatch, RecurrenceChange, ServiceError, ServiceResult,
    exception_uid,
};
pub use store::{
    BoxFuture, CalendarInfo, CalendarStore, EventResource, QueryResult, SkippedEntry,
    WriteCondition, WriteStatus,
};
