//! Core engines for calgrid.
//!
//! This crate holds the pure, storage-agnostic parts of the calendar:
//! - `layout` assigns columns and insets to overlapping events in a window,
//!   and truncates month-view cells
//! - `recurrence` encodes recurrence patterns as RRULE strings and expands
//!   them into occurrence dates and concrete event instances
//! - `ics` imports events from iCalendar documents
//!
//! Both engines are synchronous and hold no state between calls, so they can
//! be invoked from any render path or thread without coordination.

pub mod config;
pub mod error;
pub mod event;
pub mod ics;
pub mod layout;
pub mod recurrence;
pub mod window;

pub use error::{CalGridError, CalGridResult};
pub use event::{CalendarEvent, EventTime};
pub use window::TimeWindow;
