//! Importing events from iCalendar documents.

mod parse;

pub use parse::parse_events;
