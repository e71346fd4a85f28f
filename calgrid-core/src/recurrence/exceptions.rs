//! Exception dates: occurrences removed from a series.
//!
//! Exceptions are kept as ISO calendar dates (`YYYY-MM-DD`) and compared by the
//! occurrence's local calendar date only, never by full timestamp.

use std::collections::BTreeSet;

use chrono::Datelike;

/// The `YYYY-MM-DD` key of a date-like value, in its own (local) calendar.
pub fn exception_key<D: Datelike>(date: &D) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Whether `date` falls on one of the excluded calendar days.
pub fn is_excepted<D: Datelike>(date: &D, exceptions: &BTreeSet<String>) -> bool {
    !exceptions.is_empty() && exceptions.contains(&exception_key(date))
}
