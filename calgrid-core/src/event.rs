//! Storage-agnostic event records.
//!
//! These are the engine inputs: the caller converts whatever it stores into
//! `CalendarEvent`s expressed in the wall-clock time of the view being rendered.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{CalGridError, CalGridResult};
use crate::recurrence::Recurrence;

/// Layout length of a timed event that has no end.
const DEFAULT_DURATION_HOURS: i64 = 1;

/// Any event at least this long is treated as all-day.
const ALL_DAY_MIN_HOURS: i64 = 20;

/// Events starting at midnight and at least this long are treated as all-day.
const MIDNIGHT_ALL_DAY_MIN_HOURS: i64 = 12;

/// Start or end of an event: a calendar date (all-day) or a wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

impl EventTime {
    /// The instant this time refers to; dates resolve to their midnight.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN),
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            EventTime::DateTime(dt) => dt.date(),
            EventTime::Date(d) => *d,
        }
    }

    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Move this time by `delta`, keeping the date/time kind.
    pub fn shifted(&self, delta: Duration) -> EventTime {
        match self {
            EventTime::DateTime(dt) => EventTime::DateTime(*dt + delta),
            EventTime::Date(d) => EventTime::Date((d.and_time(NaiveTime::MIN) + delta).date()),
        }
    }

    /// Compact form used in instance ids (`20250320` or `20250320T090000`).
    pub fn compact(&self) -> String {
        match self {
            EventTime::DateTime(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl FromStr for EventTime {
    type Err = CalGridError;

    /// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM` and `YYYY-MM-DDTHH:MM:SS`
    /// (a space works in place of the `T`).
    fn from_str(s: &str) -> CalGridResult<Self> {
        let s = s.trim();
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(EventTime::Date(d));
        }
        let normalized = s.replacen(' ', "T", 1);
        ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
            .map(EventTime::DateTime)
            .ok_or_else(|| CalGridError::InvalidDate(s.to_string(), "YYYY-MM-DD[THH:MM[:SS]]"))
    }
}

/// A calendar event as seen by the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub start: EventTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    /// Explicit all-day flag; derived from the span when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,

    /// Pattern and exceptions for a recurring master event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    /// Original start of the occurrence this instance was expanded from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<EventTime>,
}

impl CalendarEvent {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: EventTime,
        end: Option<EventTime>,
    ) -> Self {
        CalendarEvent {
            id: id.into(),
            title: title.into(),
            start,
            end,
            all_day: None,
            recurrence: None,
            recurrence_id: None,
        }
    }

    /// End used for layout: the explicit end, else one hour after a timed
    /// start, else the midnight after an all-day start.
    pub fn effective_end(&self) -> NaiveDateTime {
        match (self.end, self.start) {
            (Some(end), _) => end.naive(),
            (None, EventTime::Date(d)) => d.and_time(NaiveTime::MIN) + Duration::days(1),
            (None, EventTime::DateTime(dt)) => dt + Duration::hours(DEFAULT_DURATION_HOURS),
        }
    }

    pub fn duration(&self) -> Duration {
        self.effective_end() - self.start.naive()
    }

    /// Whether the event belongs in the all-day row rather than the timed grid.
    pub fn is_all_day(&self) -> bool {
        if let Some(flag) = self.all_day {
            return flag;
        }
        if self.start.is_date() {
            return true;
        }
        let duration = self.duration();
        let starts_at_midnight = self.start.naive().time().num_seconds_from_midnight() == 0;
        duration >= Duration::hours(ALL_DAY_MIN_HOURS)
            || (starts_at_midnight && duration >= Duration::hours(MIDNIGHT_ALL_DAY_MIN_HOURS))
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Id of the instance whose original start is `original`.
    pub fn instance_id(&self, original: &EventTime) -> String {
        format!("{}_{}", self.id, original.compact())
    }

    /// Build the instance of this (master) event that starts at `start`.
    ///
    /// The instance keeps the master's duration and date/time kind, drops the
    /// recurrence, and gets the id `<master id>_<compact start>`.
    pub fn instance_at(&self, start: NaiveDateTime) -> CalendarEvent {
        let delta = start - self.start.naive();
        let instance_start = self.start.shifted(delta);
        CalendarEvent {
            id: self.instance_id(&instance_start),
            title: self.title.clone(),
            start: instance_start,
            end: self.end.map(|end| end.shifted(delta)),
            all_day: self.all_day,
            recurrence: None,
            recurrence_id: Some(instance_start),
        }
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
