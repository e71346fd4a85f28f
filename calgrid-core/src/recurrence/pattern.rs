//! Recurrence pattern model.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc, Weekday};

use crate::error::{CalGridError, CalGridResult};

/// How often a pattern repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }

    /// Singular unit noun ("day", "week", ...).
    pub fn unit(&self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = CalGridError;

    fn from_str(s: &str) -> CalGridResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            other => Err(CalGridError::InvalidRule(format!("unsupported FREQ '{other}'"))),
        }
    }
}

/// A recurrence pattern: a frequency plus optional step, bound and BY* refinements.
///
/// Refinements only apply to their own frequency (`by_day` to weekly,
/// `by_month_day` to monthly and yearly, `by_month` to yearly) and are ignored
/// elsewhere. `count` and `until` may both be set, in which case whichever
/// bound is reached first ends the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    /// Inclusive end of the series
    pub until: Option<DateTime<Utc>>,
    pub by_day: Vec<Weekday>,
    pub by_month_day: Vec<u32>,
    pub by_month: Vec<u32>,
}

impl RecurrencePattern {
    pub fn new(frequency: Frequency) -> Self {
        RecurrencePattern {
            frequency,
            interval: 1,
            count: None,
            until: None,
            by_day: Vec::new(),
            by_month_day: Vec::new(),
            by_month: Vec::new(),
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    /// Set the inclusive end; sub-second precision is dropped since the rule
    /// format cannot carry it.
    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until.trunc_subsecs(0));
        self
    }

    pub fn with_by_day(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.by_day = days.into_iter().collect();
        self
    }

    pub fn with_by_month_day(mut self, days: impl IntoIterator<Item = u32>) -> Self {
        self.by_month_day = days.into_iter().collect();
        self
    }

    pub fn with_by_month(mut self, months: impl IntoIterator<Item = u32>) -> Self {
        self.by_month = months.into_iter().collect();
        self
    }

    /// Effective step; an interval of zero behaves as one.
    pub fn step(&self) -> u32 {
        self.interval.max(1)
    }

    pub fn is_bounded(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }

    /// Weekdays a weekly pattern is restricted to, if any.
    pub fn weekly_days(&self) -> Option<&[Weekday]> {
        (self.frequency == Frequency::Weekly && !self.by_day.is_empty())
            .then_some(self.by_day.as_slice())
    }

    /// Day of month for monthly and yearly patterns. Only the first value is honored.
    pub fn month_day(&self) -> Option<u32> {
        match self.frequency {
            Frequency::Monthly | Frequency::Yearly => self.by_month_day.first().copied(),
            _ => None,
        }
    }

    /// Month for yearly patterns. Only the first value is honored.
    pub fn month(&self) -> Option<u32> {
        match self.frequency {
            Frequency::Yearly => self.by_month.first().copied(),
            _ => None,
        }
    }
}

/// Two-letter RRULE weekday code.
pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "SU",
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
    }
}

pub fn parse_weekday_code(code: &str) -> Option<Weekday> {
    match code.trim().to_ascii_uppercase().as_str() {
        "SU" => Some(Weekday::Sun),
        "MO" => Some(Weekday::Mon),
        "TU" => Some(Weekday::Tue),
        "WE" => Some(Weekday::Wed),
        "TH" => Some(Weekday::Thu),
        "FR" => Some(Weekday::Fri),
        "SA" => Some(Weekday::Sat),
        _ => None,
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}
