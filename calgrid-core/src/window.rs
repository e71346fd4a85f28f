//! Time windows a view renders: a day, a run of days, or an hour slot.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{CalGridError, CalGridResult};

/// Half-open wall-clock range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

impl TimeWindow {
    /// The whole of `date`, midnight to midnight.
    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, 1)
    }

    /// `count` consecutive days starting at `date` (a week view is `days(d, 7)`).
    ///
    /// A window running past the last representable date ends there.
    pub fn days(date: NaiveDate, count: u32) -> Self {
        Self::checked_days(date, count).unwrap_or(TimeWindow {
            from: date.and_time(NaiveTime::MIN),
            to: NaiveDateTime::MAX,
        })
    }

    /// Like [`TimeWindow::days`], but `None` when the window would run past
    /// the last representable date.
    pub fn checked_days(date: NaiveDate, count: u32) -> Option<Self> {
        let from = date.and_time(NaiveTime::MIN);
        let to = from.checked_add_signed(Duration::days(i64::from(count.max(1))))?;
        Some(TimeWindow { from, to })
    }

    /// One hour of `date` starting at `hour` (clamped to 0-23).
    pub fn hour_slot(date: NaiveDate, hour: u32) -> Self {
        let from = date.and_time(NaiveTime::MIN) + Duration::hours(i64::from(hour.min(23)));
        TimeWindow {
            from,
            to: from.checked_add_signed(Duration::hours(1)).unwrap_or(NaiveDateTime::MAX),
        }
    }

    /// Build a window from CLI-style arguments.
    /// - `date`: YYYY-MM-DD, defaults to `today`
    /// - `days`: number of days, defaults to 1
    pub fn from_args(date: Option<&str>, days: Option<u32>, today: NaiveDate) -> CalGridResult<Self> {
        let start = match date {
            Some(s) => parse_date(s)?,
            None => today,
        };
        let count = days.unwrap_or(1);
        Self::checked_days(start, count).ok_or_else(|| {
            CalGridError::InvalidDate(
                format!("{start} + {count} days"),
                "a range that ends within the calendar",
            )
        })
    }

    /// Whether an event spanning `[start, end)` shows up in this window.
    ///
    /// Zero-length events count when their instant lies inside the window.
    pub fn intersects(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        start < self.to && (end > self.from || start >= self.from)
    }

    /// Clip a span to the window's bounds.
    pub fn clip(&self, start: NaiveDateTime, end: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        (start.max(self.from), end.min(self.to))
    }

    /// Calendar dates the window touches, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let first = self.from.date();
        let last_instant = self.to - Duration::nanoseconds(1);
        let last = last_instant.date().max(first);
        first.iter_days().take_while(move |d| *d <= last)
    }
}

/// Parse YYYY-MM-DD.
pub fn parse_date(s: &str) -> CalGridResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CalGridError::InvalidDate(s.to_string(), "YYYY-MM-DD"))
}

/// Parse YYYY-MM into the first day of that month.
pub fn parse_month(s: &str) -> CalGridResult<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
        .map_err(|_| CalGridError::InvalidDate(s.to_string(), "YYYY-MM"))
}

/// Step `date` forward by whole days, saturating at the end of time.
pub(crate) fn add_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}
