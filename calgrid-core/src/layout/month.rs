//! Month-view cells.
//!
//! No column math here: a day cell lists its events in start order, truncated
//! to a fixed count, with the remainder reported as overflow ("+2 more").

use chrono::{Datelike, Days, NaiveDate, Weekday};
use serde::Serialize;

use crate::event::CalendarEvent;
use crate::window::{TimeWindow, add_days};

pub const DEFAULT_MAX_VISIBLE: usize = 3;

/// Days shown in a month grid (six weeks).
const GRID_DAYS: u64 = 42;

/// One day of a month view.
#[derive(Debug, Clone, Serialize)]
pub struct MonthCell<'a> {
    pub date: NaiveDate,
    pub visible: Vec<&'a CalendarEvent>,
    /// Events that touch the day but did not fit
    pub overflow: usize,
}

/// Events touching `date`, stable-sorted by start and truncated to `max_visible`.
pub fn month_cell(events: &[CalendarEvent], date: NaiveDate, max_visible: usize) -> MonthCell<'_> {
    let day = TimeWindow::day(date);
    let mut touching: Vec<&CalendarEvent> = events
        .iter()
        .filter(|event| day.intersects(event.start.naive(), event.effective_end()))
        .collect();
    touching.sort_by_key(|event| event.start.naive());

    let overflow = touching.len().saturating_sub(max_visible);
    touching.truncate(max_visible);

    MonthCell {
        date,
        visible: touching,
        overflow,
    }
}

/// The 42 dates of the grid for `year-month`, starting on `week_start`.
pub fn month_grid(year: i32, month: u32, week_start: Weekday) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let lead = (7 + first.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    let start = first.checked_sub_days(Days::new(u64::from(lead)))?;
    Some((0..GRID_DAYS).map(|offset| add_days(start, offset)).collect())
}

/// Cells for every date of the month grid.
pub fn month_cells(
    events: &[CalendarEvent],
    year: i32,
    month: u32,
    week_start: Weekday,
    max_visible: usize,
) -> Vec<MonthCell<'_>> {
    month_grid(year, month, week_start)
        .unwrap_or_default()
        .into_iter()
        .map(|date| month_cell(events, date, max_visible))
        .collect()
}
