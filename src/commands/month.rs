use std::path::Path;

use anyhow::{Context, Result};
use calgrid_core::config::Settings;
use calgrid_core::layout::{MonthCell, month_cells, month_grid};
use calgrid_core::recurrence::expand_events;
use calgrid_core::window::{TimeWindow, parse_month};
use chrono::{Datelike, NaiveDate, Utc, Weekday};
use owo_colors::OwoColorize;

use crate::input::load_events;
use crate::render::{fit, paint};

/// Width of one day column in the grid.
const CELL_WIDTH: usize = 14;

pub fn run(settings: &Settings, file: &Path, month: Option<&str>) -> Result<()> {
    let tz = settings.timezone()?;
    let week_start = settings.week_start()?;
    let first = match month {
        Some(month) => parse_month(month)?,
        None => {
            let today = Utc::now().with_timezone(&tz).date_naive();
            today.with_day(1).context("Could not determine the current month")?
        }
    };

    let grid = month_grid(first.year(), first.month(), week_start)
        .with_context(|| format!("Month {} is out of range", first.format("%Y-%m")))?;
    let grid_start = grid.first().copied().context("Empty month grid")?;
    let range = TimeWindow::days(grid_start, grid.len() as u32);

    let events = load_events(file, &tz)?;
    let expanded = expand_events(&events, &tz, &range);
    let cells = month_cells(
        &expanded,
        first.year(),
        first.month(),
        week_start,
        settings.layout.month_max_visible,
    );

    println!("{}", first.format("%B %Y").bold());
    println!("{}", weekday_header(week_start).dimmed());
    for week in cells.chunks(7) {
        for line in week_lines(week, first.month(), settings) {
            println!("{line}");
        }
    }

    Ok(())
}

fn weekday_header(week_start: Weekday) -> String {
    let mut day = week_start;
    (0..7)
        .map(|_| {
            let label = fit(&day.to_string(), CELL_WIDTH);
            day = day.succ();
            label
        })
        .collect()
}

/// Render one week row: a line of day numbers, then one line per visible slot.
fn week_lines(week: &[MonthCell<'_>], month: u32, settings: &Settings) -> Vec<String> {
    let max_visible = settings.layout.month_max_visible;
    let palette_size = settings.layout.palette_size;

    let mut lines = vec![
        week.iter()
            .map(|cell| day_number(cell.date, month))
            .collect::<String>(),
    ];

    let slots = week
        .iter()
        .map(|cell| cell.visible.len() + usize::from(cell.overflow > 0))
        .max()
        .unwrap_or(0)
        .min(max_visible + 1);

    for slot in 0..slots {
        let line: String = week
            .iter()
            .map(|cell| match cell.visible.get(slot) {
                Some(event) => {
                    paint(&fit(&event.title, CELL_WIDTH - 1), &event.id, palette_size) + " "
                }
                None if slot == cell.visible.len() && cell.overflow > 0 => {
                    let more = format!("+{} more", cell.overflow);
                    fit(&more, CELL_WIDTH).dimmed().to_string()
                }
                None => " ".repeat(CELL_WIDTH),
            })
            .collect();
        lines.push(line);
    }

    lines
}

fn day_number(date: NaiveDate, month: u32) -> String {
    let label = fit(&date.day().to_string(), CELL_WIDTH);
    if date.month() == month {
        label.bold().to_string()
    } else {
        label.dimmed().to_string()
    }
}
