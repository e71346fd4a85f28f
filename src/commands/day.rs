use std::path::Path;

use anyhow::Result;
use calgrid_core::config::Settings;
use calgrid_core::event::CalendarEvent;
use calgrid_core::layout::{
    EventLayout, Placement, compute_layout, palette_index, partition_all_day,
};
use calgrid_core::recurrence::expand_events;
use calgrid_core::window::TimeWindow;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::input::load_events;
use crate::render::{BAR_WIDTH, Render, fit, paint, placement_bar, pluralize, time_range};

/// Width of the title column in the text view.
const TITLE_WIDTH: usize = 24;

/// One day (or hour slot) of laid-out events.
#[derive(Debug, Serialize)]
pub struct DayView<'a> {
    pub date: NaiveDate,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub all_day: Vec<&'a CalendarEvent>,
    /// Timed events in paint order
    pub events: Vec<PlacedEvent<'a>>,
}

#[derive(Debug, Serialize)]
pub struct PlacedEvent<'a> {
    #[serde(skip)]
    pub event: &'a CalendarEvent,
    pub id: &'a str,
    pub title: &'a str,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: usize,
    pub layout: EventLayout,
    pub placement: Placement,
}

pub fn run(
    settings: &Settings,
    file: &Path,
    date: Option<&str>,
    days: Option<u32>,
    hour: Option<u32>,
    json: bool,
) -> Result<()> {
    let tz = settings.timezone()?;
    let today = Utc::now().with_timezone(&tz).date_naive();
    let range = TimeWindow::from_args(date, days, today)?;

    let events = load_events(file, &tz)?;
    let expanded = expand_events(&events, &tz, &range);
    let views = day_views(&expanded, &range, hour, settings);

    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }

    for (i, view) in views.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_view(view, settings);
    }

    Ok(())
}

/// Lay out `events` for every day of `range`, or only for one hour of each day.
pub fn day_views<'a>(
    events: &'a [CalendarEvent],
    range: &TimeWindow,
    hour: Option<u32>,
    settings: &Settings,
) -> Vec<DayView<'a>> {
    let (all_day, timed) = partition_all_day(events);
    let inset = settings.layout.contained_inset;
    let palette_size = settings.layout.palette_size;

    range
        .dates()
        .map(|date| {
            let window = match hour {
                Some(hour) => TimeWindow::hour_slot(date, hour),
                None => TimeWindow::day(date),
            };
            let day = TimeWindow::day(date);

            let layouts = compute_layout(timed.iter().copied(), &window);
            let mut placed: Vec<PlacedEvent<'a>> = timed
                .iter()
                .copied()
                .filter_map(|event| {
                    let layout = layouts.get(&event.id)?.clone();
                    let (start, end) = window.clip(event.start.naive(), event.effective_end());
                    Some(PlacedEvent {
                        event,
                        id: &event.id,
                        title: &event.title,
                        start,
                        end,
                        color: palette_index(&event.id, palette_size),
                        placement: layout.placement(inset),
                        layout,
                    })
                })
                .collect();
            placed.sort_by_key(|p| p.layout.z_index);

            DayView {
                date,
                window_start: window.from,
                window_end: window.to,
                all_day: all_day
                    .iter()
                    .copied()
                    .filter(|event| day.intersects(event.start.naive(), event.effective_end()))
                    .collect(),
                events: placed,
            }
        })
        .collect()
}

fn print_view(view: &DayView<'_>, settings: &Settings) {
    let palette_size = settings.layout.palette_size;

    let mut heading = view.date.format("%a %b %-d, %Y").to_string();
    if view.window_end - view.window_start < chrono::Duration::days(1) {
        heading.push_str(&format!(" ({})", time_range(view.window_start, view.window_end)));
    }
    println!("{}", heading.bold());

    for event in &view.all_day {
        println!("  {:<11} {}", "all-day".dimmed(), paint(&event.title, &event.id, palette_size));
    }

    if view.events.is_empty() && view.all_day.is_empty() {
        println!("  {}", "No events".dimmed());
        return;
    }

    for placed in &view.events {
        let bar = placement_bar(&placed.placement, BAR_WIDTH);
        let title = fit(placed.title, TITLE_WIDTH);
        let mut detail = format!("col {}/{}", placed.layout.column + 1, placed.layout.total_columns);
        if let Some(container) = view
            .events
            .iter()
            .find(|p| Some(p.id) == placed.layout.container.as_deref())
        {
            detail.push_str(&format!(" in {}", container.event.render()));
        }
        println!(
            "  {:<11} {} {} {}",
            time_range(placed.start, placed.end),
            paint(&bar, placed.id, palette_size),
            paint(&title, placed.id, palette_size),
            detail.dimmed()
        );
    }

    let count = view.events.len() + view.all_day.len();
    println!("  {}", format!("{} {}", count, pluralize("event", count)).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use calgrid_core::event::EventTime;
    use calgrid_core::recurrence::{Recurrence, RecurrencePattern};

    fn event(id: &str, start: &str, end: &str) -> CalendarEvent {
        CalendarEvent::new(
            id,
            id,
            start.parse::<EventTime>().unwrap(),
            Some(end.parse::<EventTime>().unwrap()),
        )
    }

    fn march_20() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    #[test]
    fn splits_all_day_and_lays_out_timed_events() {
        let events = vec![
            event("holiday", "2025-03-20", "2025-03-21"),
            event("a", "2025-03-20T09:00", "2025-03-20T12:00"),
            event("b", "2025-03-20T10:00", "2025-03-20T11:00"),
        ];
        let views = day_views(&events, &TimeWindow::day(march_20()), None, &Settings::default());
        assert_eq!(views.len(), 1);

        let view = &views[0];
        assert_eq!(view.all_day.len(), 1);
        let ids: Vec<_> = view.events.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(view.events[0].placement.width, 100.0);
        assert_eq!(view.events[1].placement.left, 10.0);
        assert_eq!(view.events[1].layout.container.as_deref(), Some("a"));
    }

    #[test]
    fn hour_slot_only_shows_that_hour() {
        let events = vec![
            event("a", "2025-03-20T09:00", "2025-03-20T10:00"),
            event("b", "2025-03-20T09:30", "2025-03-20T10:30"),
            event("c", "2025-03-20T14:00", "2025-03-20T15:00"),
        ];
        let views = day_views(&events, &TimeWindow::day(march_20()), Some(10), &Settings::default());
        let ids: Vec<_> = views[0].events.iter().map(|p| p.id).collect();
        // a ends exactly at 10:00, so only b touches the 10:00 slot
        assert_eq!(ids, vec!["b"]);
        assert_eq!(views[0].events[0].layout.total_columns, 1);
        assert_eq!(views[0].events[0].start, "2025-03-20T10:00:00".parse::<NaiveDateTime>().unwrap());
    }

    #[test]
    fn one_view_per_day_with_recurring_instances() {
        let mut standup = event("standup", "2025-03-17T09:00", "2025-03-17T09:15");
        standup.recurrence = Some(Recurrence::new(RecurrencePattern::weekdays()));
        let events = vec![standup];

        let range = TimeWindow::days(march_20(), 4);
        let expanded = expand_events(&events, &Utc, &range);
        let views = day_views(&expanded, &range, None, &Settings::default());

        assert_eq!(views.len(), 4);
        let counts: Vec<_> = views.iter().map(|v| v.events.len()).collect();
        // Thu, Fri, Sat, Sun
        assert_eq!(counts, vec![1, 1, 0, 0]);
        assert_eq!(views[0].events[0].id, "standup_20250320T090000");
    }

    #[test]
    fn serializes_to_json() {
        let events = vec![event("a", "2025-03-20T09:00", "2025-03-20T10:00")];
        let views = day_views(&events, &TimeWindow::day(march_20()), None, &Settings::default());
        let json = serde_json::to_value(&views).unwrap();
        assert_eq!(json[0]["date"], "2025-03-20");
        assert_eq!(json[0]["events"][0]["layout"]["column"], 0);
        assert_eq!(json[0]["events"][0]["placement"]["width"], 100.0);
    }
}
