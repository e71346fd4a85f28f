//! Materializing recurring events into concrete instances for a view.
//!
//! Each occurrence of a master event becomes its own `CalendarEvent` with the
//! master's duration, so the layout engine never sees recurrence at all.

use std::collections::HashSet;

use chrono::{Duration, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

use super::exceptions::is_excepted;
use super::expand::{MAX_OCCURRENCES_CEILING, Occurrences};
use crate::event::{CalendarEvent, EventTime};
use crate::window::TimeWindow;

/// Occurrences replaced by a standalone override, keyed by master id and original start.
type Overridden<'a> = HashSet<(&'a str, NaiveDateTime)>;

/// Expand one event into the instances that touch `window`.
///
/// - Non-recurring events are returned as-is when they touch the window.
/// - Occurrences on an exception date are skipped.
/// - `tz` is the timezone the event's wall-clock times are in; it is only
///   needed to compare against the pattern's UTC `until`.
///
/// Occurrences that end before the window are skipped without counting
/// against [`MAX_OCCURRENCES_CEILING`], which caps the instances in the window.
pub fn expand_event<Tz: TimeZone>(
    master: &CalendarEvent,
    tz: &Tz,
    window: &TimeWindow,
) -> Vec<CalendarEvent> {
    expand_series(master, tz, window, &Overridden::new())
}

fn expand_series<Tz: TimeZone>(
    master: &CalendarEvent,
    tz: &Tz,
    window: &TimeWindow,
    overridden: &Overridden<'_>,
) -> Vec<CalendarEvent> {
    let Some(recurrence) = &master.recurrence else {
        return if window.intersects(master.start.naive(), master.effective_end()) {
            vec![master.clone()]
        } else {
            Vec::new()
        };
    };

    let start = master.start.naive();
    let Some(anchor) = tz.from_local_datetime(&start).earliest() else {
        warn!(id = %master.id, start = %start, "start does not exist in timezone, skipping series");
        return Vec::new();
    };

    // Instances starting this early can still reach into the window.
    let lead = master.duration().max(Duration::zero());
    let earliest = window.from.checked_sub_signed(lead).unwrap_or(window.from);

    Occurrences::new(&anchor, &recurrence.pattern, Some(MAX_OCCURRENCES_CEILING))
        .skip_before(earliest)
        .map(|occurrence| occurrence.naive_local())
        .take_while(|occurrence| *occurrence < window.to)
        .filter(|occurrence| !is_excepted(occurrence, &recurrence.exceptions))
        .filter(|occurrence| !overridden.contains(&(master.id.as_str(), *occurrence)))
        .map(|occurrence| master.instance_at(occurrence))
        .filter(|instance| window.intersects(instance.start.naive(), instance.effective_end()))
        .collect()
}

/// A standalone override (an event with a `recurrence_id`), placed at its own time.
///
/// It takes the id of the instance it replaces, so several overrides of one
/// series stay distinct.
fn expand_override(
    event: &CalendarEvent,
    original: &EventTime,
    window: &TimeWindow,
) -> Option<CalendarEvent> {
    if !window.intersects(event.start.naive(), event.effective_end()) {
        return None;
    }
    Some(CalendarEvent {
        id: event.instance_id(original),
        recurrence: None,
        ..event.clone()
    })
}

/// Expand a mixed list of events into everything that touches `window`.
///
/// An event carrying a `recurrence_id` overrides the occurrence of the
/// series with the same id that starts at that time: the generated
/// instance is dropped and the override is placed instead.
pub fn expand_events<Tz: TimeZone>(
    events: &[CalendarEvent],
    tz: &Tz,
    window: &TimeWindow,
) -> Vec<CalendarEvent> {
    let overridden: Overridden<'_> = events
        .iter()
        .filter_map(|event| Some((event.id.as_str(), event.recurrence_id?.naive())))
        .collect();
    if !overridden.is_empty() {
        debug!(count = overridden.len(), "applying recurrence overrides");
    }

    events
        .iter()
        .flat_map(|event| match &event.recurrence_id {
            Some(original) => expand_override(event, original, window).into_iter().collect(),
            None => expand_series(event, tz, window, &overridden),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Recurrence, RecurrencePattern};
    use chrono::{Datelike, NaiveDate, TimeZone, Utc, Weekday};

    fn at(s: &str) -> EventTime {
        s.parse().unwrap()
    }

    fn standup() -> CalendarEvent {
        let mut event = CalendarEvent::new(
            "standup",
            "Standup",
            at("2025-03-17T09:00"),
            Some(at("2025-03-17T09:15")),
        );
        event.recurrence = Some(Recurrence::new(RecurrencePattern::weekdays()));
        event
    }

    fn week_of(date: &str) -> TimeWindow {
        TimeWindow::days(date.parse::<NaiveDate>().unwrap(), 7)
    }

    #[test]
    fn expands_into_window_with_duration() {
        let instances = expand_event(&standup(), &Utc, &week_of("2025-03-24"));
        assert_eq!(instances.len(), 5);
        assert_eq!(instances[0].id, "standup_20250324T090000");
        assert_eq!(instances[0].end, Some(at("2025-03-24T09:15")));
        assert!(instances.iter().all(|i| i.recurrence.is_none()));
        assert!(instances.iter().all(|i| i.start.date().weekday() != Weekday::Sat));
    }

    #[test]
    fn skips_exception_dates() {
        let mut event = standup();
        if let Some(recurrence) = event.recurrence.as_mut() {
            recurrence.exceptions.insert("2025-03-26".to_string());
        }
        let instances = expand_event(&event, &Utc, &week_of("2025-03-24"));
        assert_eq!(instances.len(), 4);
        assert!(instances.iter().all(|i| i.start.date().to_string() != "2025-03-26"));
    }

    #[test]
    fn window_before_series_is_empty() {
        assert!(expand_event(&standup(), &Utc, &week_of("2025-03-01")).is_empty());
    }

    #[test]
    fn respects_count() {
        let mut event = standup();
        event.recurrence = Some(Recurrence::new(RecurrencePattern::daily().with_count(3)));
        let instances = expand_event(&event, &Utc, &week_of("2025-03-17"));
        assert_eq!(instances.len(), 3);
    }

    #[test]
    fn until_in_utc_against_local_times() {
        // 09:00 at +01:00 is 08:00 UTC; an until of 08:30 UTC on the 19th keeps three days
        let tz = chrono::FixedOffset::east_opt(3600).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 3, 19, 8, 30, 0).unwrap();
        let mut event = standup();
        event.recurrence = Some(Recurrence::new(RecurrencePattern::daily().with_until(until)));
        assert_eq!(expand_event(&event, &tz, &week_of("2025-03-17")).len(), 3);
    }

    #[test]
    fn multi_day_instance_started_before_window_is_kept() {
        let mut trip = CalendarEvent::new("trip", "Trip", at("2025-03-01"), Some(at("2025-03-04")));
        trip.recurrence = Some(Recurrence::new(RecurrencePattern::weekly()));
        let window = TimeWindow::day("2025-03-10".parse().unwrap());
        let instances = expand_event(&trip, &Utc, &window);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].start, at("2025-03-08"));
    }

    #[test]
    fn plain_events_pass_through() {
        let lunch = CalendarEvent::new("1", "Lunch", at("2025-03-20T12:00"), None);
        let events = vec![lunch.clone(), standup()];
        let expanded = expand_events(&events, &Utc, &TimeWindow::day("2025-03-20".parse().unwrap()));
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0], lunch);
        assert_eq!(expanded[1].id, "standup_20250320T090000");
    }

    #[test]
    fn long_running_series_reaches_todays_window() {
        let mut event = standup();
        event.start = at("2022-01-03T09:00");
        event.end = Some(at("2022-01-03T09:15"));
        event.recurrence = Some(Recurrence::new(RecurrencePattern::daily()));
        let instances = expand_event(&event, &Utc, &TimeWindow::day("2025-03-20".parse().unwrap()));
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].id, "standup_20250320T090000");
        assert_eq!(instances[0].end, Some(at("2025-03-20T09:15")));
    }

    #[test]
    fn long_running_weekly_and_monthly_series_land_on_the_right_dates() {
        let mut weekdays = standup();
        weekdays.start = at("2020-01-06T09:00");
        weekdays.end = Some(at("2020-01-06T09:15"));
        let instances = expand_event(&weekdays, &Utc, &week_of("2025-03-17"));
        let dates: Vec<_> = instances.iter().map(|i| i.start.date().to_string()).collect();
        assert_eq!(
            dates,
            vec!["2025-03-17", "2025-03-18", "2025-03-19", "2025-03-20", "2025-03-21"]
        );

        let mut rent = CalendarEvent::new("rent", "Rent", at("1990-01-31"), None);
        rent.recurrence = Some(Recurrence::new(RecurrencePattern::monthly()));
        let window = TimeWindow::days("2025-02-01".parse().unwrap(), 28);
        let instances = expand_event(&rent, &Utc, &window);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].start, at("2025-02-28"));
    }

    #[test]
    fn count_runs_from_the_anchor_not_the_window() {
        let mut event = standup();
        event.recurrence = Some(Recurrence::new(RecurrencePattern::daily().with_count(5)));
        assert!(expand_event(&event, &Utc, &TimeWindow::day("2025-03-22".parse().unwrap())).is_empty());
        assert_eq!(
            expand_event(&event, &Utc, &TimeWindow::day("2025-03-21".parse().unwrap())).len(),
            1
        );

        let mut weekly = standup();
        weekly.recurrence = Some(Recurrence::new(
            RecurrencePattern::weekly()
                .with_by_day([Weekday::Mon, Weekday::Thu])
                .with_count(8),
        ));
        // Eight occurrences run Mar 17 .. Apr 10
        let last_week = week_of("2025-04-07");
        let dates: Vec<_> = expand_event(&weekly, &Utc, &last_week)
            .iter()
            .map(|i| i.start.date().to_string())
            .collect();
        assert_eq!(dates, vec!["2025-04-07", "2025-04-10"]);
        assert!(expand_event(&weekly, &Utc, &week_of("2025-04-14")).is_empty());
    }

    #[test]
    fn override_replaces_the_generated_instance() {
        let mut master = standup();
        master.recurrence = Some(Recurrence::new(RecurrencePattern::daily()));
        let mut moved = CalendarEvent::new(
            "standup",
            "Standup (moved)",
            at("2025-03-20T14:00"),
            Some(at("2025-03-20T14:15")),
        );
        moved.recurrence_id = Some(at("2025-03-20T09:00"));

        let events = vec![master, moved];
        let expanded = expand_events(&events, &Utc, &TimeWindow::day("2025-03-20".parse().unwrap()));
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].title, "Standup (moved)");
        assert_eq!(expanded[0].start, at("2025-03-20T14:00"));
        assert_eq!(expanded[0].id, "standup_20250320T090000");

        let next_day = expand_events(&events, &Utc, &TimeWindow::day("2025-03-21".parse().unwrap()));
        assert_eq!(next_day.len(), 1);
        assert_eq!(next_day[0].title, "Standup");
    }

    #[test]
    fn overrides_of_one_series_keep_distinct_ids() {
        let mut master = standup();
        master.recurrence = Some(Recurrence::new(RecurrencePattern::daily()));
        let mut first = CalendarEvent::new("standup", "Early", at("2025-03-20T08:00"), None);
        first.recurrence_id = Some(at("2025-03-20T09:00"));
        let mut second = CalendarEvent::new("standup", "Late", at("2025-03-20T16:00"), None);
        second.recurrence_id = Some(at("2025-03-21T09:00"));

        let events = vec![master, first, second];
        let expanded = expand_events(&events, &Utc, &TimeWindow::day("2025-03-20".parse().unwrap()));
        let ids: Vec<_> = expanded.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["standup_20250320T090000", "standup_20250321T090000"]);

        // The 21st lost its occurrence to the override moved onto the 20th
        let next_day = expand_events(&events, &Utc, &TimeWindow::day("2025-03-21".parse().unwrap()));
        assert!(next_day.is_empty());
    }
}
