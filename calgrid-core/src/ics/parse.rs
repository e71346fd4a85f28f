//! VEVENT parsing using the icalendar crate's parser.
//!
//! Times are converted into the wall-clock time of the view timezone so the
//! engines only ever see local times: UTC and TZID values are shifted, floating
//! values and dates are taken as-is.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::{debug, warn};

use crate::error::{CalGridError, CalGridResult};
use crate::event::{CalendarEvent, EventTime};
use crate::recurrence::{RULE_PREFIX, Recurrence, exception_key, parse_rule};

/// Parse every VEVENT in `content`, converting times into `tz`.
///
/// VEVENTs without a usable DTSTART are skipped with a warning; an unreadable
/// document is an error.
pub fn parse_events<Tz: TimeZone>(content: &str, tz: &Tz) -> CalGridResult<Vec<CalendarEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| CalGridError::IcsParse(e.to_string()))?;

    let events = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(|vevent| {
            let event = parse_vevent(vevent, tz);
            if event.is_none() {
                let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
                warn!(uid = ?uid, "skipping VEVENT without a usable DTSTART");
            }
            event
        })
        .collect();

    Ok(events)
}

fn parse_vevent<Tz: TimeZone>(vevent: &Component<'_>, tz: &Tz) -> Option<CalendarEvent> {
    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?, tz)?;

    let id = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let title = vevent
        .find_prop("SUMMARY")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(No title)".to_string());

    // DTEND wins over DURATION; with neither the engines apply their default
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(|dpt| to_event_time(dpt, tz))
        .or_else(|| {
            let duration = parse_duration(vevent.find_prop("DURATION")?.val.as_ref())?;
            Some(start.shifted(duration))
        });

    let recurrence = vevent.find_prop("RRULE").and_then(|p| {
        let rule = format!("{RULE_PREFIX}{}", p.val.as_ref());
        let pattern = parse_rule(&rule);
        if pattern.is_none() {
            warn!(%rule, "unsupported RRULE, importing as a single event");
        }
        pattern
    });
    let recurrence = recurrence.map(|pattern| {
        let exceptions: BTreeSet<String> = vevent
            .properties
            .iter()
            .filter(|p| p.name == "EXDATE")
            .flat_map(|p| parse_exdate_property(p, tz))
            .collect();
        Recurrence::new(pattern).with_exceptions(exceptions)
    });

    // Overrides share the master's UID; RECURRENCE-ID names the replaced occurrence
    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .and_then(|dpt| to_event_time(dpt, tz));

    let mut event = CalendarEvent::new(id, title, start, end);
    event.recurrence = recurrence;
    event.recurrence_id = recurrence_id;
    Some(event)
}

/// Convert icalendar's DatePerhapsTime to wall-clock time in `tz`.
fn to_event_time<Tz: TimeZone>(dpt: DatePerhapsTime, tz: &Tz) -> Option<EventTime> {
    match dpt {
        DatePerhapsTime::Date(d) => Some(EventTime::Date(d)),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Some(EventTime::DateTime(to_local(dt, tz))),
            CalendarDateTime::Floating(naive) => Some(EventTime::DateTime(naive)),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                zoned_to_local(date_time, &tzid, tz).map(EventTime::DateTime)
            }
        },
    }
}

fn to_local<Tz: TimeZone>(dt: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    dt.with_timezone(tz).naive_local()
}

/// Convert a time in zone `tzid` into `tz`; unknown zones are read as floating.
fn zoned_to_local<Tz: TimeZone>(
    date_time: NaiveDateTime,
    tzid: &str,
    tz: &Tz,
) -> Option<NaiveDateTime> {
    let Ok(zone) = tzid.parse::<chrono_tz::Tz>() else {
        debug!(tzid, "unknown TZID, treating time as floating");
        return Some(date_time);
    };
    let zoned = zone.from_local_datetime(&date_time).earliest()?;
    Some(to_local(zoned.with_timezone(&Utc), tz))
}

/// Parse an ISO-8601 DURATION value (`PT1H30M`, `P1D`, ...).
fn parse_duration(value: &str) -> Option<Duration> {
    let duration = iso8601::duration(value.trim_start_matches('+')).ok()?;
    let std_duration: std::time::Duration = duration.into();
    Duration::from_std(std_duration).ok()
}

/// Parse an EXDATE property into exception dates (local calendar days in `tz`).
///
/// Handles TZID and VALUE=DATE parameters, UTC and floating values, and
/// comma-separated lists.
fn parse_exdate_property<Tz: TimeZone>(prop: &Property<'_>, tz: &Tz) -> Vec<String> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            if is_date {
                return NaiveDate::parse_from_str(s, "%Y%m%d").ok().map(|d| exception_key(&d));
            }
            let local = if let Some(stamp) = s.strip_suffix('Z') {
                let dt = NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S").ok()?;
                to_local(dt.and_utc(), tz)
            } else {
                let dt = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
                match &tzid {
                    Some(zone) => zoned_to_local(dt, zone, tz)?,
                    None => dt,
                }
            };
            Some(exception_key(&local))
        })
        .collect()
}
