use std::collections::BTreeSet;

use anyhow::{Context, Result};
use calgrid_core::config::Settings;
use calgrid_core::event::EventTime;
use calgrid_core::recurrence::{
    RecurrencePattern, describe_pattern, exception_key, expand_occurrences, is_excepted,
};
use calgrid_core::window::parse_date;
use chrono::{DateTime, TimeZone};
use owo_colors::OwoColorize;

use crate::render::{Render, pluralize};

pub fn run(
    settings: &Settings,
    pattern: &RecurrencePattern,
    start: &str,
    max: Option<usize>,
    exdates: &[String],
) -> Result<()> {
    let tz = settings.timezone()?;
    let start: EventTime = start
        .parse()
        .with_context(|| format!("Invalid start '{start}'"))?;
    let anchor = tz
        .from_local_datetime(&start.naive())
        .earliest()
        .with_context(|| format!("{start} does not exist in {}", settings.timezone))?;

    let exceptions = exdates
        .iter()
        .map(|date| parse_date(date).map(|d| exception_key(&d)))
        .collect::<Result<BTreeSet<_>, _>>()?;
    let max = max.unwrap_or(settings.recurrence.default_max_occurrences);

    let occurrences = occurrences(&anchor, pattern, max, &exceptions);

    println!("{} {}", describe_pattern(pattern).bold(), pattern.to_string().dimmed());
    for (i, occurrence) in occurrences.iter().enumerate() {
        let time = if start.is_date() {
            EventTime::Date(occurrence.date_naive())
        } else {
            EventTime::DateTime(occurrence.naive_local())
        };
        println!("  {:>4}  {}", (i + 1).dimmed(), time.render());
    }
    println!(
        "{}",
        format!("{} {}", occurrences.len(), pluralize("occurrence", occurrences.len())).dimmed()
    );

    Ok(())
}

/// Occurrences from `anchor`, minus the excepted dates.
///
/// Excepted occurrences still count against COUNT and `max`.
fn occurrences<Tz: TimeZone>(
    anchor: &DateTime<Tz>,
    pattern: &RecurrencePattern,
    max: usize,
    exceptions: &BTreeSet<String>,
) -> Vec<DateTime<Tz>> {
    expand_occurrences(anchor, pattern, Some(max))
        .into_iter()
        .filter(|occurrence| !is_excepted(&occurrence.naive_local(), exceptions))
        .collect()
}
