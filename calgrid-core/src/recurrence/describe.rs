//! Human-readable pattern descriptions.

use std::fmt::Write;

use super::pattern::{RecurrencePattern, weekday_name};

/// Describe a pattern, e.g. "Every week on Monday, Friday, 6 times" or
/// "Every 2 months on day 15, until Jun 30, 2025".
pub fn describe_pattern(pattern: &RecurrencePattern) -> String {
    let unit = pattern.frequency.unit();
    let mut text = match pattern.step() {
        1 => format!("Every {unit}"),
        n => format!("Every {n} {unit}s"),
    };

    if let Some(days) = pattern.weekly_days() {
        let names: Vec<_> = days.iter().map(|d| weekday_name(*d)).collect();
        let _ = write!(text, " on {}", names.join(", "));
    }
    if let Some(name) = pattern.month().and_then(month_name) {
        let _ = write!(text, " in {name}");
    }
    if let Some(day) = pattern.month_day() {
        let _ = write!(text, " on day {day}");
    }

    match (pattern.count, pattern.until) {
        (Some(1), _) => text.push_str(", once"),
        (Some(count), _) => {
            let _ = write!(text, ", {count} times");
        }
        (None, Some(until)) => {
            let _ = write!(text, ", until {}", until.format("%b %-d, %Y"));
        }
        (None, None) => {}
    }

    text
}

fn month_name(month: u32) -> Option<&'static str> {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES.get(usize::try_from(month).ok()?.checked_sub(1)?).copied()
}
