//! RRULE string encoding.
//!
//! The format is a subset of RFC 5545: an `RRULE:` prefix followed by
//! `;`-separated `KEY=value` pairs. Supported keys are FREQ, INTERVAL, COUNT,
//! UNTIL, BYDAY, BYMONTHDAY and BYMONTH; anything else is ignored on parse.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::pattern::{Frequency, RecurrencePattern, parse_weekday_code, weekday_code};
use crate::error::{CalGridError, CalGridResult};

pub const RULE_PREFIX: &str = "RRULE:";

/// UNTIL timestamps are written in UTC basic format.
const UNTIL_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Encode a pattern as an RRULE string.
///
/// FREQ always comes first, INTERVAL only when greater than one, then the
/// bounds, then BYDAY, BYMONTHDAY and BYMONTH when non-empty.
pub fn serialize_rule(pattern: &RecurrencePattern) -> String {
    let mut parts = vec![format!("FREQ={}", pattern.frequency)];

    if pattern.interval > 1 {
        parts.push(format!("INTERVAL={}", pattern.interval));
    }
    if let Some(count) = pattern.count {
        parts.push(format!("COUNT={count}"));
    }
    if let Some(until) = pattern.until {
        parts.push(format!("UNTIL={}", until.format(UNTIL_FORMAT)));
    }
    if !pattern.by_day.is_empty() {
        let codes: Vec<_> = pattern.by_day.iter().map(|d| weekday_code(*d)).collect();
        parts.push(format!("BYDAY={}", codes.join(",")));
    }
    if !pattern.by_month_day.is_empty() {
        parts.push(format!("BYMONTHDAY={}", join_numbers(&pattern.by_month_day)));
    }
    if !pattern.by_month.is_empty() {
        parts.push(format!("BYMONTH={}", join_numbers(&pattern.by_month)));
    }

    format!("{RULE_PREFIX}{}", parts.join(";"))
}

/// Decode an RRULE string.
///
/// Returns `None` when the prefix is missing or there is no supported FREQ.
/// Unknown keys and list items that don't parse are skipped.
pub fn parse_rule(rule: &str) -> Option<RecurrencePattern> {
    let rule = rule.trim();
    let prefix = rule.get(..RULE_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(RULE_PREFIX) {
        return None;
    }

    let mut frequency = None;
    let mut pattern = RecurrencePattern::new(Frequency::Daily);

    for pair in rule[RULE_PREFIX.len()..].split(';') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => frequency = value.parse::<Frequency>().ok(),
            "INTERVAL" => {
                if let Some(interval) = value.parse::<u32>().ok().filter(|n| *n > 0) {
                    pattern.interval = interval;
                }
            }
            "COUNT" => pattern.count = value.parse().ok(),
            "UNTIL" => pattern.until = parse_until(value),
            "BYDAY" => pattern.by_day = split_list(value, parse_weekday_code),
            "BYMONTHDAY" => pattern.by_month_day = split_list(value, |v| parse_in_range(v, 1, 31)),
            "BYMONTH" => pattern.by_month = split_list(value, |v| parse_in_range(v, 1, 12)),
            other => debug!(key = other, "ignoring unsupported RRULE key"),
        }
    }

    pattern.frequency = frequency?;
    Some(pattern)
}

/// UNTIL accepts UTC basic format, floating basic format (read as UTC), or a
/// bare date (the end of that day, UTC).
fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    if let Some(stamp) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc());
    }
    if value.contains('T') {
        return NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .ok()?
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
}

fn split_list<T>(value: &str, parse: impl Fn(&str) -> Option<T>) -> Vec<T> {
    value
        .split(',')
        .filter_map(|item| {
            let parsed = parse(item.trim());
            if parsed.is_none() {
                debug!(item, "ignoring unparseable RRULE list item");
            }
            parsed
        })
        .collect()
}

fn parse_in_range(value: &str, min: u32, max: u32) -> Option<u32> {
    value.parse().ok().filter(|n| (min..=max).contains(n))
}

fn join_numbers(values: &[u32]) -> String {
    values
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl fmt::Display for RecurrencePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_rule(self))
    }
}

impl FromStr for RecurrencePattern {
    type Err = CalGridError;

    fn from_str(s: &str) -> CalGridResult<Self> {
        parse_rule(s).ok_or_else(|| CalGridError::InvalidRule(s.to_string()))
    }
}

impl Serialize for RecurrencePattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&serialize_rule(self))
    }
}

impl<'de> Deserialize<'de> for RecurrencePattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rule = String::deserialize(deserializer)?;
        parse_rule(&rule).ok_or_else(|| serde::de::Error::custom(format!("invalid RRULE '{rule}'")))
    }
}
