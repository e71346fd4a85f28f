//! Bounded expansion of a pattern into occurrence dates.
//!
//! Expansion starts at the anchor (inclusive) and stops at the first of:
//! the pattern's COUNT, the first date past UNTIL, or the occurrence cap.
//! The cap defaults to [`DEFAULT_MAX_OCCURRENCES`] and can never exceed
//! [`MAX_OCCURRENCES_CEILING`], so expansion always terminates.
//! [`Occurrences::skip_before`] moves a series up to a view without spending
//! the cap on the occurrences it passes.
//!
//! Month and year steps are computed from the anchor by occurrence index and
//! clamped to the last day of the target month: a series anchored on Jan 31
//! yields Feb 28 (or 29), Mar 31, Apr 30, and so on, without drifting.

use std::iter::FusedIterator;

use chrono::{
    DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday,
};
use tracing::{debug, warn};

use super::pattern::{Frequency, RecurrencePattern};

pub const DEFAULT_MAX_OCCURRENCES: usize = 100;

/// Hard ceiling applied regardless of the requested cap.
pub const MAX_OCCURRENCES_CEILING: usize = 1000;

/// How far a weekly BYDAY scan looks before giving up.
const WEEKLY_SCAN_DAYS: u64 = 7;

/// Occurrence cap for a requested maximum.
pub fn occurrence_cap(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_MAX_OCCURRENCES)
        .min(MAX_OCCURRENCES_CEILING)
}

/// Expand `pattern` from `anchor` into an ordered list of occurrences.
pub fn expand_occurrences<Tz: TimeZone>(
    anchor: &DateTime<Tz>,
    pattern: &RecurrencePattern,
    max_occurrences: Option<usize>,
) -> Vec<DateTime<Tz>> {
    Occurrences::new(anchor, pattern, max_occurrences).collect()
}

/// Lazy occurrence sequence. Restartable: create a new one to start over.
///
/// Stepping happens on the anchor's wall-clock time; each step is resolved back
/// into the anchor's timezone (a time in a DST gap moves forward an hour).
pub struct Occurrences<'a, Tz: TimeZone> {
    pattern: &'a RecurrencePattern,
    tz: Tz,
    anchor: NaiveDateTime,
    next: Option<NaiveDateTime>,
    index: u32,
    remaining: usize,
    count_left: Option<u64>,
}

impl<'a, Tz: TimeZone> Occurrences<'a, Tz> {
    pub fn new(
        anchor: &DateTime<Tz>,
        pattern: &'a RecurrencePattern,
        max_occurrences: Option<usize>,
    ) -> Self {
        let cap = occurrence_cap(max_occurrences);
        if !pattern.is_bounded() {
            debug!(rule = %pattern, cap, "unbounded pattern, expansion capped");
        }
        let start = anchor.naive_local();

        Occurrences {
            pattern,
            tz: anchor.timezone(),
            anchor: start,
            next: Some(start),
            index: 0,
            remaining: cap,
            count_left: pattern.count.map(u64::from),
        }
    }

    /// Skip the occurrences that start before `target`.
    ///
    /// Skipped occurrences still count toward COUNT but not toward the cap,
    /// so a long-running series can be viewed far from its anchor. Index-based
    /// frequencies jump straight to `target`; a weekly BYDAY series jumps by
    /// whole weeks. Meant for a fresh iterator.
    pub fn skip_before(mut self, target: NaiveDateTime) -> Self {
        if self.index == 0 {
            self.jump_toward(target);
        }
        while let Some(current) = self.next {
            if current >= target {
                break;
            }
            if !self.spend_count(1) {
                self.next = None;
                break;
            }
            let Some(index) = self.index.checked_add(1) else {
                self.next = None;
                break;
            };
            self.index = index;
            self.next = self.advance(current, index);
        }
        self
    }

    /// Move close to (never past) `target` without stepping through every occurrence.
    fn jump_toward(&mut self, target: NaiveDateTime) {
        let pattern = self.pattern;
        let step = i64::from(pattern.step());
        let days = (target.date() - self.anchor.date()).num_days();

        if let (Frequency::Weekly, Some(weekdays)) = (pattern.frequency, pattern.weekly_days()) {
            // After the anchor, every week holds one occurrence per distinct weekday.
            let weeks = days / 7 - 1;
            let Ok(weeks) = u64::try_from(weeks) else {
                return;
            };
            if weeks == 0 {
                return;
            }
            let mut distinct = weekdays.to_vec();
            distinct.sort_by_key(|day| day.num_days_from_monday());
            distinct.dedup();
            let skipped = weeks.saturating_mul(distinct.len() as u64).saturating_add(1);
            let Some(index) = u32::try_from(skipped).ok() else {
                return;
            };
            let Some(week_start) = self.anchor.checked_add_days(Days::new(weeks * 7)) else {
                return;
            };
            if !self.spend_count(skipped) {
                self.next = None;
                return;
            }
            self.index = index;
            self.next = next_matching_weekday(week_start, weekdays);
            return;
        }

        let periods = match pattern.frequency {
            Frequency::Daily => days / step,
            Frequency::Weekly => days / (7 * step),
            Frequency::Monthly => {
                let months = i64::from(target.year() - self.anchor.year()) * 12
                    + i64::from(target.month()) - i64::from(self.anchor.month());
                months / step
            }
            Frequency::Yearly => i64::from(target.year() - self.anchor.year()) / step,
        };
        // One period short, so clamping can never carry us past `target`.
        let Some(index) = u32::try_from(periods - 1).ok().filter(|index| *index > 0) else {
            return;
        };
        if !self.spend_count(u64::from(index)) {
            self.next = None;
            return;
        }
        self.index = index;
        self.next = self.advance(self.anchor, index);
    }

    /// Use up `n` occurrences of COUNT. False once nothing is left after them.
    fn spend_count(&mut self, n: u64) -> bool {
        match &mut self.count_left {
            Some(left) if *left <= n => {
                *left = 0;
                false
            }
            Some(left) => {
                *left -= n;
                true
            }
            None => true,
        }
    }

    fn resolve(&self, local: NaiveDateTime) -> Option<DateTime<Tz>> {
        self.tz
            .from_local_datetime(&local)
            .earliest()
            .or_else(|| self.tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
    }

    /// Occurrence number `index` (the anchor is 0), given the previous one.
    fn advance(&self, previous: NaiveDateTime, index: u32) -> Option<NaiveDateTime> {
        let pattern = self.pattern;
        let step = pattern.step();

        match pattern.frequency {
            Frequency::Daily => {
                let days = u64::from(index) * u64::from(step);
                self.anchor.checked_add_days(Days::new(days))
            }
            Frequency::Weekly => match pattern.weekly_days() {
                Some(days) => next_matching_weekday(previous, days).or_else(|| {
                    warn!(rule = %pattern, "BYDAY never matched within a week, ending series");
                    None
                }),
                None => {
                    let days = 7 * u64::from(index) * u64::from(step);
                    self.anchor.checked_add_days(Days::new(days))
                }
            },
            Frequency::Monthly => {
                let months = index.checked_mul(step)?;
                let target =
                    first_of_month(self.anchor.date()).checked_add_months(Months::new(months))?;
                let day = pattern.month_day().unwrap_or(self.anchor.day());
                clamped(target.year(), target.month(), day).map(|d| d.and_time(self.anchor.time()))
            }
            Frequency::Yearly => {
                let years = i32::try_from(index.checked_mul(step)?).ok()?;
                let year = self.anchor.year().checked_add(years)?;
                let month = pattern.month().unwrap_or(self.anchor.month());
                let day = pattern.month_day().unwrap_or(self.anchor.day());
                clamped(year, month, day).map(|d| d.and_time(self.anchor.time()))
            }
        }
    }
}

impl<Tz: TimeZone> Iterator for Occurrences<'_, Tz> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 || self.count_left == Some(0) {
            self.next = None;
            return None;
        }
        let current = self.next.take()?;
        let resolved = self.resolve(current)?;

        if self
            .pattern
            .until
            .is_some_and(|until| resolved.with_timezone(&Utc) > until)
        {
            return None;
        }

        self.remaining -= 1;
        if let Some(left) = &mut self.count_left {
            *left -= 1;
        }
        self.index = self.index.checked_add(1)?;
        self.next = self.advance(current, self.index);
        Some(resolved)
    }
}

impl<Tz: TimeZone> FusedIterator for Occurrences<'_, Tz> {}

/// Scan forward one day at a time for a weekday in `days`.
fn next_matching_weekday(from: NaiveDateTime, days: &[Weekday]) -> Option<NaiveDateTime> {
    (1..=WEEKLY_SCAN_DAYS)
        .filter_map(|offset| from.checked_add_days(Days::new(offset)))
        .find(|candidate| days.contains(&candidate.weekday()))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// `year-month-day`, with the day clamped to the month's last valid day.
fn clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last_day = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day());
    first.with_day(day.clamp(1, last_day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveTime};

    fn anchor(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 9, 0, 0).unwrap()
    }

    fn dates(occurrences: &[DateTime<Utc>]) -> Vec<String> {
        occurrences
            .iter()
            .map(|o| o.format("%Y-%m-%d").to_string())
            .collect()
    }

    #[test]
    fn weekly_by_day_count_bounded() {
        // 2025-03-17 is a Monday
        let pattern = RecurrencePattern::new(Frequency::Weekly)
            .with_by_day([Weekday::Mon, Weekday::Wed, Weekday::Fri])
            .with_count(6);
        let result = expand_occurrences(&anchor(2025, 3, 17), &pattern, None);
        assert_eq!(
            dates(&result),
            vec![
                "2025-03-17",
                "2025-03-19",
                "2025-03-21",
                "2025-03-24",
                "2025-03-26",
                "2025-03-28"
            ]
        );
        assert!(result.iter().all(|o| o.time() == NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    }

    #[test]
    fn daily_interval_steps() {
        let pattern = RecurrencePattern::new(Frequency::Daily).with_interval(3);
        let result = expand_occurrences(&anchor(2025, 2, 26), &pattern, Some(3));
        assert_eq!(dates(&result), vec!["2025-02-26", "2025-03-01", "2025-03-04"]);
    }

    #[test]
    fn weekly_without_by_day_uses_interval() {
        let pattern = RecurrencePattern::new(Frequency::Weekly).with_interval(2).with_count(3);
        let result = expand_occurrences(&anchor(2025, 3, 17), &pattern, None);
        assert_eq!(dates(&result), vec!["2025-03-17", "2025-03-31", "2025-04-14"]);
    }

    #[test]
    fn monthly_on_31st_clamps_to_month_end() {
        let pattern = RecurrencePattern::new(Frequency::Monthly).with_by_month_day([31]);
        let result = expand_occurrences(&anchor(2025, 1, 31), &pattern, Some(12));
        assert_eq!(result.len(), 12);
        assert_eq!(
            dates(&result[..5]),
            vec!["2025-01-31", "2025-02-28", "2025-03-31", "2025-04-30", "2025-05-31"]
        );
    }

    #[test]
    fn monthly_same_day_does_not_drift_after_short_month() {
        let pattern = RecurrencePattern::new(Frequency::Monthly).with_count(4);
        let result = expand_occurrences(&anchor(2024, 1, 31), &pattern, None);
        assert_eq!(
            dates(&result),
            vec!["2024-01-31", "2024-02-29", "2024-03-31", "2024-04-30"]
        );
    }

    #[test]
    fn monthly_by_month_day_uses_first_value_only() {
        let pattern = RecurrencePattern::new(Frequency::Monthly)
            .with_by_month_day([15, 1])
            .with_count(3);
        let result = expand_occurrences(&anchor(2025, 1, 10), &pattern, None);
        assert_eq!(dates(&result), vec!["2025-01-10", "2025-02-15", "2025-03-15"]);
    }

    #[test]
    fn yearly_leap_day_clamps_and_returns() {
        let pattern = RecurrencePattern::new(Frequency::Yearly).with_count(5);
        let result = expand_occurrences(&anchor(2024, 2, 29), &pattern, None);
        assert_eq!(
            dates(&result),
            vec!["2024-02-29", "2025-02-28", "2026-02-28", "2027-02-28", "2028-02-29"]
        );
    }

    #[test]
    fn yearly_by_month_and_month_day() {
        let pattern = RecurrencePattern::new(Frequency::Yearly)
            .with_by_month([3])
            .with_by_month_day([20])
            .with_interval(2)
            .with_count(3);
        let result = expand_occurrences(&anchor(2025, 1, 5), &pattern, None);
        assert_eq!(dates(&result), vec!["2025-01-05", "2027-03-20", "2029-03-20"]);
    }

    #[test]
    fn until_is_inclusive() {
        let until = Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap();
        let pattern = RecurrencePattern::new(Frequency::Daily).with_until(until);
        let result = expand_occurrences(&anchor(2025, 3, 17), &pattern, None);
        assert_eq!(result.len(), 4);
        assert_eq!(result.last(), Some(&until));
    }

    #[test]
    fn first_bound_wins() {
        let until = Utc.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap();
        let by_count = RecurrencePattern::new(Frequency::Daily).with_count(3).with_until(until);
        assert_eq!(expand_occurrences(&anchor(2025, 3, 17), &by_count, None).len(), 3);

        let by_until = RecurrencePattern::new(Frequency::Daily).with_count(30).with_until(until);
        assert_eq!(expand_occurrences(&anchor(2025, 3, 17), &by_until, None).len(), 14);
    }

    #[test]
    fn anchor_after_until_yields_nothing() {
        let until = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let pattern = RecurrencePattern::new(Frequency::Daily).with_until(until);
        assert!(expand_occurrences(&anchor(2025, 3, 17), &pattern, None).is_empty());
    }

    #[test_log::test]
    fn caps_are_enforced() {
        let unbounded = RecurrencePattern::new(Frequency::Daily);
        assert_eq!(expand_occurrences(&anchor(2025, 1, 1), &unbounded, None).len(), 100);
        assert_eq!(expand_occurrences(&anchor(2025, 1, 1), &unbounded, Some(5)).len(), 5);
        assert_eq!(
            expand_occurrences(&anchor(2025, 1, 1), &unbounded, Some(50_000)).len(),
            MAX_OCCURRENCES_CEILING
        );

        let counted = RecurrencePattern::new(Frequency::Daily).with_count(5_000);
        assert_eq!(
            expand_occurrences(&anchor(2025, 1, 1), &counted, Some(usize::MAX)).len(),
            MAX_OCCURRENCES_CEILING
        );

        let zero = RecurrencePattern::new(Frequency::Daily).with_count(0);
        assert!(expand_occurrences(&anchor(2025, 1, 1), &zero, None).is_empty());
    }

    #[test]
    fn occurrences_are_monotonic() {
        let patterns = [
            RecurrencePattern::new(Frequency::Weekly).with_by_day([Weekday::Sun, Weekday::Thu]),
            RecurrencePattern::new(Frequency::Monthly).with_by_month_day([1]),
            RecurrencePattern::new(Frequency::Yearly).with_by_month([1]),
            RecurrencePattern::new(Frequency::Daily).with_interval(5),
        ];
        for pattern in &patterns {
            let result = expand_occurrences(&anchor(2025, 5, 31), pattern, Some(200));
            assert!(
                result.windows(2).all(|pair| pair[0] <= pair[1]),
                "occurrences out of order for {pattern}"
            );
        }
    }

    #[test]
    fn keeps_anchor_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let start = tz.with_ymd_and_hms(2025, 3, 17, 23, 30, 0).unwrap();
        let pattern = RecurrencePattern::new(Frequency::Daily).with_count(2);
        let result = expand_occurrences(&start, &pattern, None);
        assert_eq!(result[1], tz.with_ymd_and_hms(2025, 3, 18, 23, 30, 0).unwrap());
    }

    #[test]
    fn until_compares_in_utc() {
        // 23:30 at +02:00 is 21:30 UTC, inside an until of 22:00 UTC
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let start = tz.with_ymd_and_hms(2025, 3, 17, 23, 30, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2025, 3, 18, 22, 0, 0).unwrap();
        let pattern = RecurrencePattern::new(Frequency::Daily).with_until(until);
        assert_eq!(expand_occurrences(&start, &pattern, None).len(), 2);
    }

    #[test]
    fn iterator_is_restartable_and_lazy() {
        let pattern = RecurrencePattern::new(Frequency::Daily);
        let start = anchor(2025, 1, 1);
        let first: Vec<_> = Occurrences::new(&start, &pattern, None).take(3).collect();
        let again: Vec<_> = Occurrences::new(&start, &pattern, None).take(3).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn weekly_scan_finds_next_weekday() {
        let from = anchor(2025, 3, 21).naive_utc(); // Friday
        let next = next_matching_weekday(from, &[Weekday::Fri]).unwrap();
        assert_eq!(next.date(), NaiveDate::from_ymd_opt(2025, 3, 28).unwrap());
        assert_eq!(next_matching_weekday(from, &[]), None);
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_time(NaiveTime::MIN)
    }

    #[test]
    fn skipped_occurrences_do_not_spend_the_cap() {
        let pattern = RecurrencePattern::new(Frequency::Daily);
        let result: Vec<_> = Occurrences::new(&anchor(2000, 1, 1), &pattern, Some(3))
            .skip_before(midnight(2025, 3, 20))
            .collect();
        assert_eq!(dates(&result), vec!["2025-03-20", "2025-03-21", "2025-03-22"]);
    }

    #[test]
    fn skip_before_matches_stepping_from_the_anchor() {
        let patterns = [
            RecurrencePattern::new(Frequency::Daily).with_interval(3),
            RecurrencePattern::new(Frequency::Weekly).with_interval(2),
            RecurrencePattern::new(Frequency::Weekly).with_by_day([Weekday::Tue, Weekday::Sat]),
            RecurrencePattern::new(Frequency::Monthly).with_by_month_day([31]),
            RecurrencePattern::new(Frequency::Yearly).with_by_month([2]).with_by_month_day([29]),
        ];
        let target = midnight(2026, 6, 1);
        for pattern in &patterns {
            let start = anchor(2024, 1, 31);
            let stepped: Vec<_> = Occurrences::new(&start, pattern, Some(MAX_OCCURRENCES_CEILING))
                .skip_while(|o| o.naive_utc() < target)
                .take(5)
                .collect();
            let skipped: Vec<_> = Occurrences::new(&start, pattern, Some(5))
                .skip_before(target)
                .collect();
            assert_eq!(skipped, stepped, "skip_before diverged for {pattern}");
        }
    }

    #[test]
    fn skipped_occurrences_still_count() {
        let pattern = RecurrencePattern::new(Frequency::Monthly).with_count(12);
        let result: Vec<_> = Occurrences::new(&anchor(2025, 1, 15), &pattern, None)
            .skip_before(midnight(2025, 11, 1))
            .collect();
        assert_eq!(dates(&result), vec!["2025-11-15", "2025-12-15"]);

        let spent: Vec<_> = Occurrences::new(&anchor(2025, 1, 15), &pattern, None)
            .skip_before(midnight(2026, 1, 1))
            .collect();
        assert!(spent.is_empty());
    }

    #[test]
    fn skip_before_the_anchor_changes_nothing() {
        let pattern = RecurrencePattern::new(Frequency::Daily).with_count(2);
        let result: Vec<_> = Occurrences::new(&anchor(2025, 3, 17), &pattern, None)
            .skip_before(midnight(2020, 1, 1))
            .collect();
        assert_eq!(dates(&result), vec!["2025-03-17", "2025-03-18"]);
    }
}
