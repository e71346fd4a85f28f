//! Recurrence engine.
//!
//! Patterns (`RecurrencePattern`) round-trip through RRULE strings
//! (`serialize_rule` / `parse_rule`), expand into bounded occurrence sequences
//! (`expand_occurrences`), and materialize recurring events into instances for
//! a window (`expand_events`). Everything here is pure and deterministic given
//! the pattern, the anchor and the bound.

mod describe;
mod exceptions;
mod expand;
pub mod instances;
mod pattern;
mod presets;
mod rule;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub use describe::describe_pattern;
pub use exceptions::{exception_key, is_excepted};
pub use expand::{
    DEFAULT_MAX_OCCURRENCES, MAX_OCCURRENCES_CEILING, Occurrences, expand_occurrences,
    occurrence_cap,
};
pub use instances::{expand_event, expand_events};
pub use pattern::{Frequency, RecurrencePattern, parse_weekday_code, weekday_code, weekday_name};
pub use presets::Preset;
pub use rule::{RULE_PREFIX, parse_rule, serialize_rule};

/// Recurrence attached to a master event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// Serialized as its RRULE string
    pub pattern: RecurrencePattern,
    /// Excluded occurrence dates (`YYYY-MM-DD`)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exceptions: BTreeSet<String>,
}

impl Recurrence {
    pub fn new(pattern: RecurrencePattern) -> Self {
        Recurrence {
            pattern,
            exceptions: BTreeSet::new(),
        }
    }

    pub fn with_exceptions<I, S>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exceptions.extend(dates.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::event::CalendarEvent;

    #[test]
    fn recurring_event_json() {
        let json = r#"{
            "id": "42",
            "title": "Team sync",
            "start": "2025-03-17T10:00:00",
            "end": "2025-03-17T10:30:00",
            "recurrence": {
                "pattern": "RRULE:FREQ=WEEKLY;BYDAY=MO,TH",
                "exceptions": ["2025-03-20"]
            }
        }"#;
        let event: CalendarEvent = serde_json::from_str(json).expect("Should parse");
        let recurrence = event.recurrence.expect("Should have recurrence");
        assert_eq!(recurrence.pattern.by_day.len(), 2);
        assert!(recurrence.exceptions.contains("2025-03-20"));
    }

    #[test]
    fn invalid_rule_in_json_is_rejected() {
        let json = r#"{"id":"1","start":"2025-03-17","recurrence":{"pattern":"FREQ=DAILY"}}"#;
        assert!(serde_json::from_str::<CalendarEvent>(json).is_err());
    }
}
