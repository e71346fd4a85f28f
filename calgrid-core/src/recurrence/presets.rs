//! Named pattern constructors offered by event editors.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;

use super::pattern::{Frequency, RecurrencePattern};
use crate::error::{CalGridError, CalGridResult};

impl RecurrencePattern {
    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    /// Weekly on Monday through Friday.
    pub fn weekdays() -> Self {
        Self::new(Frequency::Weekly).with_by_day([
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
    }

    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    /// Every other week.
    pub fn biweekly() -> Self {
        Self::new(Frequency::Weekly).with_interval(2)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Daily,
    Weekdays,
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Daily,
        Preset::Weekdays,
        Preset::Weekly,
        Preset::Biweekly,
        Preset::Monthly,
        Preset::Yearly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Daily => "daily",
            Preset::Weekdays => "weekdays",
            Preset::Weekly => "weekly",
            Preset::Biweekly => "biweekly",
            Preset::Monthly => "monthly",
            Preset::Yearly => "yearly",
        }
    }

    pub fn pattern(&self) -> RecurrencePattern {
        match self {
            Preset::Daily => RecurrencePattern::daily(),
            Preset::Weekdays => RecurrencePattern::weekdays(),
            Preset::Weekly => RecurrencePattern::weekly(),
            Preset::Biweekly => RecurrencePattern::biweekly(),
            Preset::Monthly => RecurrencePattern::monthly(),
            Preset::Yearly => RecurrencePattern::yearly(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = CalGridError;

    fn from_str(s: &str) -> CalGridResult<Self> {
        let name = s.trim().to_ascii_lowercase();
        Preset::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| {
                let known: Vec<_> = Preset::ALL.iter().map(Preset::name).collect();
                CalGridError::InvalidRule(format!(
                    "unknown preset '{s}' (expected one of: {})",
                    known.join(", ")
                ))
            })
    }
}
