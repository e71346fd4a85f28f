pub mod config;
pub mod day;
pub mod describe;
pub mod expand;
pub mod month;

use anyhow::{Result, bail};
use calgrid_core::recurrence::{Preset, RULE_PREFIX, RecurrencePattern};

/// Pick the pattern from a rule string or a preset name.
///
/// The `RRULE:` prefix is optional on the command line.
pub fn resolve_pattern(rule: Option<&str>, preset: Option<Preset>) -> Result<RecurrencePattern> {
    match (rule, preset) {
        (_, Some(preset)) => Ok(preset.pattern()),
        (Some(rule), None) => {
            let rule = rule.trim();
            let has_prefix = rule
                .get(..RULE_PREFIX.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(RULE_PREFIX));
            let rule = if has_prefix {
                rule.to_string()
            } else {
                format!("{RULE_PREFIX}{rule}")
            };
            Ok(rule.parse()?)
        }
        (None, None) => bail!("Provide a rule string or --preset"),
    }
}
