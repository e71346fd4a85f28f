use anyhow::Result;
use calgrid_core::recurrence::{RecurrencePattern, describe_pattern};
use owo_colors::OwoColorize;

pub fn run(pattern: &RecurrencePattern) -> Result<()> {
    println!("{}", describe_pattern(pattern));
    println!("{}", pattern.to_string().dimmed());
    Ok(())
}
