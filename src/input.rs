//! Loading events from `.ics` and `.json` files.

use std::path::Path;

use anyhow::{Context, Result, bail};
use calgrid_core::event::CalendarEvent;
use calgrid_core::ics;
use chrono::TimeZone;

/// Read events from `path`, picking the format from the file extension.
///
/// ICS times are converted into `tz`; JSON times are taken as wall-clock times
/// already in `tz`.
pub fn load_events<Tz: TimeZone>(path: &Path, tz: &Tz) -> Result<Vec<CalendarEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    let events: Vec<CalendarEvent> = match extension.as_deref() {
        Some("ics") => ics::parse_events(&content, tz)
            .with_context(|| format!("Failed to import {}", path.display()))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse events in {}", path.display()))?,
        _ => bail!(
            "Unsupported events file '{}'. Expected a .ics or .json file",
            path.display()
        ),
    };

    tracing::debug!(
        path = %path.display(),
        count = events.len(),
        recurring = events.iter().filter(|e| e.is_recurring()).count(),
        "loaded events"
    );
    Ok(events)
}
