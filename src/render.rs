//! Terminal rendering for calgrid views.
//!
//! Colors come from the event's palette index, so an event keeps its color
//! across the day and month views and between runs.

use calgrid_core::event::{CalendarEvent, EventTime};
use calgrid_core::layout::{Placement, palette_index};
use chrono::NaiveDateTime;
use owo_colors::{AnsiColors, OwoColorize};

/// Terminal colors indexed by palette slot (wraps for larger palettes).
const PALETTE: [AnsiColors; 12] = [
    AnsiColors::Blue,
    AnsiColors::Green,
    AnsiColors::Magenta,
    AnsiColors::Cyan,
    AnsiColors::Yellow,
    AnsiColors::Red,
    AnsiColors::BrightBlue,
    AnsiColors::BrightGreen,
    AnsiColors::BrightMagenta,
    AnsiColors::BrightCyan,
    AnsiColors::BrightYellow,
    AnsiColors::BrightRed,
];

/// Width of a placement bar, in characters.
pub const BAR_WIDTH: usize = 40;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventTime {
    fn render(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%a %b %-d, %Y").to_string(),
            EventTime::DateTime(dt) => dt.format("%a %b %-d, %Y %H:%M").to_string(),
        }
    }
}

impl Render for CalendarEvent {
    fn render(&self) -> String {
        let time = if self.is_all_day() {
            "all-day".to_string()
        } else {
            time_range(self.start.naive(), self.effective_end())
        };
        format!("{} {}", self.title, time.dimmed())
    }
}

/// Paint `text` in the palette color of event `id`.
pub fn paint(text: &str, id: &str, palette_size: usize) -> String {
    let color = PALETTE[palette_index(id, palette_size) % PALETTE.len()];
    text.color(color).to_string()
}

/// "09:00-10:30"
pub fn time_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

/// Draw a placement as a bar inside `|...|`, e.g. `|    ██████████      |`.
pub fn placement_bar(placement: &Placement, width: usize) -> String {
    let width = width.max(1);
    let scale = |percent: f64| (percent / 100.0 * width as f64).round() as usize;
    let left = scale(placement.left).min(width.saturating_sub(1));
    let filled = scale(placement.width).clamp(1, width - left);
    let right = width - left - filled;
    format!("|{}{}{}|", " ".repeat(left), "█".repeat(filled), " ".repeat(right))
}

/// Cut `text` to `width` characters (marking the cut with `…`), then pad it.
pub fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return format!("{text}{}", " ".repeat(width - count));
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
