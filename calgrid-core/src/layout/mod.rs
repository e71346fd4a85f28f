//! Overlap layout engine.
//!
//! `compute_layout` turns the timed events of a window into one `EventLayout`
//! per event: a column, the width of its overlap group, and whether it nests
//! inside another event. `EventLayout::placement` applies the rendering policy
//! on top of that. Month views skip column math entirely and use `month_cell`.

mod color;
mod month;
mod overlap;

use std::collections::HashMap;

use serde::Serialize;

use crate::event::CalendarEvent;

pub use color::{DEFAULT_PALETTE_SIZE, palette_index};
pub use month::{DEFAULT_MAX_VISIBLE, MonthCell, month_cell, month_cells, month_grid};
pub use overlap::compute_layout;

/// Default left inset, in percent, for contained events.
pub const DEFAULT_CONTAINED_INSET: f64 = 10.0;

/// Deepest inset a nested event can reach, in percent.
const MAX_INSET: f64 = 50.0;

/// Layouts keyed by event id.
pub type LayoutMap = HashMap<String, EventLayout>;

/// Where one event sits in its window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLayout {
    /// Zero-based column
    pub column: usize,
    /// Columns in this event's overlap group
    pub total_columns: usize,
    /// Fully covered by a different event
    pub is_contained: bool,
    /// Id of the tightest event containing this one
    pub container: Option<String>,
    /// Containment nesting level (0 when not contained)
    pub depth: usize,
    /// Has at least one event nested directly inside it
    pub is_container: bool,
    /// Paint order; higher draws on top
    pub z_index: usize,
}

/// Horizontal geometry in percent of the column's width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub left: f64,
    pub width: f64,
}

impl EventLayout {
    /// Rendering geometry for this layout.
    ///
    /// - Contained events are inset by `inset` percent per nesting level
    ///   (capped at 50%) instead of using column math.
    /// - Containers render full width.
    /// - Other events split the width evenly across their group.
    pub fn placement(&self, inset: f64) -> Placement {
        if self.is_contained {
            let left = (inset * self.depth as f64).clamp(0.0, MAX_INSET);
            return Placement {
                left,
                width: 100.0 - left,
            };
        }
        if self.is_container {
            return Placement {
                left: 0.0,
                width: 100.0,
            };
        }
        let width = 100.0 / self.total_columns.max(1) as f64;
        Placement {
            left: self.column as f64 * width,
            width,
        }
    }
}

/// Split events into the all-day row and the timed grid, keeping order.
pub fn partition_all_day(events: &[CalendarEvent]) -> (Vec<&CalendarEvent>, Vec<&CalendarEvent>) {
    events.iter().partition(|event| event.is_all_day())
}
