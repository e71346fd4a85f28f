//! Column assignment for overlapping timed events.

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use tracing::debug;

use super::{EventLayout, LayoutMap};
use crate::event::CalendarEvent;
use crate::window::TimeWindow;

/// An event clipped to the window, as the algorithm sees it.
struct Span<'a> {
    id: &'a str,
    /// Position in the caller's list, used as the final tie-breaker
    input: usize,
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Span<'_> {
    /// Strict overlap: touching spans and zero-length spans never overlap.
    fn overlaps(&self, other: &Span<'_>) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// `self` covers all of `other` and the two spans are not identical.
    fn contains(&self, other: &Span<'_>) -> bool {
        self.start <= other.start
            && self.end >= other.end
            && (self.start, self.end) != (other.start, other.end)
    }

    fn length(&self) -> chrono::Duration {
        self.end - self.start
    }
}

/// Compute a layout for every event that touches `window`.
///
/// Events are clipped to the window first, so multi-day events lay out by the
/// part that falls inside it. Events missing an end count as one hour long.
/// Input order does not matter. Inverted ranges are laid out without error,
/// though their placement is unspecified.
pub fn compute_layout<'a, I>(events: I, window: &TimeWindow) -> LayoutMap
where
    I: IntoIterator<Item = &'a CalendarEvent>,
{
    let mut spans: Vec<Span<'a>> = events
        .into_iter()
        .enumerate()
        .filter_map(|(input, event)| {
            let start = event.start.naive();
            let end = event.effective_end();
            if end < start {
                debug!(id = %event.id, %start, %end, "laying out event with inverted range");
            }
            if !window.intersects(start, end) {
                return None;
            }
            let (start, end) = window.clip(start, end);
            Some(Span {
                id: &event.id,
                input,
                start,
                end,
            })
        })
        .collect();

    // Start ascending, longer first on ties, so containers precede what they contain
    spans.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.input.cmp(&b.input))
    });

    let containers: Vec<Option<usize>> = (0..spans.len())
        .map(|i| immediate_container(&spans, i))
        .collect();
    let columns = assign_columns(&spans, &containers);
    let groups = overlap_groups(&spans);

    let mut group_width = vec![0usize; spans.len()];
    for (i, &group) in groups.iter().enumerate() {
        group_width[group] = group_width[group].max(columns[i] + 1);
    }

    let mut depth = vec![0usize; spans.len()];
    let mut is_container = vec![false; spans.len()];
    for i in 0..spans.len() {
        if let Some(container) = containers[i] {
            depth[i] = depth[container] + 1;
            is_container[container] = true;
        }
    }

    spans
        .iter()
        .enumerate()
        .map(|(i, span)| {
            let layout = EventLayout {
                column: columns[i],
                total_columns: group_width[groups[i]],
                is_contained: containers[i].is_some(),
                container: containers[i].map(|c| spans[c].id.to_string()),
                depth: depth[i],
                is_container: is_container[i],
                z_index: i,
            };
            (span.id.to_string(), layout)
        })
        .collect()
}

/// The tightest span containing span `i`, if any.
///
/// Containers always sort before what they contain, so only earlier spans are
/// candidates. Among equal-length containers the later one wins, which keeps
/// nesting one level below the deepest of them.
fn immediate_container(spans: &[Span<'_>], i: usize) -> Option<usize> {
    let target = &spans[i];
    (0..i)
        .filter(|&j| spans[j].contains(target))
        .min_by(|&a, &b| match spans[a].length().cmp(&spans[b].length()) {
            Ordering::Equal => b.cmp(&a),
            other => other,
        })
}

/// Contained spans sit one column right of their container; everything else
/// takes the leftmost column free of overlaps, opening a new one if needed.
fn assign_columns(spans: &[Span<'_>], containers: &[Option<usize>]) -> Vec<usize> {
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut assigned = vec![0usize; spans.len()];

    for (i, span) in spans.iter().enumerate() {
        let column = match containers[i] {
            Some(container) => assigned[container] + 1,
            None => members
                .iter()
                .position(|column| column.iter().all(|&m| !spans[m].overlaps(span)))
                .unwrap_or(members.len()),
        };
        if column >= members.len() {
            members.resize_with(column + 1, Vec::new);
        }
        members[column].push(i);
        assigned[i] = column;
    }

    assigned
}

/// Label each span with a representative of its overlap group: the connected
/// set of spans linked by strict overlap.
fn overlap_groups(spans: &[Span<'_>]) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..spans.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for i in 0..spans.len() {
        for j in (i + 1)..spans.len() {
            if spans[i].overlaps(&spans[j]) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, j));
                if a != b {
                    parent[b.max(a)] = a.min(b);
                }
            }
        }
    }

    (0..spans.len()).map(|i| find(&mut parent, i)).collect()
}
