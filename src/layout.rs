//! Display column assignment for temporally overlapping events.
//!
//! Classic greedy interval partitioning over half-open ranges: events are
//! swept in start order, finished events release their columns, and each
//! event takes the lowest free column. Every event also reports how many
//! columns its overlap cluster uses in total, so the renderer can size
//! columns uniformly within a cluster — clusters grow and shrink
//! independently across the day, so this is deliberately not the day-wide
//! maximum.
//!
//! The function is total: any finite event list is fine, including the
//! empty list and zero-duration events (which overlap nothing under
//! half-open semantics). O(n log n).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::types::Event;

/// Column placement for one event, aligned with the input slice by index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSlot {
    /// Zero-based display column.
    pub column: u32,
    /// Number of columns used by this event's overlap cluster.
    pub columns: u32,
}

/// Assign display columns to the given day's events.
///
/// No two events whose `[start, end)` ranges intersect share a column, and
/// the column count is minimal for the sweep order. Ties on start time keep
/// input order (stable sort), so the result is deterministic.
pub fn layout_day(events: &[Event]) -> Vec<EventSlot> {
    let mut slots = vec![EventSlot { column: 0, columns: 0 }; events.len()];
    if events.is_empty() {
        return slots;
    }

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&i| events[i].start_time);

    // Min-heap of (end, column) for events still occupying a column, and a
    // min-heap of released column indices.
    let mut active: BinaryHeap<Reverse<(i64, u32)>> = BinaryHeap::new();
    let mut free: BinaryHeap<Reverse<u32>> = BinaryHeap::new();

    let mut cluster: Vec<usize> = Vec::new();
    let mut cluster_columns: u32 = 0;

    for &idx in &order {
        let event = &events[idx];

        // Release columns of events that ended at or before this start —
        // touching endpoints do not overlap.
        while let Some(&Reverse((end, column))) = active.peek() {
            if end <= event.start_time {
                active.pop();
                free.push(Reverse(column));
            } else {
                break;
            }
        }

        // Active set drained: the previous overlap cluster is complete.
        // Back-fill its uniform column count and restart numbering.
        if active.is_empty() && !cluster.is_empty() {
            for &i in &cluster {
                slots[i].columns = cluster_columns;
            }
            cluster.clear();
            cluster_columns = 0;
            free.clear();
        }

        let column = match free.pop() {
            Some(Reverse(column)) => column,
            None => active.len() as u32,
        };
        slots[idx].column = column;
        cluster.push(idx);
        cluster_columns = cluster_columns.max(column + 1);
        active.push(Reverse((event.end_time, column)));
    }

    for &i in &cluster {
        slots[i].columns = cluster_columns;
    }

    slots
}
