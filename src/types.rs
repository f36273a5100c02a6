//! Core data types shared across the engine.
//!
//! All timestamps are epoch milliseconds UTC (`i64`), matching the provider
//! contract. Serialized forms use camelCase so the host UI layer can consume
//! the derived views directly.

use serde::{Deserialize, Serialize};

/// A calendar as surfaced by the provider, overlaid with the locally
/// persisted selection flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calendar {
    pub id: i64,
    pub display_name: String,
    /// Packed ARGB display color.
    pub color: u32,
    pub account_name: String,
    pub account_type: String,
    pub sync_events: bool,
    pub visible: bool,
    /// Local selection state, not a provider field. Defaults to selected.
    #[serde(default = "default_selected")]
    pub selected: bool,
}

fn default_selected() -> bool {
    true
}

/// One expanded occurrence of a calendar event, denormalized with its
/// calendar for display.
///
/// `instance_id` identifies this occurrence; `event_id` identifies the
/// underlying series and is shared by all occurrences of a recurring event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub instance_id: i64,
    pub event_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub all_day: bool,
    pub calendar: Calendar,
}

/// A reminder offset attached to an event series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Lead time before the event start, in minutes.
    pub minutes: i64,
}

/// Half-open query window `[start, end)` in epoch milliseconds.
///
/// Construction rejects empty and inverted ranges, so a held `TimeWindow`
/// is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start_millis: i64,
    end_millis: i64,
}

impl TimeWindow {
    pub fn new(start_millis: i64, end_millis: i64) -> Option<Self> {
        if end_millis <= start_millis {
            return None;
        }
        Some(Self {
            start_millis,
            end_millis,
        })
    }

    pub fn start_millis(&self) -> i64 {
        self.start_millis
    }

    pub fn end_millis(&self) -> i64 {
        self.end_millis
    }
}

/// What an armed alarm carries for the eventual notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub event_id: i64,
    pub instance_id: i64,
    pub title: String,
    pub location: Option<String>,
    pub start_time: i64,
    pub all_day: bool,
}

impl From<&Event> for NotificationPayload {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.event_id,
            instance_id: event.instance_id,
            title: event.title.clone(),
            location: event.location.clone(),
            start_time: event.start_time,
            all_day: event.all_day,
        }
    }
}
