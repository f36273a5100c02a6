//! Reactive repository merging provider data with local selection state and
//! a mutable time window.
//!
//! The derived views are always recomputed from scratch — the provider does
//! not expose fine-grained change information, so incremental diffing would
//! buy complexity without correctness. Recomputation is serialized through a
//! single async mutex; whichever recomputation finishes last wins, and
//! intermediate states are not guaranteed to be observed.
//!
//! Provider failures never propagate out of the refresh path: the views go
//! empty with a logged warning, because calendar absence must be
//! indistinguishable from "nothing there yet" at the UI layer.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::ProviderError;
use crate::provider::CalendarProvider;
use crate::selection::{self, SelectionStore};
use crate::types::{Calendar, Event, TimeWindow};

pub struct CalendarDataStore {
    provider: Arc<dyn CalendarProvider>,
    selection: Arc<dyn SelectionStore>,
    window: parking_lot::Mutex<TimeWindow>,
    /// Serializes recomputation. Guarantees last-write-wins on the derived
    /// views without any cooperative cancellation of in-flight passes.
    recompute: tokio::sync::Mutex<()>,
    calendars_tx: watch::Sender<Vec<Calendar>>,
    events_tx: watch::Sender<Vec<Event>>,
}

impl CalendarDataStore {
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        selection: Arc<dyn SelectionStore>,
        window: TimeWindow,
    ) -> Self {
        let (calendars_tx, _) = watch::channel(Vec::new());
        let (events_tx, _) = watch::channel(Vec::new());
        Self {
            provider,
            selection,
            window: parking_lot::Mutex::new(window),
            recompute: tokio::sync::Mutex::new(()),
            calendars_tx,
            events_tx,
        }
    }

    /// Subscribe to the derived calendar list. A fresh snapshot is published
    /// on every refresh.
    pub fn calendars(&self) -> watch::Receiver<Vec<Calendar>> {
        self.calendars_tx.subscribe()
    }

    /// Subscribe to the derived event list for the selected calendars and
    /// the current window.
    pub fn events(&self) -> watch::Receiver<Vec<Event>> {
        self.events_tx.subscribe()
    }

    pub fn current_calendars(&self) -> Vec<Calendar> {
        self.calendars_tx.borrow().clone()
    }

    pub fn current_events(&self) -> Vec<Event> {
        self.events_tx.borrow().clone()
    }

    pub fn window(&self) -> TimeWindow {
        *self.window.lock()
    }

    /// Re-pull calendars and events from the provider and publish fresh
    /// snapshots. Explicitly uncached; used after external change
    /// notifications and user-initiated refresh.
    pub async fn refresh(&self) {
        let _guard = self.recompute.lock().await;

        let calendars = match self.load_calendars().await {
            Ok(calendars) => calendars,
            Err(e) => {
                log::warn!("Refresh: calendar query failed: {}", e);
                Vec::new()
            }
        };

        let selected: Vec<i64> = calendars.iter().filter(|c| c.selected).map(|c| c.id).collect();
        let window = self.window();

        let events = if selected.is_empty() {
            Vec::new()
        } else {
            match self.load_events_for(&selected, window).await {
                Ok(events) => events,
                Err(e) => {
                    log::warn!("Refresh: event query failed: {}", e);
                    Vec::new()
                }
            }
        };

        self.calendars_tx.send_replace(calendars);
        self.events_tx.send_replace(events);
    }

    /// Persist a selection change and force a refresh so both derived views
    /// pick it up.
    ///
    /// The first explicit toggle materializes the implicit "all selected"
    /// default from a fresh provider query — from then on the stored set is
    /// authoritative. If that query fails the toggle is dropped: writing a
    /// baseline built from a failed or empty snapshot would deselect every
    /// calendar the query could not see.
    pub async fn set_calendar_selected(&self, calendar_id: i64, selected: bool) {
        let current = match selection::read_selection(self.selection.as_ref()) {
            Ok(current) => current,
            Err(e) => {
                log::warn!("Selection read failed, treating as default: {}", e);
                None
            }
        };

        let mut set: BTreeSet<String> = match current {
            Some(set) => set,
            None => match self.provider.list_calendars().await {
                Ok(calendars) => calendars.iter().map(|c| c.id.to_string()).collect(),
                Err(e) => {
                    log::warn!(
                        "Dropping selection toggle for calendar {}, cannot materialize default: {}",
                        calendar_id,
                        e
                    );
                    return;
                }
            },
        };

        if selected {
            set.insert(calendar_id.to_string());
        } else {
            set.remove(&calendar_id.to_string());
        }

        if let Err(e) = selection::write_selection(self.selection.as_ref(), &set) {
            log::warn!("Selection write failed for calendar {}: {}", calendar_id, e);
        }

        self.refresh().await;
    }

    /// Update the query window and recompute. An inverted or empty range is
    /// ignored (logged, previous window kept).
    pub async fn set_time_range(&self, start_millis: i64, end_millis: i64) {
        match TimeWindow::new(start_millis, end_millis) {
            Some(window) => {
                *self.window.lock() = window;
            }
            None => {
                log::warn!(
                    "Ignoring invalid time range [{}, {})",
                    start_millis,
                    end_millis
                );
                return;
            }
        }
        self.refresh().await;
    }

    /// Pull calendars from the provider and overlay the selection state.
    /// Errors propagate: the refresh path swallows them into empty views,
    /// the periodic sync task classifies them for its retry decision.
    pub(crate) async fn load_calendars(&self) -> Result<Vec<Calendar>, ProviderError> {
        let mut calendars = self.provider.list_calendars().await?;

        let stored = match selection::read_selection(self.selection.as_ref()) {
            Ok(stored) => stored,
            Err(e) => {
                log::warn!("Selection read failed, treating as default: {}", e);
                None
            }
        };
        for calendar in &mut calendars {
            calendar.selected = selection::is_selected(&stored, calendar.id);
        }

        Ok(calendars)
    }

    /// Pull events for the given calendars and window.
    pub(crate) async fn load_events_for(
        &self,
        calendar_ids: &[i64],
        window: TimeWindow,
    ) -> Result<Vec<Event>, ProviderError> {
        self.provider
            .list_events(calendar_ids, window.start_millis(), window.end_millis())
            .await
    }
}
