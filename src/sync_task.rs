//! Periodic background synchronization entry point.
//!
//! An external task runner invokes `run()` on a fixed cadence (the runner
//! owns the interval and guarantees at most one concurrent execution under
//! its key). Each run pulls a rolling window of events for the selected
//! calendars and reconciles reminder alarms against it.
//!
//! Outcome semantics matter more than the work itself: permission absence is
//! a `Success` — it is an expected steady state and retrying cannot fix it —
//! while transient provider failures return `Retry` so the runner's backoff
//! envelope takes over.

use std::sync::Arc;

use chrono::Utc;

use crate::error::ProviderError;
use crate::provider::CalendarProvider;
use crate::reminders::ReminderScheduler;
use crate::store::CalendarDataStore;
use crate::types::TimeWindow;

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Result reported to the periodic task runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Success,
    Retry,
}

pub struct PeriodicSyncTask {
    provider: Arc<dyn CalendarProvider>,
    store: Arc<CalendarDataStore>,
    scheduler: Arc<ReminderScheduler>,
    sync_window_hours: i64,
}

impl PeriodicSyncTask {
    /// The repository handed in here is the initialized engine instance —
    /// construction is the idempotent init, there is no lazy setup to race.
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        store: Arc<CalendarDataStore>,
        scheduler: Arc<ReminderScheduler>,
        sync_window_hours: i64,
    ) -> Self {
        Self {
            provider,
            store,
            scheduler,
            sync_window_hours: sync_window_hours.max(1),
        }
    }

    /// One synchronization pass over `[now, now + window)`.
    pub async fn run(&self) -> SyncOutcome {
        if !self.provider.has_calendar_access() {
            log::info!("Periodic sync: calendar permission absent, nothing to do");
            return SyncOutcome::Success;
        }

        let now = Utc::now().timestamp_millis();
        let window = match TimeWindow::new(now, now + self.sync_window_hours * MILLIS_PER_HOUR) {
            Some(window) => window,
            None => {
                // Unreachable with a positive width, kept as a guard.
                log::warn!("Periodic sync: degenerate window, skipping run");
                return SyncOutcome::Success;
            }
        };

        let calendars = match self.store.load_calendars().await {
            Ok(calendars) => calendars,
            Err(e) => return classify(e),
        };
        let selected: Vec<i64> = calendars.iter().filter(|c| c.selected).map(|c| c.id).collect();

        let events = if selected.is_empty() {
            Vec::new()
        } else {
            match self.store.load_events_for(&selected, window).await {
                Ok(events) => events,
                Err(e) => return classify(e),
            }
        };

        self.scheduler.reconcile(&events).await;

        log::info!(
            "Periodic sync: reconciled {} events across {} selected calendars",
            events.len(),
            selected.len()
        );
        SyncOutcome::Success
    }
}

fn classify(e: ProviderError) -> SyncOutcome {
    if e.is_permission() {
        // Permission was revoked mid-run; retrying will not restore it.
        log::warn!("Periodic sync: permission lost during run: {}", e);
        SyncOutcome::Success
    } else {
        log::warn!("Periodic sync: transient failure, will retry: {}", e);
        SyncOutcome::Retry
    }
}
