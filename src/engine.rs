//! Engine assembly.
//!
//! One explicitly constructed `Engine` instance owns the repository, the
//! reminder scheduler, the change subscription, and the periodic sync entry
//! point. The host process builds it at startup, injects it where needed,
//! and tears it down at exit — there is no ambient singleton.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::config::EngineConfig;
use crate::error::StoreError;
use crate::provider::{AlarmService, CalendarProvider};
use crate::reminders::ReminderScheduler;
use crate::selection::SelectionStore;
use crate::store::CalendarDataStore;
use crate::subscription::{ChangeNotifier, ChangeSubscription};
use crate::sync_task::{PeriodicSyncTask, SyncOutcome};
use crate::types::TimeWindow;

const MILLIS_PER_HOUR: i64 = 3_600_000;

pub struct Engine {
    store: Arc<CalendarDataStore>,
    scheduler: Arc<ReminderScheduler>,
    subscription: ChangeSubscription,
    sync_task: PeriodicSyncTask,
    reconcile_task: Mutex<Option<JoinHandle<()>>>,
}

impl Engine {
    /// Build the engine around the host-supplied platform bindings. The
    /// initial window is a rolling `sync_window_hours` span from now; UI
    /// navigation moves it later via the store.
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        alarms: Arc<dyn AlarmService>,
        selection: Arc<dyn SelectionStore>,
        config: &EngineConfig,
    ) -> Result<Self, StoreError> {
        let state_dir = config.state_dir()?;
        let now = Utc::now().timestamp_millis();
        let window = TimeWindow::new(now, now + config.sync_window_hours.max(1) * MILLIS_PER_HOUR)
            .ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "degenerate initial window",
                ))
            })?;

        let store = Arc::new(CalendarDataStore::new(
            Arc::clone(&provider),
            selection,
            window,
        ));
        let scheduler = Arc::new(ReminderScheduler::with_ledger(
            Arc::clone(&provider),
            alarms,
            state_dir.join("armed_alarms.json"),
        ));
        let subscription = ChangeSubscription::new(Arc::clone(&store), config.debounce_ms);
        let sync_task = PeriodicSyncTask::new(
            provider,
            Arc::clone(&store),
            Arc::clone(&scheduler),
            config.sync_window_hours,
        );

        Ok(Self {
            store,
            scheduler,
            subscription,
            sync_task,
            reconcile_task: Mutex::new(None),
        })
    }

    /// Register the change subscription and start the dataflow that feeds
    /// every published event snapshot into alarm reconciliation. Idempotent.
    pub fn start(&self) {
        self.subscription.register();

        let mut guard = self.reconcile_task.lock();
        if guard.is_some() {
            return;
        }
        let mut rx = self.store.events();
        let scheduler = Arc::clone(&self.scheduler);
        *guard = Some(tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let events = rx.borrow_and_update().clone();
                scheduler.reconcile(&events).await;
            }
        }));
        log::info!("Engine started");
    }

    /// Release the change subscription and stop the reconcile dataflow.
    pub fn shutdown(&self) {
        self.subscription.unregister();
        if let Some(task) = self.reconcile_task.lock().take() {
            task.abort();
        }
        log::info!("Engine stopped");
    }

    pub fn store(&self) -> &Arc<CalendarDataStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &Arc<ReminderScheduler> {
        &self.scheduler
    }

    /// Handle the provider binding calls on every mutation notification.
    pub fn change_notifier(&self) -> ChangeNotifier {
        self.subscription.notifier()
    }

    /// Entry point for the external periodic task runner.
    pub async fn run_periodic_sync(&self) -> SyncOutcome {
        self.sync_task.run().await
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(task) = self.reconcile_task.lock().take() {
            task.abort();
        }
    }
}
