//! Calendar data synchronization and reminder scheduling engine.
//!
//! `calsync` merges an external, mutable calendar provider with locally
//! persisted calendar selections and a sliding time window into live derived
//! views, and keeps OS-level reminder alarms reconciled against those views
//! — across refreshes, permission changes, and process restarts.
//!
//! The host process supplies platform bindings for the three external
//! collaborators ([`CalendarProvider`], [`AlarmService`], [`SelectionStore`])
//! and owns a single [`Engine`] instance:
//!
//! - provider mutation notifications go through [`ChangeNotifier`] and end
//!   in a debounced repository refresh;
//! - an external periodic task runner calls [`Engine::run_periodic_sync`]
//!   on its cadence and acts on the returned [`SyncOutcome`];
//! - the UI layer subscribes to the derived views and feeds visible events
//!   into [`layout_day`] for rendering.

pub mod config;
pub mod engine;
pub mod error;
pub mod layout;
pub mod provider;
pub mod reminders;
pub mod selection;
pub mod store;
pub mod subscription;
pub mod sync_task;
pub mod types;

#[cfg(test)]
mod testutil;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{AlarmError, ProviderError, StoreError};
pub use layout::{layout_day, EventSlot};
pub use provider::{AlarmService, CalendarProvider};
pub use reminders::{AlarmKey, ReminderScheduler};
pub use selection::{JsonSelectionStore, SelectionStore};
pub use store::CalendarDataStore;
pub use subscription::{ChangeNotifier, ChangeSubscription};
pub use sync_task::{PeriodicSyncTask, SyncOutcome};
pub use types::{Calendar, Event, NotificationPayload, Reminder, TimeWindow};
