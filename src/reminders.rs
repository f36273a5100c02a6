//! Reminder alarm reconciliation.
//!
//! `reconcile` brings the armed OS alarms in line with a given event list:
//! cancel everything derivable, then re-arm every future trigger. Repeating
//! the pass with an unchanged event list is idempotent because alarm keys
//! are deterministic and scheduling an armed key replaces it.
//!
//! The scheduler also keeps a small persisted ledger of the keys it armed on
//! the previous pass. The cancel phase cancels the union of that ledger and
//! the current event set's keys, so an event that vanished from the window
//! entirely (calendar deselected, window moved on, process restarted) still
//! gets its stale alarms cancelled — key recomputation alone can only cancel
//! pairs it can still enumerate.
//!
//! The ledger makes a pass stateful, so passes are serialized through an
//! async mutex: a periodic sync run may race the engine dataflow, and a pass
//! working from a stale ledger snapshot could cancel an alarm the other pass
//! just armed for a live event without ever re-arming it. Whichever pass
//! runs last is authoritative.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::provider::{AlarmService, CalendarProvider};
use crate::types::{Event, NotificationPayload, Reminder};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Deterministic alarm identity for an `(event series, lead time)` pair.
///
/// Distinct pairs map to distinct keys as long as lead times stay below
/// `MINUTES_SPAN` (about 69 days) — far beyond any real reminder offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AlarmKey(i64);

impl AlarmKey {
    const MINUTES_SPAN: i64 = 100_000;

    pub fn new(event_id: i64, reminder_minutes: i64) -> Self {
        Self(
            event_id
                .wrapping_mul(Self::MINUTES_SPAN)
                .wrapping_add(reminder_minutes),
        )
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

pub struct ReminderScheduler {
    provider: Arc<dyn CalendarProvider>,
    alarms: Arc<dyn AlarmService>,
    /// Keys armed by the previous reconciliation pass.
    ledger: Mutex<BTreeSet<AlarmKey>>,
    ledger_path: Option<PathBuf>,
    /// Serializes reconciliation passes. The ledger snapshot must cover a
    /// whole pass, lookups included.
    pass: tokio::sync::Mutex<()>,
}

impl ReminderScheduler {
    pub fn new(provider: Arc<dyn CalendarProvider>, alarms: Arc<dyn AlarmService>) -> Self {
        Self {
            provider,
            alarms,
            ledger: Mutex::new(BTreeSet::new()),
            ledger_path: None,
            pass: tokio::sync::Mutex::new(()),
        }
    }

    /// Like [`ReminderScheduler::new`], but the armed-key ledger survives
    /// restarts at `path`. An unreadable ledger logs a warning and starts
    /// empty — stale alarms then age out instead of crashing the engine.
    pub fn with_ledger(
        provider: Arc<dyn CalendarProvider>,
        alarms: Arc<dyn AlarmService>,
        path: PathBuf,
    ) -> Self {
        let ledger = match load_ledger(&path) {
            Ok(ledger) => ledger,
            Err(e) => {
                log::warn!("Failed to load alarm ledger, starting empty: {}", e);
                BTreeSet::new()
            }
        };
        Self {
            provider,
            alarms,
            ledger: Mutex::new(ledger),
            ledger_path: Some(path),
            pass: tokio::sync::Mutex::new(()),
        }
    }

    /// Cancel-then-arm pass over the entire current event set.
    pub async fn reconcile(&self, events: &[Event]) {
        self.reconcile_at(events, Utc::now().timestamp_millis()).await;
    }

    async fn reconcile_at(&self, events: &[Event], now_millis: i64) {
        let _guard = self.pass.lock().await;

        // One reminder lookup per distinct series; the event list is already
        // window-bounded so this stays small.
        let mut reminders_by_event: HashMap<i64, Vec<Reminder>> = HashMap::new();
        for event in events {
            if reminders_by_event.contains_key(&event.event_id) {
                continue;
            }
            let reminders = match self.provider.list_reminders(event.event_id).await {
                Ok(reminders) => reminders,
                Err(e) => {
                    // One bad reminder must not block the rest.
                    log::warn!("Reminder lookup failed for event {}: {}", event.event_id, e);
                    Vec::new()
                }
            };
            reminders_by_event.insert(event.event_id, reminders);
        }

        let mut pairs: Vec<(&Event, Reminder)> = Vec::new();
        for event in events {
            if let Some(reminders) = reminders_by_event.get(&event.event_id) {
                for reminder in reminders {
                    pairs.push((event, *reminder));
                }
            }
        }

        let current_keys: BTreeSet<AlarmKey> = pairs
            .iter()
            .map(|(event, reminder)| AlarmKey::new(event.event_id, reminder.minutes))
            .collect();

        // Cancel phase: previous ledger ∪ current keys. Cancelling an alarm
        // that was never armed is a no-op by the alarm service contract.
        let previous = std::mem::take(&mut *self.ledger.lock());
        for key in previous.union(&current_keys) {
            self.alarms.cancel(*key);
        }

        // Arm phase. The exact-alarm capability is re-checked on every pass;
        // it can be revoked between runs.
        let exact = self.alarms.can_schedule_exact();
        let mut armed: BTreeSet<AlarmKey> = BTreeSet::new();
        for (event, reminder) in pairs {
            let key = AlarmKey::new(event.event_id, reminder.minutes);
            let trigger_at = event.start_time - reminder.minutes * MILLIS_PER_MINUTE;

            if trigger_at < now_millis {
                log::debug!(
                    "Skipping past trigger for event {} ({} min lead)",
                    event.event_id,
                    reminder.minutes
                );
                continue;
            }

            let payload = NotificationPayload::from(event);
            let result = if exact {
                self.alarms.schedule_exact(key, trigger_at, &payload)
            } else {
                self.alarms.schedule_inexact(key, trigger_at, &payload)
            };

            match result {
                Ok(()) => {
                    armed.insert(key);
                }
                Err(e) if e.is_permission() => {
                    log::warn!(
                        "Alarm permission denied for event {} ({} min lead): {}",
                        event.event_id,
                        reminder.minutes,
                        e
                    );
                }
                Err(e) => {
                    log::warn!("Failed to arm alarm for event {}: {}", event.event_id, e);
                }
            }
        }

        let snapshot = armed.clone();
        *self.ledger.lock() = armed;

        if let Some(path) = &self.ledger_path {
            if let Err(e) = save_ledger(path, &snapshot) {
                log::warn!("Failed to persist alarm ledger: {}", e);
            }
        }
    }
}

fn load_ledger(path: &Path) -> Result<BTreeSet<AlarmKey>, StoreError> {
    if !path.exists() {
        return Ok(BTreeSet::new());
    }
    let content = fs::read_to_string(path)?;
    let keys: Vec<AlarmKey> = serde_json::from_str(&content)?;
    Ok(keys.into_iter().collect())
}

fn save_ledger(path: &Path, ledger: &BTreeSet<AlarmKey>) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let keys: Vec<AlarmKey> = ledger.iter().copied().collect();
    let content = serde_json::to_string_pretty(&keys)?;
    fs::write(path, content)?;
    Ok(())
}
