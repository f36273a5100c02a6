//! In-memory fakes for the external collaborators, shared by module tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{AlarmError, ProviderError, StoreError};
use crate::provider::{AlarmService, CalendarProvider};
use crate::reminders::AlarmKey;
use crate::selection::SelectionStore;
use crate::types::{Calendar, Event, NotificationPayload, Reminder};

/// Opt-in log output for test runs (`RUST_LOG=debug cargo test`).
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn calendar(id: i64) -> Calendar {
    Calendar {
        id,
        display_name: format!("Calendar {}", id),
        color: 0x4285f4,
        account_name: "me@example.com".to_string(),
        account_type: "com.example".to_string(),
        sync_events: true,
        visible: true,
        selected: true,
    }
}

pub fn event(instance_id: i64, event_id: i64, calendar: &Calendar, start: i64, end: i64) -> Event {
    Event {
        instance_id,
        event_id,
        title: format!("Event {}", event_id),
        description: None,
        location: None,
        organizer: None,
        start_time: start,
        end_time: end,
        all_day: false,
        calendar: calendar.clone(),
    }
}

// ---------------------------------------------------------------------------
// Mock calendar provider
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockProvider {
    pub calendars: Mutex<Vec<Calendar>>,
    pub events: Mutex<Vec<Event>>,
    pub reminders: Mutex<HashMap<i64, Vec<Reminder>>>,
    pub has_access: AtomicBool,
    /// When set, all queries fail with `ProviderError::Unavailable`.
    pub fail_queries: AtomicBool,
    /// Artificial latency for reminder lookups, in milliseconds.
    pub reminder_delay_ms: AtomicU64,
    pub calendar_queries: AtomicUsize,
}

impl MockProvider {
    pub fn new() -> Self {
        let provider = Self::default();
        provider.has_access.store(true, Ordering::SeqCst);
        provider
    }

    pub fn with_calendars(calendars: Vec<Calendar>) -> Self {
        let provider = Self::new();
        *provider.calendars.lock() = calendars;
        provider
    }

    pub fn set_reminders(&self, event_id: i64, minutes: &[i64]) {
        self.reminders.lock().insert(
            event_id,
            minutes.iter().map(|&m| Reminder { minutes: m }).collect(),
        );
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ProviderError::Unavailable("mock outage".to_string()));
        }
        if !self.has_access.load(Ordering::SeqCst) {
            return Err(ProviderError::PermissionDenied);
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarProvider for MockProvider {
    fn has_calendar_access(&self) -> bool {
        self.has_access.load(Ordering::SeqCst)
    }

    async fn list_calendars(&self) -> Result<Vec<Calendar>, ProviderError> {
        self.calendar_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.calendars.lock().clone())
    }

    async fn list_events(
        &self,
        calendar_ids: &[i64],
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<Event>, ProviderError> {
        self.check()?;
        Ok(self
            .events
            .lock()
            .iter()
            .filter(|e| {
                calendar_ids.contains(&e.calendar.id)
                    && e.start_time < end_millis
                    && e.end_time > start_millis
            })
            .cloned()
            .collect())
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, ProviderError> {
        self.check()?;
        Ok(self
            .events
            .lock()
            .iter()
            .find(|e| e.event_id == event_id)
            .cloned())
    }

    async fn list_reminders(&self, event_id: i64) -> Result<Vec<Reminder>, ProviderError> {
        let delay = self.reminder_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.check()?;
        Ok(self
            .reminders
            .lock()
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// Mock alarm service
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ArmedAlarm {
    pub trigger_at_millis: i64,
    pub payload: NotificationPayload,
    pub exact: bool,
}

#[derive(Default)]
pub struct MockAlarms {
    pub exact_allowed: AtomicBool,
    /// When set, `schedule_exact` fails with `ExactAlarmDenied` even though
    /// `can_schedule_exact` claims the capability — models a revocation race.
    pub deny_exact_at_schedule: AtomicBool,
    pub armed: Mutex<BTreeMap<AlarmKey, ArmedAlarm>>,
    pub cancelled: Mutex<Vec<AlarmKey>>,
}

impl MockAlarms {
    pub fn new() -> Self {
        let alarms = Self::default();
        alarms.exact_allowed.store(true, Ordering::SeqCst);
        alarms
    }

    pub fn armed_keys(&self) -> Vec<AlarmKey> {
        self.armed.lock().keys().copied().collect()
    }
}

impl AlarmService for MockAlarms {
    fn can_schedule_exact(&self) -> bool {
        self.exact_allowed.load(Ordering::SeqCst)
    }

    fn schedule_exact(
        &self,
        key: AlarmKey,
        trigger_at_millis: i64,
        payload: &NotificationPayload,
    ) -> Result<(), AlarmError> {
        if self.deny_exact_at_schedule.load(Ordering::SeqCst) {
            return Err(AlarmError::ExactAlarmDenied);
        }
        self.armed.lock().insert(
            key,
            ArmedAlarm {
                trigger_at_millis,
                payload: payload.clone(),
                exact: true,
            },
        );
        Ok(())
    }

    fn schedule_inexact(
        &self,
        key: AlarmKey,
        trigger_at_millis: i64,
        payload: &NotificationPayload,
    ) -> Result<(), AlarmError> {
        self.armed.lock().insert(
            key,
            ArmedAlarm {
                trigger_at_millis,
                payload: payload.clone(),
                exact: false,
            },
        );
        Ok(())
    }

    fn cancel(&self, key: AlarmKey) {
        self.armed.lock().remove(&key);
        self.cancelled.lock().push(key);
    }
}

// ---------------------------------------------------------------------------
// In-memory selection store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemorySelectionStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStore for MemorySelectionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map.lock().remove(key);
        Ok(())
    }
}
