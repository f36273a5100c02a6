//! External collaborator contracts: the calendar provider and the OS alarm
//! service.
//!
//! The engine never reimplements provider query mechanics — it consumes
//! these traits and the host supplies platform bindings. Both seams may
//! block (IPC, disk), so callers stay off latency-sensitive contexts.

use async_trait::async_trait;

use crate::error::{AlarmError, ProviderError};
use crate::reminders::AlarmKey;
use crate::types::{Calendar, Event, NotificationPayload, Reminder};

/// Read access to the OS-level calendar store.
///
/// Calendars and events are materialized fresh on every call; the provider
/// is an external, mutable, unversioned source of truth and nothing here is
/// cached by contract.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Whether calendar read/write permission is currently granted. Can flip
    /// at any time, so callers re-check per operation rather than caching.
    fn has_calendar_access(&self) -> bool;

    async fn list_calendars(&self) -> Result<Vec<Calendar>, ProviderError>;

    /// Events for the given calendars intersecting the half-open window
    /// `[start_millis, end_millis)`.
    async fn list_events(
        &self,
        calendar_ids: &[i64],
        start_millis: i64,
        end_millis: i64,
    ) -> Result<Vec<Event>, ProviderError>;

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, ProviderError>;

    async fn list_reminders(&self, event_id: i64) -> Result<Vec<Reminder>, ProviderError>;
}

/// The OS alarm subsystem.
///
/// The OS is the source of truth for what is armed. Scheduling an already
/// armed key replaces it; cancelling an unknown key is a no-op, not an
/// error — both properties are what make cancel-then-arm reconciliation
/// idempotent.
pub trait AlarmService: Send + Sync {
    /// Whether exact wake alarms are currently permitted. Re-evaluated on
    /// every reconciliation pass since the capability can be revoked
    /// between runs.
    fn can_schedule_exact(&self) -> bool;

    fn schedule_exact(
        &self,
        key: AlarmKey,
        trigger_at_millis: i64,
        payload: &NotificationPayload,
    ) -> Result<(), AlarmError>;

    fn schedule_inexact(
        &self,
        key: AlarmKey,
        trigger_at_millis: i64,
        payload: &NotificationPayload,
    ) -> Result<(), AlarmError>;

    fn cancel(&self, key: AlarmKey);
}
