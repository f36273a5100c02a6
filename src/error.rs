//! Error types for the sync engine.
//!
//! Errors are classified by recoverability:
//! - Permission: calendar or exact-alarm access denied — recovered locally,
//!   the affected operation no-ops instead of failing.
//! - Transient: provider temporarily unavailable — surfaced to the periodic
//!   task runner as a retry signal.
//! - Malformed: bad data from the provider or a corrupt state file.

use thiserror::Error;

/// Failures from the external calendar provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("calendar permission denied")]
    PermissionDenied,

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed provider data: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Permission problems are an expected steady state, not something a
    /// retry will fix.
    pub fn is_permission(&self) -> bool {
        matches!(self, ProviderError::PermissionDenied)
    }
}

/// Failures from the OS alarm service.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("exact alarm permission denied")]
    ExactAlarmDenied,

    #[error("alarm service error: {0}")]
    Os(String),
}

impl AlarmError {
    pub fn is_permission(&self) -> bool {
        matches!(self, AlarmError::ExactAlarmDenied)
    }
}

/// Failures from the local key-value stores (selection preferences, the
/// armed-alarm ledger).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse store contents: {0}")]
    Parse(#[from] serde_json::Error),
}
