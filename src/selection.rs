//! Calendar selection preferences.
//!
//! A flat string-keyed durable store holds the set of selected calendar IDs
//! under a single key. The crucial distinction: an *absent* key means "all
//! calendars selected" (the pre-onboarding default), while a present-but-
//! empty set means the user explicitly deselected everything.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::PathBuf;

use parking_lot::Mutex;

use crate::error::StoreError;

/// Store key under which the selected-calendar set is persisted.
pub const SELECTED_CALENDARS_KEY: &str = "selected_calendar_ids";

/// A flat string-keyed durable store. The engine relies on the underlying
/// store for atomicity of individual reads and writes.
pub trait SelectionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Read the selected-calendar set. `None` means the key is absent and every
/// calendar is treated as selected.
pub fn read_selection(
    store: &dyn SelectionStore,
) -> Result<Option<BTreeSet<String>>, StoreError> {
    match store.get(SELECTED_CALENDARS_KEY)? {
        Some(raw) => {
            let ids: Vec<String> = serde_json::from_str(&raw)?;
            Ok(Some(ids.into_iter().collect()))
        }
        None => Ok(None),
    }
}

/// Persist the selected-calendar set. Writing an empty set is meaningful —
/// it records an explicit "nothing selected".
pub fn write_selection(
    store: &dyn SelectionStore,
    selection: &BTreeSet<String>,
) -> Result<(), StoreError> {
    let ids: Vec<&String> = selection.iter().collect();
    let raw = serde_json::to_string(&ids)?;
    store.set(SELECTED_CALENDARS_KEY, &raw)
}

/// Whether a calendar ID counts as selected under the given (possibly
/// absent) selection.
pub fn is_selected(selection: &Option<BTreeSet<String>>, calendar_id: i64) -> bool {
    match selection {
        Some(set) => set.contains(&calendar_id.to_string()),
        None => true,
    }
}

// ---------------------------------------------------------------------------
// JSON file-backed implementation
// ---------------------------------------------------------------------------

/// Selection store persisted as a single pretty-printed JSON object.
///
/// The full map is cached in memory and written through on every mutation.
/// Fine for a handful of preference keys; not a general database.
pub struct JsonSelectionStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, String>>,
}

impl JsonSelectionStore {
    /// Open (or create on first write) the store at `path`. A missing file
    /// is an empty store; a corrupt file is an error.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let cache = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            cache: Mutex::new(cache),
        })
    }

    fn flush(&self, cache: &HashMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(cache)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SelectionStore for JsonSelectionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cache.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut cache = self.cache.lock();
        cache.insert(key.to_string(), value.to_string());
        self.flush(&cache)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut cache = self.cache.lock();
        cache.remove(key);
        self.flush(&cache)
    }
}
