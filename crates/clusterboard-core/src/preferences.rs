//! Session-scoped UI preference store
//!
//! Flat key/value store for view state the user has chosen (sort order,
//! collapsed sections, ...) so it survives re-renders and page navigations
//! within one session. Values are opaque JSON; readers supply their own
//! default for absent keys. Last-write-wins per key, no deletion, no expiry.
//!
//! Keys are namespaced by convention as `"<feature>/<aspect>"`, e.g.
//! `"tableDetails/sort_setting/grants"`.

use crate::event::{DataEvent, EventBus};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Sort order chosen for one sortable table
///
/// The default (no sort key) means unsorted / natural order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SortSetting {
    pub sort_key: Option<String>,
    pub ascending: bool,
}

struct StoreInner {
    values: RwLock<HashMap<String, Value>>,
    bus: EventBus,
}

/// Synchronous key/value store for view preferences
///
/// Cheap to clone (shared interior). Low contention, so a single RwLock
/// over the map is enough; reads never block writers for long.
pub struct PreferenceStore {
    inner: Arc<StoreInner>,
}

impl Clone for PreferenceStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl PreferenceStore {
    pub fn new(bus: EventBus) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                values: RwLock::new(HashMap::new()),
                bus,
            }),
        }
    }

    /// Overwrite the value for `key` and notify subscribers.
    ///
    /// Never fails: a value that cannot be serialized is logged and skipped,
    /// leaving any previous value in place.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(err) => {
                warn!(key, error = %err, "preference value not serializable, skipped");
                return;
            }
        };

        self.inner.values.write().insert(key.to_string(), value);
        self.inner
            .bus
            .publish(DataEvent::PreferenceChanged(key.to_string()));
    }

    /// Read the value for `key`, if present and of the expected shape
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.inner.values.read().get(key).cloned()?;
        match serde_json::from_value(value) {
            Ok(value) => Some(value),
            Err(err) => {
                // Shape mismatch degrades to absent rather than failing the read
                warn!(key, error = %err, "preference value has unexpected shape");
                None
            }
        }
    }

    /// Read the value for `key`, falling back to a caller-supplied default
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Read the value for `key`, falling back to the type's default
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.inner.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.values.read().is_empty()
    }
}
