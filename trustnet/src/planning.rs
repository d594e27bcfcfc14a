//! Request keys and the planning store.
//!
//! Responsibilities:
//! - Derive the dedup identity of a capability call: the capability name
//!   and the canonical JSON text of its argument, newline separated
//! - Mark requests whose argument has no JSON form (timestamps anywhere in
//!   the value, non-finite numbers) as unplannable
//! - Hold resolved values for the lifetime of one evaluation run, or a
//!   batch of sibling plugins sharing the store
//!
//! A `Null` entry covers both "the capability failed" and "the capability
//! legitimately returned null"; nothing downstream distinguishes them.

use std::collections::HashMap;
use std::sync::Mutex;

use tsl::Value;

/// Key for a request whose argument already has a canonical JSON form.
pub fn key_for_json(capability: &str, argument: &serde_json::Value) -> String {
    format!("{}\n{}", capability, argument)
}

/// Dedup key for one capability request; `None` marks it unplannable.
pub fn request_key(capability: &str, argument: &Value) -> Option<String> {
    let json = argument.to_json()?;
    Some(key_for_json(capability, &json))
}

/// Key-to-value map shared by the evaluations of one run.
#[derive(Debug, Default)]
pub struct PlanningStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl PlanningStore {
    pub fn new() -> Self {
        PlanningStore::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        match self.entries.lock() {
            Ok(entries) => entries.get(key).cloned(),
            Err(_) => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.into(), value);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
