use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;
use tracing::warn;

use crate::storage::StorageBackend;

/// In-process backend holding containers as plain values.
///
/// Loads and saves clone, so callers never alias the stored value.
#[derive(Default)]
pub struct MemoryBackend {
    containers: RwLock<HashMap<String, Value>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&self, name: &str) -> Option<Value> {
        self.containers.read().unwrap().get(name).cloned()
    }

    fn save(&self, name: &str, value: &Value) {
        self.containers
            .write()
            .unwrap()
            .insert(name.to_string(), value.clone());
    }
}

/// Process-lifetime backend that keeps stores as serialized JSON text.
///
/// Values are serialized on save and parsed on load, exercising the same
/// text round-trip as a persistent host store. Malformed text loads as
/// absence.
#[derive(Default)]
pub struct SessionBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl SessionBackend {
    /// Create an empty session backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for SessionBackend {
    fn load(&self, name: &str) -> Option<Value> {
        let entries = self.entries.read().unwrap();
        let text = entries.get(name)?;
        match serde_json::from_str(text) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(store = name, %err, "discarding unparseable persisted store");
                None
            }
        }
    }

    fn save(&self, name: &str, value: &Value) {
        match serde_json::to_string(value) {
            Ok(text) => {
                self.entries.write().unwrap().insert(name.to_string(), text);
            }
            Err(err) => warn!(store = name, %err, "failed to serialize store"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        backend.save("USER", &json!({"name": "jon"}));
        assert_eq!(backend.load("USER"), Some(json!({"name": "jon"})));
        assert_eq!(backend.load("MISSING"), None);
    }

    #[test]
    fn memory_backend_clones_on_save() {
        let backend = MemoryBackend::new();
        let mut value = json!({"name": "jon"});
        backend.save("USER", &value);
        value["name"] = json!("changed");
        assert_eq!(backend.load("USER"), Some(json!({"name": "jon"})));
    }

    #[test]
    fn session_backend_round_trips_through_text() {
        let backend = SessionBackend::new();
        backend.save("USER", &json!({"name": "jon", "age": 30}));
        assert_eq!(backend.load("USER"), Some(json!({"name": "jon", "age": 30})));
    }

    #[test]
    fn session_backend_treats_malformed_text_as_absence() {
        let backend = SessionBackend::new();
        backend
            .entries
            .write()
            .unwrap()
            .insert("USER".to_string(), "{not json".to_string());
        assert_eq!(backend.load("USER"), None);
    }
}
