use std::sync::Arc;

use serde_json::{Map, Value};

use crate::bus::Bus;
use crate::container::{content_of, ensure_container, get_nested, set_nested};
use crate::registry::{BoxedHandler, ListenerId};

/// Store operations: named, addressable state containers combining the
/// storage backend, the container utilities, and the dispatch engine.
impl Bus {
    /// Replace a store's content and notify its listeners.
    ///
    /// Primitive values are wrapped transparently; handlers and
    /// [`Bus::get_store`] always see the unwrapped value. Returns a clone
    /// of the stored content.
    pub fn set_store(&self, name: &str, value: impl Into<Value>) -> Value {
        let container = ensure_container(value.into());
        self.save(name, &container);
        let stored = content_of(&container);
        self.broadcast_event(name, container);
        stored
    }

    /// Replace several stores at once.
    pub fn set_stores(&self, stores: Vec<(&str, Value)>) {
        for (name, value) in stores {
            self.set_store(name, value);
        }
    }

    /// Shallow-merge top-level keys over a store's current content.
    ///
    /// Only top-level keys are merged; a nested object under a merged key
    /// replaces the old one wholesale. Creates the store when absent.
    /// Returns a clone of the merged content.
    pub fn update_store(&self, name: &str, partial: impl Into<Value>) -> Value {
        let mut target = self.load(name).unwrap_or_else(empty_object);
        merge_top_level(&mut target, ensure_container(partial.into()));
        self.save(name, &target);
        let merged = content_of(&target);
        self.broadcast_event(name, target);
        merged
    }

    /// Initialize a store without overwriting existing data.
    ///
    /// An array value gates on existence alone: when the store already
    /// exists its current content is broadcast unchanged. For any other
    /// value, only the keys missing from the existing content are added; a
    /// key already present is never overwritten. Always broadcasts, so
    /// listeners connected before initialization still hear the result.
    pub fn init_store(&self, name: &str, initial: impl Into<Value>) -> Value {
        let initial = initial.into();
        if initial.is_array() {
            let container = match self.load(name) {
                Some(existing) => existing,
                None => {
                    self.save(name, &initial);
                    initial
                }
            };
            let stored = content_of(&container);
            self.broadcast_event(name, container);
            return stored;
        }
        let mut target = self.load(name).unwrap_or_else(empty_object);
        if let (Value::Object(map), Value::Object(defaults)) =
            (&mut target, ensure_container(initial))
        {
            for (key, value) in defaults {
                map.entry(key).or_insert(value);
            }
        }
        self.save(name, &target);
        let stored = content_of(&target);
        self.broadcast_event(name, target);
        stored
    }

    /// Initialize several stores at once.
    pub fn init_stores(&self, stores: Vec<(&str, Value)>) {
        for (name, initial) in stores {
            self.init_store(name, initial);
        }
    }

    /// Read a store's content, unwrapping primitive values transparently.
    pub fn get_store(&self, name: &str) -> Option<Value> {
        self.load(name).map(|container| content_of(&container))
    }

    /// Whether a store currently exists under a name.
    pub fn exists_store(&self, name: &str) -> bool {
        self.load(name).is_some()
    }

    /// Read a nested value by dotted path.
    ///
    /// An empty path reads the whole store content.
    pub fn get_state(&self, name: &str, path: &str) -> Option<Value> {
        if path.is_empty() {
            return self.get_store(name);
        }
        let container = self.load(name)?;
        get_nested(&container, path).cloned()
    }

    /// Write a nested value by dotted path, creating intermediate objects
    /// as needed, then persist and broadcast the whole store.
    ///
    /// Returns the written value.
    pub fn set_state(&self, name: &str, path: &str, value: impl Into<Value>) -> Value {
        let value = value.into();
        let mut store = self.get_store(name).unwrap_or_else(empty_object);
        set_nested(&mut store, path, value.clone());
        self.set_store(name, store);
        value
    }

    /// Whether a store holds a non-null top-level property.
    pub fn contains_state(&self, name: &str, property: &str) -> bool {
        matches!(
            self.load(name).as_ref().and_then(|c| c.get(property)),
            Some(value) if !value.is_null()
        )
    }

    /// Drop every key from a store; the store itself remains, empty.
    pub fn clear_store(&self, name: &str) -> Value {
        self.set_store(name, empty_object())
    }

    /// Null every top-level value in a store while keeping its keys.
    ///
    /// Distinct from [`Bus::clear_store`], which drops the keys entirely.
    /// Does nothing when the store does not exist.
    pub fn clear_states(&self, name: &str) {
        let Some(mut container) = self.load(name) else {
            return;
        };
        match &mut container {
            Value::Object(map) => {
                for value in map.values_mut() {
                    *value = Value::Null;
                }
            }
            Value::Array(items) => {
                for value in items.iter_mut() {
                    *value = Value::Null;
                }
            }
            _ => {}
        }
        self.set_store(name, container);
    }

    /// Connect one listener to several stores at once.
    ///
    /// Equivalent to calling [`Bus::connect_to_store`] per pair: each store
    /// replays its current value and fires its connector event.
    pub fn connect_to_stores<L>(&self, listener: L, handlers: Vec<(&str, BoxedHandler)>)
    where
        L: Into<ListenerId>,
    {
        let listener = listener.into();
        for (store, handler) in handlers {
            self.connect_handler(listener.clone(), store, Arc::from(handler));
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn merge_top_level(target: &mut Value, partial: Value) {
    match partial {
        Value::Object(updates) => match target {
            Value::Object(map) => map.extend(updates),
            other => *other = Value::Object(updates),
        },
        other => *target = other,
    }
}
