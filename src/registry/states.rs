use std::sync::Arc;

use serde_json::Value;

use crate::registry::{Handler, ListenerId};

/// One nested-path processor registration and its last observed value.
pub(crate) struct StateProcessor {
    pub listener: ListenerId,
    pub store: String,
    pub path: String,
    pub last: Option<Value>,
    pub processor: Handler,
}

/// Table of nested-path state processors.
///
/// Keyed by the (listener, store, path) triple with the same
/// remove-then-insert upsert rule as the subscription registry. The
/// remembered value lets the dispatcher skip a processor whose nested value
/// is structurally unchanged after a broadcast.
#[derive(Default)]
pub(crate) struct StateProcessors {
    records: Vec<StateProcessor>,
}

impl StateProcessors {
    pub fn attach(
        &mut self,
        listener: ListenerId,
        store: &str,
        path: &str,
        last: Option<Value>,
        processor: Handler,
    ) {
        self.records
            .retain(|r| !(r.listener == listener && r.store == store && r.path == path));
        self.records.push(StateProcessor {
            listener,
            store: store.to_string(),
            path: path.to_string(),
            last,
            processor,
        });
    }

    /// Processor keys registered against a store, in insertion order.
    pub fn by_store(&self, store: &str) -> Vec<(ListenerId, String)> {
        self.records
            .iter()
            .filter(|r| r.store == store)
            .map(|r| (r.listener.clone(), r.path.clone()))
            .collect()
    }

    /// The handler and remembered value for one key, if still registered.
    pub fn get(
        &self,
        listener: &ListenerId,
        store: &str,
        path: &str,
    ) -> Option<(Handler, Option<Value>)> {
        self.records
            .iter()
            .find(|r| &r.listener == listener && r.store == store && r.path == path)
            .map(|r| (Arc::clone(&r.processor), r.last.clone()))
    }

    /// Update the remembered value for one key.
    pub fn remember(
        &mut self,
        listener: &ListenerId,
        store: &str,
        path: &str,
        value: Option<Value>,
    ) {
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|r| &r.listener == listener && r.store == store && r.path == path)
        {
            record.last = value;
        }
    }

    pub fn detach_by_listener(&mut self, listener: &ListenerId) {
        self.records.retain(|r| &r.listener != listener);
    }

    /// Clones of the (listener, store, path) keys currently registered.
    pub fn snapshot(&self) -> Vec<(ListenerId, String, String)> {
        self.records
            .iter()
            .map(|r| (r.listener.clone(), r.store.clone(), r.path.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
