use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::{debug, error, warn};

use crate::container::{content_of, get_nested};
use crate::registry::{BoxedHandler, Handler, ListenerId, Registry, StateProcessors};
use crate::storage::{BackendKind, MemoryBackend, SessionBackend, StorageBackend};

/// Reserved prefix for connector events fired when a listener first
/// attaches to a store.
pub const CONNECT_PREFIX: &str = "CONNECT/";

/// A synchronous publish/subscribe engine over named JSON stores.
///
/// A `Bus` owns its storage backends, its subscription registry, and its
/// nested-state processors. Cloning a `Bus` yields another handle to the
/// same engine, so components can share one bus freely.
///
/// Every operation runs to completion on the caller's stack: broadcasts
/// invoke all matching handlers in-line, in registration order. No internal
/// lock is held while a handler runs, so handlers may call back into the
/// bus; a handler that writes to the store it observes recurses with no
/// automatic cycle-breaking.
///
/// # Examples
///
/// ```
/// use partyline::Bus;
/// use serde_json::json;
///
/// let bus = Bus::new();
/// bus.set_store("USER", json!({"name": "jon"}));
/// bus.connect_to_store("profile-view", "USER", |user| {
///     println!("user is now {user}");
/// });
/// bus.update_store("USER", json!({"name": "kim"}));
/// bus.disconnect_from_stores("profile-view");
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<BusInner>,
}

struct BusInner {
    mode: RwLock<BackendKind>,
    local: Option<Arc<dyn StorageBackend>>,
    session: SessionBackend,
    memory: MemoryBackend,
    registry: RwLock<Registry>,
    states: RwLock<StateProcessors>,
    next_token: AtomicU64,
}

impl Bus {
    /// Create a bus with no persistent backend, reading and writing the
    /// in-memory map.
    pub fn new() -> Self {
        Self::build(None, BackendKind::Memory)
    }

    /// Create a bus with a host-provided persistent backend in the local
    /// slot, selected as the initial storage mode.
    pub fn with_local(backend: impl StorageBackend + 'static) -> Self {
        Self::build(Some(Arc::new(backend)), BackendKind::Local)
    }

    fn build(local: Option<Arc<dyn StorageBackend>>, mode: BackendKind) -> Self {
        Self {
            inner: Arc::new(BusInner {
                mode: RwLock::new(mode),
                local,
                session: SessionBackend::new(),
                memory: MemoryBackend::new(),
                registry: RwLock::new(Registry::default()),
                states: RwLock::new(StateProcessors::default()),
                next_token: AtomicU64::new(0),
            }),
        }
    }

    /// Route subsequent loads and saves through the local persistent
    /// backend.
    ///
    /// Keeps the current mode and logs a warning when the bus was built
    /// without one.
    pub fn use_local_backend(&self) {
        if self.inner.local.is_none() {
            warn!("no local backend configured, keeping current storage mode");
            return;
        }
        *self.inner.mode.write().unwrap() = BackendKind::Local;
    }

    /// Route subsequent loads and saves through the process-lifetime
    /// session backend.
    pub fn use_session_backend(&self) {
        *self.inner.mode.write().unwrap() = BackendKind::Session;
    }

    /// Route subsequent loads and saves through the in-memory map.
    pub fn use_memory_backend(&self) {
        *self.inner.mode.write().unwrap() = BackendKind::Memory;
    }

    /// The currently selected storage mode.
    pub fn backend_kind(&self) -> BackendKind {
        *self.inner.mode.read().unwrap()
    }

    pub(crate) fn load(&self, name: &str) -> Option<Value> {
        match self.backend_kind() {
            BackendKind::Local => self.inner.local.as_ref()?.load(name),
            BackendKind::Session => self.inner.session.load(name),
            BackendKind::Memory => self.inner.memory.load(name),
        }
    }

    pub(crate) fn save(&self, name: &str, value: &Value) {
        match self.backend_kind() {
            BackendKind::Local => {
                if let Some(local) = &self.inner.local {
                    local.save(name, value);
                }
            }
            BackendKind::Session => self.inner.session.save(name, value),
            BackendKind::Memory => self.inner.memory.save(name, value),
        }
    }

    /// Allocate a fresh anonymous listener identity.
    pub fn new_listener(&self) -> ListenerId {
        ListenerId::Token(self.inner.next_token.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Broadcast a payload to every handler registered for an event.
    ///
    /// Handlers run synchronously in registration order, each receiving an
    /// independent clone of the payload with any `_content` wrapping
    /// removed. A panicking handler is logged and skipped; delivery
    /// continues with the remaining handlers. Afterwards the nested-state
    /// processors watching the event name re-evaluate their paths and fire
    /// only where the value changed.
    pub fn broadcast_event(&self, event: &str, payload: impl Into<Value>) {
        let payload = payload.into();
        let handlers = self.inner.registry.read().unwrap().by_event(event);
        debug!(event, handlers = handlers.len(), "broadcasting");
        let delivered = content_of(&payload);
        for handler in handlers {
            self.invoke(event, &handler, delivered.clone());
        }
        self.run_state_processors(event);
    }

    /// Attach a handler for an event on behalf of a listener, replaying the
    /// currently stored value when one exists.
    ///
    /// At most one handler per (listener, event) pair is kept; connecting
    /// the same pair again replaces the previous handler. Unless the event
    /// name already carries the reserved `CONNECT/` prefix, a
    /// `CONNECT/<event>` connector event is broadcast with the listener id,
    /// so a lazy loader can populate the store on first interest.
    pub fn connect_to_store<L, F>(&self, listener: L, store: &str, handler: F)
    where
        L: Into<ListenerId>,
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.connect_handler(listener.into(), store, Arc::new(handler));
    }

    pub(crate) fn connect_handler(&self, listener: ListenerId, event: &str, handler: Handler) {
        self.inner
            .registry
            .write()
            .unwrap()
            .attach(listener.clone(), event, Arc::clone(&handler));
        if let Some(stored) = self.load(event) {
            self.invoke(event, &handler, content_of(&stored));
        }
        self.announce_connect(event, &listener);
    }

    fn announce_connect(&self, event: &str, listener: &ListenerId) {
        if !event.starts_with(CONNECT_PREFIX) {
            let connector = format!("{CONNECT_PREFIX}{event}");
            self.broadcast_event(&connector, Value::String(listener.to_string()));
        }
    }

    /// Attach an anonymous handler for an event.
    ///
    /// Every call registers under a fresh listener token, so handling the
    /// same event twice stacks two handlers. The token is returned for a
    /// later [`Bus::disconnect_from_stores`].
    pub fn handle_event<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        let listener = self.new_listener();
        self.connect_handler(listener.clone(), event, Arc::new(handler));
        listener
    }

    /// Attach anonymous handlers for several events at once.
    pub fn handle_events(&self, handlers: Vec<(&str, BoxedHandler)>) -> Vec<ListenerId> {
        handlers
            .into_iter()
            .map(|(event, handler)| {
                let listener = self.new_listener();
                self.connect_handler(listener.clone(), event, Arc::from(handler));
                listener
            })
            .collect()
    }

    /// Watch a nested path inside a store.
    ///
    /// The processor fires on connect when the path currently holds a
    /// non-null value, and afterwards only when a broadcast for the store
    /// leaves a structurally different value at the path. Connector events
    /// are broadcast for the path (`CONNECT/<store>:<path>`) and the store.
    pub fn connect_to_state<L, F>(&self, listener: L, store: &str, path: &str, processor: F)
    where
        L: Into<ListenerId>,
        F: Fn(Value) + Send + Sync + 'static,
    {
        let listener = listener.into();
        self.attach_to_state(listener.clone(), store, path, Arc::new(processor));
        self.announce_connect(store, &listener);
    }

    /// Watch several nested paths inside one store.
    pub fn connect_to_states<L>(&self, listener: L, store: &str, processors: Vec<(&str, BoxedHandler)>)
    where
        L: Into<ListenerId>,
    {
        let listener = listener.into();
        for (path, processor) in processors {
            self.attach_to_state(listener.clone(), store, path, Arc::from(processor));
        }
        self.announce_connect(store, &listener);
    }

    fn attach_to_state(&self, listener: ListenerId, store: &str, path: &str, processor: Handler) {
        let current = self
            .load(store)
            .and_then(|container| get_nested(&container, path).cloned());
        self.inner.states.write().unwrap().attach(
            listener.clone(),
            store,
            path,
            current.clone(),
            Arc::clone(&processor),
        );
        if let Some(value) = current {
            if !value.is_null() {
                self.invoke(store, &processor, content_of(&value));
            }
        }
        if !store.starts_with(CONNECT_PREFIX) {
            let connector = format!("{CONNECT_PREFIX}{store}:{path}");
            self.broadcast_event(&connector, Value::String(listener.to_string()));
        }
    }

    /// Remove every subscription and state processor owned by a listener,
    /// across all stores and events.
    pub fn disconnect_from_stores<L: Into<ListenerId>>(&self, listener: L) {
        let listener = listener.into();
        let mut registry = self.inner.registry.write().unwrap();
        let events = registry.by_listener(&listener);
        debug!(listener = %listener, events = events.len(), "disconnecting listener");
        registry.detach_by_listener(&listener);
        drop(registry);
        self.inner
            .states
            .write()
            .unwrap()
            .detach_by_listener(&listener);
    }

    /// Remove every handler registered for an event name.
    pub fn unhandle(&self, event: &str) {
        self.inner.registry.write().unwrap().detach_by_event(event);
    }

    /// Clear all registrations and the listener-token counter.
    ///
    /// Persisted store contents are untouched; tests that need a clean
    /// slate also switch to the memory backend explicitly.
    pub fn reset(&self) {
        self.inner.registry.write().unwrap().clear();
        self.inner.states.write().unwrap().clear();
        self.inner.next_token.store(0, Ordering::SeqCst);
    }

    /// Clones of the (listener, event) registrations, for diagnostics.
    pub fn subscriptions(&self) -> Vec<(ListenerId, String)> {
        self.inner.registry.read().unwrap().snapshot()
    }

    /// Clones of the (listener, store, path) state registrations, for
    /// diagnostics.
    pub fn state_subscriptions(&self) -> Vec<(ListenerId, String, String)> {
        self.inner.states.read().unwrap().snapshot()
    }

    fn run_state_processors(&self, store: &str) {
        let watchers = self.inner.states.read().unwrap().by_store(store);
        for (listener, path) in watchers {
            // The record may have been detached by an earlier handler in
            // this same broadcast.
            let Some((processor, last)) = self.inner.states.read().unwrap().get(&listener, store, &path)
            else {
                continue;
            };
            let current = self
                .load(store)
                .and_then(|container| get_nested(&container, &path).cloned());
            if current == last {
                continue;
            }
            // Remember before invoking so a re-entrant write compares
            // against the value being delivered.
            self.inner
                .states
                .write()
                .unwrap()
                .remember(&listener, store, &path, current.clone());
            let payload = match current {
                Some(value) => content_of(&value),
                None => Value::Null,
            };
            self.invoke(store, &processor, payload);
        }
    }

    fn invoke(&self, event: &str, handler: &Handler, payload: Value) {
        if panic::catch_unwind(AssertUnwindSafe(|| handler(payload))).is_err() {
            error!(event, "handler panicked during broadcast");
        }
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}
