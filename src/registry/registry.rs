use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// A handler invoked with a cloned payload on every matching broadcast.
pub(crate) type Handler = Arc<dyn Fn(Value) + Send + Sync>;

/// A boxed handler, used by the batch connect operations.
pub type BoxedHandler = Box<dyn Fn(Value) + Send + Sync>;

/// Identity of a subscriber.
///
/// Callers either supply their own stable string identity or let the bus
/// allocate a sequential token with [`crate::Bus::new_listener`]. The
/// identity is the join key when a listener is bulk-removed on disconnect.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ListenerId {
    /// A caller-supplied stable identity.
    Named(String),
    /// A bus-allocated sequential token.
    Token(u64),
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerId::Named(name) => f.write_str(name),
            ListenerId::Token(token) => write!(f, "#{token}"),
        }
    }
}

impl From<&str> for ListenerId {
    fn from(name: &str) -> Self {
        ListenerId::Named(name.to_string())
    }
}

impl From<String> for ListenerId {
    fn from(name: String) -> Self {
        ListenerId::Named(name)
    }
}

impl From<&ListenerId> for ListenerId {
    fn from(id: &ListenerId) -> Self {
        id.clone()
    }
}

/// One (listener, event, handler) registration.
pub(crate) struct Subscription {
    pub listener: ListenerId,
    pub event: String,
    pub handler: Handler,
}

/// Insertion-ordered table of subscription records.
///
/// At most one record exists per (listener, event) pair. Attaching an
/// existing pair again is a remove-then-insert: the previous handler is
/// dropped and the record moves to the end of the order.
#[derive(Default)]
pub(crate) struct Registry {
    records: Vec<Subscription>,
}

impl Registry {
    pub fn attach(&mut self, listener: ListenerId, event: &str, handler: Handler) {
        self.records
            .retain(|r| !(r.listener == listener && r.event == event));
        self.records.push(Subscription {
            listener,
            event: event.to_string(),
            handler,
        });
    }

    /// Handlers registered for an event, in insertion order.
    pub fn by_event(&self, event: &str) -> Vec<Handler> {
        self.records
            .iter()
            .filter(|r| r.event == event)
            .map(|r| Arc::clone(&r.handler))
            .collect()
    }

    /// Event names a listener is registered for, in insertion order.
    pub fn by_listener(&self, listener: &ListenerId) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| &r.listener == listener)
            .map(|r| r.event.clone())
            .collect()
    }

    pub fn detach_by_event(&mut self, event: &str) {
        self.records.retain(|r| r.event != event);
    }

    pub fn detach_by_listener(&mut self, listener: &ListenerId) {
        self.records.retain(|r| &r.listener != listener);
    }

    /// Clones of the (listener, event) pairs currently registered.
    pub fn snapshot(&self) -> Vec<(ListenerId, String)> {
        self.records
            .iter()
            .map(|r| (r.listener.clone(), r.event.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Handler {
        Arc::new(|_| {})
    }

    #[test]
    fn attach_replaces_existing_pair() {
        let mut registry = Registry::default();
        registry.attach("a".into(), "EVENT", noop());
        registry.attach("a".into(), "EVENT", noop());
        assert_eq!(registry.by_event("EVENT").len(), 1);
    }

    #[test]
    fn by_event_keeps_insertion_order_across_listeners() {
        let mut registry = Registry::default();
        registry.attach("a".into(), "EVENT", noop());
        registry.attach("b".into(), "EVENT", noop());
        registry.attach("a".into(), "OTHER", noop());
        assert_eq!(registry.by_event("EVENT").len(), 2);
        assert_eq!(
            registry.snapshot(),
            vec![
                ("a".into(), "EVENT".to_string()),
                ("b".into(), "EVENT".to_string()),
                ("a".into(), "OTHER".to_string()),
            ]
        );
    }

    #[test]
    fn by_listener_collects_all_events() {
        let mut registry = Registry::default();
        registry.attach("a".into(), "EVENT", noop());
        registry.attach("a".into(), "OTHER", noop());
        registry.attach("b".into(), "EVENT", noop());
        assert_eq!(registry.by_listener(&"a".into()), vec!["EVENT", "OTHER"]);
    }

    #[test]
    fn detach_by_listener_removes_every_record() {
        let mut registry = Registry::default();
        registry.attach("a".into(), "EVENT", noop());
        registry.attach("a".into(), "OTHER", noop());
        registry.attach("b".into(), "EVENT", noop());
        registry.detach_by_listener(&"a".into());
        assert!(registry.by_listener(&"a".into()).is_empty());
        assert_eq!(registry.by_event("EVENT").len(), 1);
    }

    #[test]
    fn detach_by_event_removes_every_record() {
        let mut registry = Registry::default();
        registry.attach("a".into(), "EVENT", noop());
        registry.attach("b".into(), "EVENT", noop());
        registry.detach_by_event("EVENT");
        assert!(registry.by_event("EVENT").is_empty());
    }

    #[test]
    fn named_and_token_identities_stay_distinct() {
        let mut registry = Registry::default();
        registry.attach(ListenerId::Named("1".to_string()), "EVENT", noop());
        registry.attach(ListenerId::Token(1), "EVENT", noop());
        assert_eq!(registry.by_event("EVENT").len(), 2);
    }
}
