//! Listener identity and subscription records.
//!
//! The registry maps (listener, event) pairs to handler functions, and the
//! state-processor table maps (listener, store, path) triples to nested-path
//! watchers. Both keep insertion order and guarantee at most one record per
//! key.

mod registry;
mod states;

pub use registry::{BoxedHandler, ListenerId};

pub(crate) use registry::{Handler, Registry};
pub(crate) use states::StateProcessors;
