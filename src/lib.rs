//! # Partyline
//!
//! Synchronous publish/subscribe state stores for Rust.
//!
//! Partyline keeps application state in named stores of JSON values and
//! notifies connected listeners in-line on every change. It is built for
//! components with a mount/unmount lifecycle: connect on mount, get the
//! current value replayed immediately, receive every later change, and
//! disconnect on unmount.
//!
//! ## Stores
//!
//! - [`Bus::set_store`] replaces a store and broadcasts it
//! - [`Bus::update_store`] shallow-merges top-level keys
//! - [`Bus::init_store`] seeds defaults without overwriting existing data
//! - [`Bus::get_state`] / [`Bus::set_state`] address nested values by
//!   dotted path
//!
//! ## Listeners
//!
//! - [`Bus::connect_to_store`] subscribes with replay-on-connect
//! - [`Bus::connect_to_state`] watches one nested path, with redundant
//!   notifications suppressed by structural comparison
//! - [`Bus::handle_event`] attaches anonymous handlers to plain events
//! - [`Bus::disconnect_from_stores`] removes every registration a listener
//!   owns
//!
//! ## Persistence
//!
//! Stores live behind the pluggable [`StorageBackend`] interface: a plain
//! in-memory map, a process-lifetime text map, or a file-per-store
//! directory ([`FileBackend`]), selected per bus.

pub mod bus;
pub mod container;
pub mod registry;
pub mod storage;

mod store;

// Re-export main types for convenience
pub use bus::{Bus, CONNECT_PREFIX};
pub use registry::{BoxedHandler, ListenerId};
pub use storage::{
    BackendKind, FileBackend, MemoryBackend, SessionBackend, StorageBackend, StorageError,
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_works() {
        // Basic smoke test
        let bus = Bus::new();
        bus.set_store("GREETING", json!({"text": "hello"}));
        assert_eq!(bus.get_store("GREETING"), Some(json!({"text": "hello"})));
    }
}
