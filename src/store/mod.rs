//! Named state stores.
//!
//! The store surface lives as methods on [`crate::Bus`]: `set_store`,
//! `update_store`, `init_store`, `get_store`, nested `get_state`/`set_state`,
//! and the clear operations. A write persists through the selected storage
//! backend and broadcasts the new content to the store's listeners.

mod store;
