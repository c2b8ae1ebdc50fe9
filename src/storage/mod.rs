//! Pluggable persistence for stores.
//!
//! Every store lives behind the [`StorageBackend`] load/save interface.
//! Three implementations ship with the crate: a plain in-memory map, a
//! process-lifetime map of serialized text, and a file-per-store directory.
//! A bus selects between them with [`BackendKind`].

mod backend;
mod file;
mod memory;

pub use backend::{BackendKind, StorageBackend, StorageError};
pub use file::FileBackend;
pub use memory::{MemoryBackend, SessionBackend};
