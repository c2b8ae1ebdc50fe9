use serde_json::Value;
use thiserror::Error;

/// Errors from persistent storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing directory could not be created or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// A store value could not be serialized to text.
    #[error("store serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Selects which backend a bus reads and writes through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// The host-provided persistent backend configured at construction.
    Local,
    /// The process-lifetime backend that keeps stores as serialized text.
    Session,
    /// The plain in-process value map.
    Memory,
}

/// Uniform load/save interface over a key/value store of JSON containers.
///
/// Implementations must treat unparseable persisted data as absence: `load`
/// returns `None` rather than an error, and callers treat `None` as "store
/// not yet initialized". `save` failures are logged, never raised, so a
/// failing backend cannot abort a dispatch.
pub trait StorageBackend: Send + Sync {
    /// Load the container stored under `name`, if any.
    fn load(&self, name: &str) -> Option<Value>;

    /// Persist `value` under `name`.
    fn save(&self, name: &str, value: &Value);
}
