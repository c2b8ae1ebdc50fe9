//! JSON container utilities.
//!
//! Helpers over `serde_json::Value` for wrapping primitive payloads,
//! unwrapping stored content, and reading or writing nested dotted paths.

mod container;

pub use container::{
    content_of, ensure_container, get_nested, is_container, set_nested, CONTENT_KEY,
};
