//! The dispatch engine.
//!
//! [`Bus`] routes store mutations and plain events to their registered
//! handlers, synchronously and in registration order, and drives the
//! replay-on-connect and nested-state suppression semantics.

mod bus;

pub use bus::{Bus, CONNECT_PREFIX};
