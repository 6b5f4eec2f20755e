//! Session state store: the substrate every workflow builds on.

pub mod store;

pub use store::{MemorySessionStore, SessionStore, reset_preserving_role};
