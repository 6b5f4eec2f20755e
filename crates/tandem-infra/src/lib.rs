//! Infrastructure layer for Tandem.
//!
//! Contains implementations of the repository traits defined in
//! `tandem-core`: SQLite storage (split reader/writer pools, WAL), the TOML
//! configuration loader, and the HTTP transport client.

pub mod config;
pub mod sqlite;
pub mod transport;
