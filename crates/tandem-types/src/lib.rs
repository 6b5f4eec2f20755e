//! Shared domain types for Tandem.
//!
//! This crate contains the core domain types used across the Tandem
//! marketplace bot: users and roles, sessions, chat pairings, notifications,
//! bookings, and the transport event envelopes.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod booking;
pub mod chat;
pub mod config;
pub mod error;
pub mod event;
pub mod notification;
pub mod session;
pub mod user;
