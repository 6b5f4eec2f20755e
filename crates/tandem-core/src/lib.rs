//! Orchestration core and repository trait definitions for Tandem.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the session orchestration engine itself: chat
//! pairing, the booking workflow, notification delivery, role routing, and
//! the single event dispatch entry point. It depends only on `tandem-types`
//! -- never on `tandem-infra` or any database/IO crate.

pub mod booking;
pub mod engine;
pub mod menu;
pub mod notify;
pub mod pairing;
pub mod repository;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;
