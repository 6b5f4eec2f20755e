//! Observability setup for Tandem.

pub mod tracing_setup;
