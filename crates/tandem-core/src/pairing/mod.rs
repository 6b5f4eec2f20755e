//! Chat pairing protocol: request, accept/reject, relay, close.

pub mod service;

pub use service::PairingService;
