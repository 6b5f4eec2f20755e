//! Outbound transport boundary.
//!
//! The core never talks to the chat platform directly; it hands fully-formed
//! [`OutboundMessage`] values to a `Transport`. The one error the
//! orchestration logic cares about is `Unreachable` -- it drives the
//! implicit-close path of the chat pairing protocol.

use tandem_types::error::SendError;
use tandem_types::event::OutboundMessage;

/// Message delivery to a single user.
///
/// The HTTP-backed implementation lives in `tandem-infra`.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        user_id: i64,
        message: &OutboundMessage,
    ) -> impl std::future::Future<Output = Result<(), SendError>> + Send;
}
