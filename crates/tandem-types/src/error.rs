use thiserror::Error;

/// Errors from repository operations (used by trait definitions in tandem-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the chat pairing protocol.
///
/// Every variant except `Storage` is recoverable in place: the acting user is
/// told what happened and stays in an interactive state.
#[derive(Debug, Error)]
pub enum PairingError {
    /// The submitted public code is not 6 digits.
    #[error("malformed public code: '{0}'")]
    MalformedCode(String),

    /// The public code does not resolve to a registered user.
    #[error("no user with public code '{0}'")]
    UnknownCode(String),

    /// The code resolves back to the initiator.
    #[error("cannot open a chat with yourself")]
    SelfPairing,

    /// The referenced chat no longer matches expectations
    /// (already accepted, rejected, or closed by a concurrent operation).
    #[error("chat no longer available")]
    StaleChat,

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from the booking workflow service.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The referenced chat row no longer exists.
    #[error("chat not found")]
    ChatNotFound,

    /// Commit was attempted with required payload fields missing.
    #[error("incomplete booking data: missing '{0}'")]
    Incomplete(&'static str),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from the outbound transport boundary.
#[derive(Debug, Error)]
pub enum SendError {
    /// The recipient blocked the bot or is otherwise unreachable.
    #[error("recipient unreachable")]
    Unreachable,

    /// The transport rejected the message markup.
    #[error("invalid message markup")]
    InvalidMarkup,

    #[error("send failed: {0}")]
    Failed(String),
}

impl From<RepositoryError> for PairingError {
    fn from(e: RepositoryError) -> Self {
        PairingError::Storage(e.to_string())
    }
}

impl From<RepositoryError> for BookingError {
    fn from(e: RepositoryError) -> Self {
        BookingError::Storage(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_pairing_error_display() {
        let err = PairingError::UnknownCode("000123".to_string());
        assert!(err.to_string().contains("000123"));
    }

    #[test]
    fn test_repository_error_converts_to_pairing() {
        let err: PairingError = RepositoryError::NotFound.into();
        assert!(matches!(err, PairingError::Storage(_)));
    }
}
