//! ChatRepository trait definition.
//!
//! The three state-changing operations (`activate`, `reject`, `close`) are
//! compare-and-verify updates: each re-checks the row's id, ownership, and
//! current status inside the mutation and reports whether the row actually
//! transitioned. That check is the system's only concurrency control --
//! concurrent accept/reject for the same chat race, exactly one wins, and
//! the loser observes `false`.

use tandem_types::chat::ChatSession;
use tandem_types::error::RepositoryError;
use tandem_types::user::Role;

/// Repository trait for chat pairing persistence.
pub trait ChatRepository: Send + Sync {
    /// Create a pairing in the `RequestPending` state.
    fn create(
        &self,
        client_id: i64,
        provider_id: i64,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Fetch a pairing by id.
    fn get(
        &self,
        chat_id: i64,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// The user's live (non-terminal) chat under the given role, if any.
    ///
    /// At most one such chat exists per user per role.
    fn live_chat_for(
        &self,
        user_id: i64,
        role: Role,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// `RequestPending -> Active`, verifying the chat still belongs to
    /// `provider_id`. Returns whether the row transitioned.
    fn activate(
        &self,
        chat_id: i64,
        provider_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// `RequestPending -> Rejected`, verifying ownership as in `activate`.
    fn reject(
        &self,
        chat_id: i64,
        provider_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Any non-terminal state `-> Closed`. Returns whether the row
    /// transitioned; closing an already-terminal chat is a no-op `false`,
    /// never an error.
    fn close(
        &self,
        chat_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
