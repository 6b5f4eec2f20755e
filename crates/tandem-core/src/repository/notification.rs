//! NotificationRepository trait definition.
//!
//! An append-only queue of role-scoped text events. `pending` returns unread
//! items FIFO by creation time; `mark_read` flips every currently-unread item
//! for the pair in one step. Rows are never deleted.

use tandem_types::error::RepositoryError;
use tandem_types::notification::Notification;
use tandem_types::user::Role;

/// Repository trait for the durable notification queue.
pub trait NotificationRepository: Send + Sync {
    /// Append a notification for a `(user, role)` pair.
    fn enqueue(
        &self,
        user_id: i64,
        role: Role,
        body: &str,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Unread notifications for the pair, FIFO by creation time.
    fn pending(
        &self,
        user_id: i64,
        role: Role,
    ) -> impl std::future::Future<Output = Result<Vec<Notification>, RepositoryError>> + Send;

    /// Mark every currently-unread notification for the pair as read.
    fn mark_read(
        &self,
        user_id: i64,
        role: Role,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Count of unread notifications for the pair.
    fn unread_count(
        &self,
        user_id: i64,
        role: Role,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
