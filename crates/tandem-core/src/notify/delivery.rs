//! Queued-notification delivery at login.
//!
//! Contract: immediately before presenting a role-scoped menu after a
//! successful authentication, render every pending item for that `(user,
//! role)` pair, then mark the batch read. Render-before-drain means a crash
//! between the two can duplicate a display on the next login but can never
//! silently lose one -- the safer failure direction for a user-facing
//! notice.

use tandem_types::error::{RepositoryError, SendError};
use tandem_types::event::OutboundMessage;
use tandem_types::user::Role;

use crate::repository::notification::NotificationRepository;
use crate::transport::Transport;

use std::sync::Arc;

/// Truncation threshold; the transport caps messages at 4096 chars and we
/// leave headroom for the ellipsis.
const TRUNCATE_AT: usize = 4000;

/// Cap a notification body to the transport's message size.
pub fn truncate_body(body: &str) -> String {
    if body.chars().count() <= TRUNCATE_AT {
        return body.to_string();
    }
    let mut out: String = body.chars().take(TRUNCATE_AT - 3).collect();
    out.push_str("...");
    out
}

/// Renders and drains the pending queue for one `(user, role)` pair.
pub struct NotificationDelivery<N, T> {
    notifications: N,
    transport: Arc<T>,
}

impl<N: NotificationRepository, T: Transport> NotificationDelivery<N, T> {
    pub fn new(notifications: N, transport: Arc<T>) -> Self {
        Self { notifications, transport }
    }

    /// Render every pending notification, then mark the batch read.
    ///
    /// Bodies render as HTML; when the transport rejects the markup the body
    /// is re-sent with angle brackets stripped rather than dropped. Other
    /// send failures are logged and skipped -- the batch is still drained,
    /// because the user is interactively present (they just authenticated)
    /// and re-queueing individual items would break FIFO.
    ///
    /// Returns the number of notifications rendered.
    pub async fn deliver_pending(
        &self,
        user_id: i64,
        role: Role,
    ) -> Result<usize, RepositoryError> {
        let pending = self.notifications.pending(user_id, role).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let _ = self
            .transport
            .send(user_id, &OutboundMessage::text("You have unread notifications:"))
            .await;

        for notification in &pending {
            let message = OutboundMessage::html(truncate_body(&notification.body));
            match self.transport.send(user_id, &message).await {
                Ok(()) => {}
                Err(SendError::InvalidMarkup) => {
                    if let Err(err) = self.transport.send(user_id, &message.stripped()).await {
                        tracing::warn!(user_id, %role, error = %err, "stripped notification send failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(user_id, %role, error = %err, "notification send failed");
                }
            }
        }

        self.notifications.mark_read(user_id, role).await?;
        Ok(pending.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeNotificationRepo, FakeTransport};

    fn delivery(
        notifications: FakeNotificationRepo,
        transport: Arc<FakeTransport>,
    ) -> NotificationDelivery<FakeNotificationRepo, FakeTransport> {
        NotificationDelivery::new(notifications, transport)
    }

    #[tokio::test]
    async fn test_delivers_in_fifo_order_then_drains() {
        let notifications = FakeNotificationRepo::default();
        let transport = Arc::new(FakeTransport::default());
        notifications.enqueue(1, Role::Client, "first").await.unwrap();
        notifications.enqueue(1, Role::Client, "second").await.unwrap();

        let count = delivery(notifications.clone(), transport.clone())
            .deliver_pending(1, Role::Client)
            .await
            .unwrap();

        assert_eq!(count, 2);
        let texts = transport.texts_to(1);
        assert_eq!(texts, vec!["You have unread notifications:", "first", "second"]);
        assert_eq!(notifications.unread_count(1, Role::Client).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_queue_sends_nothing() {
        let transport = Arc::new(FakeTransport::default());
        let count = delivery(FakeNotificationRepo::default(), transport.clone())
            .deliver_pending(1, Role::Client)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert!(transport.texts_to(1).is_empty());
    }

    #[tokio::test]
    async fn test_only_matching_role_is_drained() {
        let notifications = FakeNotificationRepo::default();
        let transport = Arc::new(FakeTransport::default());
        notifications.enqueue(1, Role::Client, "for client").await.unwrap();
        notifications.enqueue(1, Role::Provider, "for provider").await.unwrap();

        delivery(notifications.clone(), transport.clone())
            .deliver_pending(1, Role::Client)
            .await
            .unwrap();

        assert_eq!(notifications.unread_count(1, Role::Client).await.unwrap(), 0);
        assert_eq!(notifications.unread_count(1, Role::Provider).await.unwrap(), 1);
        assert!(!transport.texts_to(1).contains(&"for provider".to_string()));
    }

    #[tokio::test]
    async fn test_markup_failure_strips_instead_of_dropping() {
        let notifications = FakeNotificationRepo::default();
        let transport = Arc::new(FakeTransport::default());
        transport.reject_markup_for(1);
        notifications
            .enqueue(1, Role::Provider, "<b>New booking</b>")
            .await
            .unwrap();

        delivery(notifications.clone(), transport.clone())
            .deliver_pending(1, Role::Provider)
            .await
            .unwrap();

        let texts = transport.texts_to(1);
        assert!(texts.contains(&"bNew booking/b".to_string()));
        assert_eq!(notifications.unread_count(1, Role::Provider).await.unwrap(), 0);
    }

    #[test]
    fn test_truncate_body_caps_long_text() {
        let long = "x".repeat(5000);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), 4000);
        assert!(truncated.ends_with("..."));

        let short = "hello";
        assert_eq!(truncate_body(short), "hello");
    }
}
