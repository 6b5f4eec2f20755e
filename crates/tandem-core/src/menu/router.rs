//! Role resolution with an explicit ambiguity case.
//!
//! The primary source is the `role` field in the session payload, set at
//! login and re-asserted by handlers that know it. The payload can
//! legitimately lose that marker (process restart with the in-memory session
//! store), so a narrow fallback heuristic compares unread-notification counts
//! between the two roles: a strict majority in exactly one role resolves to
//! that role. Anything else is ambiguous and the caller must ask the user --
//! the router never guesses, because silently presenting the wrong role's
//! controls is worse than one extra question.

use tandem_types::error::RepositoryError;
use tandem_types::session::Session;
use tandem_types::user::Role;

use crate::repository::notification::NotificationRepository;

/// Outcome of a menu resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleResolution {
    /// Show this role's menu.
    Menu(Role),
    /// Ambiguous; ask the user to pick, showing unread counts per role.
    Ask { client_count: u64, provider_count: u64 },
}

/// Resolves "return to home screen" requests to a role-scoped menu.
pub struct RoleRouter<N> {
    notifications: N,
}

impl<N: NotificationRepository> RoleRouter<N> {
    pub fn new(notifications: N) -> Self {
        Self { notifications }
    }

    /// Resolve the menu for a user given their current session.
    pub async fn resolve(
        &self,
        user_id: i64,
        session: &Session,
    ) -> Result<RoleResolution, RepositoryError> {
        if let Some(role) = session.payload.role() {
            return Ok(RoleResolution::Menu(role));
        }

        let client_count = self.notifications.unread_count(user_id, Role::Client).await?;
        let provider_count = self
            .notifications
            .unread_count(user_id, Role::Provider)
            .await?;

        if provider_count > 0 && client_count == 0 {
            Ok(RoleResolution::Menu(Role::Provider))
        } else if client_count > 0 && provider_count == 0 {
            Ok(RoleResolution::Menu(Role::Client))
        } else {
            Ok(RoleResolution::Ask { client_count, provider_count })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeNotificationRepo;
    use tandem_types::session::{SessionPayload, SessionState};

    fn session_with_role(role: Role) -> Session {
        Session {
            state: SessionState::Idle,
            payload: SessionPayload::new().with_role(role),
        }
    }

    #[tokio::test]
    async fn test_payload_role_wins() {
        let notifications = FakeNotificationRepo::default();
        // Even with provider-side notifications queued, the payload decides.
        notifications.enqueue(1, Role::Provider, "x").await.unwrap();
        let router = RoleRouter::new(notifications);

        let resolution = router
            .resolve(1, &session_with_role(Role::Client))
            .await
            .unwrap();
        assert_eq!(resolution, RoleResolution::Menu(Role::Client));
    }

    #[tokio::test]
    async fn test_majority_heuristic_resolves() {
        let notifications = FakeNotificationRepo::default();
        notifications.enqueue(1, Role::Provider, "a").await.unwrap();
        notifications.enqueue(1, Role::Provider, "b").await.unwrap();
        let router = RoleRouter::new(notifications);

        let resolution = router.resolve(1, &Session::idle()).await.unwrap();
        assert_eq!(resolution, RoleResolution::Menu(Role::Provider));
    }

    #[tokio::test]
    async fn test_both_zero_asks() {
        let router = RoleRouter::new(FakeNotificationRepo::default());
        let resolution = router.resolve(1, &Session::idle()).await.unwrap();
        assert_eq!(
            resolution,
            RoleResolution::Ask { client_count: 0, provider_count: 0 }
        );
    }

    #[tokio::test]
    async fn test_both_nonzero_asks() {
        let notifications = FakeNotificationRepo::default();
        notifications.enqueue(1, Role::Client, "a").await.unwrap();
        notifications.enqueue(1, Role::Provider, "b").await.unwrap();
        let router = RoleRouter::new(notifications);

        let resolution = router.resolve(1, &Session::idle()).await.unwrap();
        assert_eq!(
            resolution,
            RoleResolution::Ask { client_count: 1, provider_count: 1 }
        );
    }
}
