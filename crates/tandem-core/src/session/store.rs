//! SessionStore trait and the in-memory implementation.
//!
//! The store is a pure key/value substrate: it never decides state
//! transitions itself. `set` fully replaces the state tag but merges the
//! payload patch into the existing payload, so earlier workflow steps' data
//! stays visible to later steps. `clear` resets to Idle/empty and is the
//! only sanctioned reset path. Unknown users read as Idle with an empty
//! payload -- there is no error case.

use dashmap::DashMap;
use tandem_types::error::RepositoryError;
use tandem_types::session::{Session, SessionPayload, SessionState};
use tandem_types::user::Role;

use std::sync::Arc;

/// Per-user workflow state storage.
///
/// The SQLite-backed implementation lives in `tandem-infra`.
pub trait SessionStore: Send + Sync {
    /// Current session for a user; Idle/empty when the user is unknown.
    fn get(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<Session, RepositoryError>> + Send;

    /// Replace the state tag and merge `patch` into the payload.
    fn set(
        &self,
        user_id: i64,
        state: SessionState,
        patch: SessionPayload,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Reset to Idle with an empty payload.
    fn clear(
        &self,
        user_id: i64,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Reset a session to Idle while keeping the role designation, if any.
///
/// Cancellation and chat close must not strand a user outside their
/// role-appropriate menu, so the role survives the reset. Returns the
/// preserved role.
pub async fn reset_preserving_role<S: SessionStore>(
    store: &S,
    user_id: i64,
) -> Result<Option<Role>, RepositoryError> {
    let role = store.get(user_id).await?.payload.role();
    store.clear(user_id).await?;
    if let Some(role) = role {
        store
            .set(user_id, SessionState::Idle, SessionPayload::new().with_role(role))
            .await?;
    }
    Ok(role)
}

/// In-memory session store backed by a concurrent map.
///
/// Suitable for tests and single-process deployments where sessions may be
/// lost on restart (the role-recovery heuristic in the role router exists
/// for exactly that case).
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<DashMap<i64, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    async fn get(&self, user_id: i64) -> Result<Session, RepositoryError> {
        Ok(self
            .inner
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn set(
        &self,
        user_id: i64,
        state: SessionState,
        patch: SessionPayload,
    ) -> Result<(), RepositoryError> {
        let mut entry = self.inner.entry(user_id).or_default();
        entry.state = state;
        entry.payload.merge(patch);
        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<(), RepositoryError> {
        self.inner.remove(&user_id);
        Ok(())
    }
}
