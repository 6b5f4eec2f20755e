//! SQLite session store implementation.
//!
//! One row per user: a state tag plus a JSON payload blob. `set` is a
//! read-merge-write (inbound events for one user are serialized by the
//! transport, so the read-modify-write cannot race with itself) followed by
//! an UPSERT. `clear` deletes the row; absent rows read as Idle/empty.

use chrono::Utc;
use sqlx::Row;
use tandem_core::session::SessionStore;
use tandem_types::error::RepositoryError;
use tandem_types::session::{Session, SessionPayload, SessionState};

use super::chat::format_datetime;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn load(&self, user_id: i64) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT state, payload FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state_tag: String = row
            .try_get("state")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let payload_json: String = row
            .try_get("payload")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let state: SessionState = state_tag
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let payload: SessionPayload = serde_json::from_str(&payload_json)
            .map_err(|e| RepositoryError::Query(format!("invalid session payload: {e}")))?;

        Ok(Some(Session { state, payload }))
    }
}

impl SessionStore for SqliteSessionStore {
    async fn get(&self, user_id: i64) -> Result<Session, RepositoryError> {
        Ok(self.load(user_id).await?.unwrap_or_default())
    }

    async fn set(
        &self,
        user_id: i64,
        state: SessionState,
        patch: SessionPayload,
    ) -> Result<(), RepositoryError> {
        let mut payload = self
            .load(user_id)
            .await?
            .map(|s| s.payload)
            .unwrap_or_default();
        payload.merge(patch);

        let payload_json = serde_json::to_string(&payload)
            .map_err(|e| RepositoryError::Query(format!("payload serialization: {e}")))?;

        sqlx::query(
            r#"INSERT INTO sessions (user_id, state, payload, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(user_id) DO UPDATE SET
                   state = excluded.state,
                   payload = excluded.payload,
                   updated_at = excluded.updated_at"#,
        )
        .bind(user_id)
        .bind(state.to_string())
        .bind(payload_json)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn clear(&self, user_id: i64) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
