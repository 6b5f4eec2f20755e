//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `tandem-core` using sqlx with split
//! read/write pools. The accept/reject/close operations are single UPDATEs
//! whose WHERE clause re-checks id, ownership, and current status -- the
//! optimistic compare-and-verify that decides concurrent accept/reject races.

use chrono::{DateTime, Utc};
use sqlx::Row;
use tandem_core::repository::chat::ChatRepository;
use tandem_types::chat::{ChatSession, ChatState};
use tandem_types::error::RepositoryError;
use tandem_types::user::Role;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ChatRepository`.
#[derive(Clone)]
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatRow {
    id: i64,
    client_id: i64,
    provider_id: i64,
    status: String,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            client_id: row.try_get("client_id")?,
            provider_id: row.try_get("provider_id")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self) -> Result<ChatSession, RepositoryError> {
        let state: ChatState = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(ChatSession {
            id: self.id,
            client_id: self.client_id,
            provider_id: self.provider_id,
            state,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl ChatRepository for SqliteChatRepository {
    async fn create(
        &self,
        client_id: i64,
        provider_id: i64,
    ) -> Result<ChatSession, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO chats (client_id, provider_id, status, created_at, updated_at)
               VALUES (?, ?, 'request_pending', ?, ?)"#,
        )
        .bind(client_id)
        .bind(provider_id)
        .bind(format_datetime(&now))
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(ChatSession {
            id: result.last_insert_rowid(),
            client_id,
            provider_id,
            state: ChatState::RequestPending,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get(&self, chat_id: i64) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(chat_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn live_chat_for(
        &self,
        user_id: i64,
        role: Role,
    ) -> Result<Option<ChatSession>, RepositoryError> {
        let column = match role {
            Role::Client => "client_id",
            Role::Provider => "provider_id",
        };
        let sql = format!(
            "SELECT * FROM chats WHERE {column} = ? AND status IN ('request_pending', 'active') LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let chat_row =
                    ChatRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(chat_row.into_chat()?))
            }
            None => Ok(None),
        }
    }

    async fn activate(&self, chat_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE chats SET status = 'active', updated_at = ?
               WHERE id = ? AND provider_id = ? AND status = 'request_pending'"#,
        )
        .bind(format_datetime(&Utc::now()))
        .bind(chat_id)
        .bind(provider_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn reject(&self, chat_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE chats SET status = 'rejected', updated_at = ?
               WHERE id = ? AND provider_id = ? AND status = 'request_pending'"#,
        )
        .bind(format_datetime(&Utc::now()))
        .bind(chat_id)
        .bind(provider_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn close(&self, chat_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE chats SET status = 'closed', updated_at = ?
               WHERE id = ? AND status IN ('request_pending', 'active')"#,
        )
        .bind(format_datetime(&Utc::now()))
        .bind(chat_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}
