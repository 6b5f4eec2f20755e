//! SQLite notification repository implementation.
//!
//! The notifications table is append-only; `mark_read` is the only mutation.
//! `pending` orders by creation time then row id so that items enqueued
//! within the same instant keep their insertion order.

use chrono::Utc;
use sqlx::Row;
use tandem_core::repository::notification::NotificationRepository;
use tandem_types::error::RepositoryError;
use tandem_types::notification::Notification;
use tandem_types::user::Role;

use super::chat::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `NotificationRepository`.
#[derive(Clone)]
pub struct SqliteNotificationRepository {
    pool: DatabasePool,
}

impl SqliteNotificationRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Notification.
struct NotificationRow {
    id: i64,
    user_id: i64,
    role: String,
    body: String,
    is_read: i64,
    created_at: String,
}

impl NotificationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            role: row.try_get("role")?,
            body: row.try_get("body")?,
            is_read: row.try_get("is_read")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_notification(self) -> Result<Notification, RepositoryError> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            role,
            body: self.body,
            is_read: self.is_read != 0,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl NotificationRepository for SqliteNotificationRepository {
    async fn enqueue(&self, user_id: i64, role: Role, body: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO notifications (user_id, role, body, is_read, created_at)
               VALUES (?, ?, ?, 0, ?)"#,
        )
        .bind(user_id)
        .bind(role.to_string())
        .bind(body)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn pending(&self, user_id: i64, role: Role) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM notifications
               WHERE user_id = ? AND role = ? AND is_read = 0
               ORDER BY created_at, id"#,
        )
        .bind(user_id)
        .bind(role.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in &rows {
            let notification_row = NotificationRow::from_row(row)
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
            notifications.push(notification_row.into_notification()?);
        }

        Ok(notifications)
    }

    async fn mark_read(&self, user_id: i64, role: Role) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND role = ? AND is_read = 0",
        )
        .bind(user_id)
        .bind(role.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn unread_count(&self, user_id: i64, role: Role) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COUNT(*) as cnt FROM notifications WHERE user_id = ? AND role = ? AND is_read = 0",
        )
        .bind(user_id)
        .bind(role.to_string())
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}
