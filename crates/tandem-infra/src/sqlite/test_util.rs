//! Shared helpers for SQLite repository tests.

use chrono::Utc;

use super::pool::DatabasePool;

/// A fresh migrated pool backed by a temporary database file.
pub(crate) async fn test_pool() -> DatabasePool {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    // Leak tempdir so it lives for the test
    std::mem::forget(dir);
    DatabasePool::new(&url).await.unwrap()
}

/// Insert a user row (needed for FK constraints on chats/notifications/bookings).
pub(crate) async fn insert_user(pool: &DatabasePool, user_id: i64, public_code: &str) {
    sqlx::query(
        "INSERT INTO users (user_id, public_code, credential_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(public_code)
    .bind("test-hash")
    .bind(Utc::now().to_rfc3339())
    .execute(&pool.writer)
    .await
    .unwrap();
}
