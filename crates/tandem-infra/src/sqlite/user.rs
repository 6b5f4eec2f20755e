//! SQLite user repository implementation.
//!
//! Public pairing codes are random 6-digit strings; generation retries on a
//! unique-constraint collision. With a million possible codes the retry loop
//! is effectively bounded by the account count, but a hard attempt cap keeps
//! a pathological table from looping forever.

use chrono::Utc;
use rand::Rng;
use sqlx::Row;
use tandem_core::repository::user::UserRepository;
use tandem_types::error::RepositoryError;
use tandem_types::user::User;

use super::chat::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// Generation attempts before giving up on a free public code.
const MAX_CODE_ATTEMPTS: usize = 32;

/// SQLite-backed implementation of `UserRepository`.
#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// A fresh random 6-digit public code.
fn generate_public_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:06}")
}

/// Internal row type for mapping SQLite rows to domain User.
struct UserRow {
    user_id: i64,
    public_code: String,
    credential_hash: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: String,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            public_code: row.try_get("public_code")?,
            credential_hash: row.try_get("credential_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        Ok(User {
            user_id: self.user_id,
            public_code: self.public_code,
            credential_hash: self.credential_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create(&self, user_id: i64, credential_hash: &str) -> Result<User, RepositoryError> {
        let now = Utc::now();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_public_code();
            let result = sqlx::query(
                r#"INSERT INTO users (user_id, public_code, credential_hash, created_at)
                   VALUES (?, ?, ?, ?)"#,
            )
            .bind(user_id)
            .bind(&code)
            .bind(credential_hash)
            .bind(format_datetime(&now))
            .execute(&self.pool.writer)
            .await;

            match result {
                Ok(_) => {
                    return Ok(User {
                        user_id,
                        public_code: code,
                        credential_hash: credential_hash.to_string(),
                        first_name: None,
                        last_name: None,
                        created_at: now,
                    });
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    // A duplicate user_id is a real conflict; a duplicate
                    // public_code just means we drew a taken number.
                    if db_err.message().contains("user_id") {
                        return Err(RepositoryError::Conflict(format!(
                            "user {user_id} already exists"
                        )));
                    }
                    continue;
                }
                Err(e) => return Err(RepositoryError::Query(e.to_string())),
            }
        }

        Err(RepositoryError::Conflict(
            "could not allocate a free public code".to_string(),
        ))
    }

    async fn get(&self, user_id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_public_code(&self, code: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE public_code = ?")
            .bind(code)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let user_row =
                    UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(user_row.into_user()?))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_util::test_pool;
    use tandem_types::user::is_valid_public_code;

    #[tokio::test]
    async fn test_create_generates_valid_code() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let user = repo.create(42, "hash").await.unwrap();
        assert_eq!(user.user_id, 42);
        assert!(is_valid_public_code(&user.public_code));
    }

    #[tokio::test]
    async fn test_duplicate_user_id_conflicts() {
        let repo = SqliteUserRepository::new(test_pool().await);
        repo.create(42, "hash").await.unwrap();
        let err = repo.create(42, "hash").await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_by_public_code() {
        let repo = SqliteUserRepository::new(test_pool().await);
        let created = repo.create(42, "hash").await.unwrap();

        let found = repo.find_by_public_code(&created.public_code).await.unwrap().unwrap();
        assert_eq!(found.user_id, 42);

        assert!(repo.find_by_public_code("999999").await.unwrap().is_none()
            || created.public_code == "999999");
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let repo = SqliteUserRepository::new(test_pool().await);
        assert!(repo.get(7).await.unwrap().is_none());
    }
}
