//! Notification types.
//!
//! A notification is a durable, role-scoped text event for a user who was
//! offline when something happened. Rows are append-only; the read flag is
//! the only mutation, flipped in one batch when the owner next authenticates
//! under the matching role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::Role;

/// A queued text event for a `(user, role)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub role: Role,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
