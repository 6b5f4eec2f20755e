//! Chat pairing types.
//!
//! A `ChatSession` pairs exactly one client with one provider. The lifecycle
//! is `RequestPending -> Active -> Closed`, with `Rejected` as a second
//! terminal state distinguished only for user-facing copy. The status column
//! is the single source of truth for "does this user have a live chat":
//! a chat is live while its state is non-terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::user::Role;

/// Lifecycle state of a chat pairing.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('request_pending', 'active', 'closed', 'rejected'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    RequestPending,
    Active,
    Closed,
    Rejected,
}

impl ChatState {
    /// Terminal states admit no further transitions; for every invariant
    /// `Rejected` behaves exactly like `Closed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ChatState::Closed | ChatState::Rejected)
    }
}

impl fmt::Display for ChatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatState::RequestPending => write!(f, "request_pending"),
            ChatState::Active => write!(f, "active"),
            ChatState::Closed => write!(f, "closed"),
            ChatState::Rejected => write!(f, "rejected"),
        }
    }
}

impl FromStr for ChatState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request_pending" => Ok(ChatState::RequestPending),
            "active" => Ok(ChatState::Active),
            "closed" => Ok(ChatState::Closed),
            "rejected" => Ok(ChatState::Rejected),
            other => Err(format!("invalid chat state: '{other}'")),
        }
    }
}

/// A pairing between one client and one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: i64,
    pub client_id: i64,
    pub provider_id: i64,
    pub state: ChatState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// The other participant, or `None` if `user_id` is not a participant.
    pub fn counterpart_of(&self, user_id: i64) -> Option<i64> {
        if user_id == self.client_id {
            Some(self.provider_id)
        } else if user_id == self.provider_id {
            Some(self.client_id)
        } else {
            None
        }
    }

    /// Which role `user_id` plays in this pairing, if any.
    ///
    /// When a user paired with themselves (permitted for providers booking
    /// their own slots), the client role wins: relay traffic never flows in a
    /// self-pairing, so the distinction is cosmetic.
    pub fn role_of(&self, user_id: i64) -> Option<Role> {
        if user_id == self.client_id {
            Some(Role::Client)
        } else if user_id == self.provider_id {
            Some(Role::Provider)
        } else {
            None
        }
    }
}
