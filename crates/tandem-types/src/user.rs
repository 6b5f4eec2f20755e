//! User identity and role types.
//!
//! Every account can act in either of the two marketplace roles; the role is
//! chosen at login and carried in the session payload, never stored on the
//! user row itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Length of the public pairing code printed on a user's profile.
pub const PUBLIC_CODE_LEN: usize = 6;

/// The two marketplace roles a user can act in.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('client', 'provider'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Provider,
}

impl Role {
    /// The opposite role in a pairing.
    pub fn counterpart(self) -> Role {
        match self {
            Role::Client => Role::Provider,
            Role::Provider => Role::Client,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Client => write!(f, "client"),
            Role::Provider => write!(f, "provider"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "provider" => Ok(Role::Provider),
            other => Err(format!("invalid role: '{other}'")),
        }
    }
}

/// A registered account.
///
/// `user_id` is the external transport identity; `public_code` is the stable
/// 6-digit code other users type to pair with this account. The credential
/// hash is opaque to this system -- hashing and verification happen in the
/// authentication collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub public_code: String,
    pub credential_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First and last name joined, or `None` when both are absent.
    pub fn display_name(&self) -> Option<String> {
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if joined.is_empty() { None } else { Some(joined) }
    }
}

/// Whether `code` has the shape of a public pairing code: exactly 6 ASCII digits.
pub fn is_valid_public_code(code: &str) -> bool {
    code.len() == PUBLIC_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}
