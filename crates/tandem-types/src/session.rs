//! Per-user session state: a workflow state tag plus a free-form payload map.
//!
//! The state tag is a closed enumeration scoped per workflow; the payload
//! carries data between steps of the same workflow (partially entered booking
//! fields, the counterpart of a live chat, the role chosen at login).
//! `set` replaces the tag but merges the payload; `clear` is the only
//! sanctioned reset path.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use std::fmt;
use std::str::FromStr;

use crate::user::Role;

/// Payload keys used by the orchestration core.
pub mod keys {
    /// Role chosen at login; preserved across workflow completion and chat close.
    pub const ROLE: &str = "role";
    /// Row id of the live chat (while in a chat).
    pub const CHAT_ID: &str = "chat_id";
    /// User id of the other party (chat relay target / booking counterpart).
    pub const COUNTERPART_ID: &str = "counterpart_id";
    /// Set when the booking counterpart was prefilled from a chat pairing.
    pub const FROM_CHAT: &str = "from_chat";
    pub const SERVICE: &str = "service";
    pub const COST: &str = "cost";
    pub const ADDRESS: &str = "address";
    pub const DATE: &str = "date";
    pub const TIME: &str = "time";
}

/// Steps of the booking data-collection pipeline, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    CollectingCounterpart,
    CollectingServiceName,
    CollectingCost,
    CollectingAddress,
    CollectingDate,
    CollectingTime,
    CollectingComments,
}

/// Current workflow state of a user's session.
///
/// Stored as a text tag in the SQLite `sessions` table; `Display`/`FromStr`
/// round-trip every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No workflow in progress. Unknown users are treated as Idle.
    Idle,
    /// Client has been asked for a provider's public code.
    AwaitingProviderCode,
    /// Live chat relay (either role; the payload identifies the counterpart).
    InChat,
    /// Mid-booking, at the given step.
    Booking(BookingStep),
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::AwaitingProviderCode => write!(f, "awaiting_provider_code"),
            SessionState::InChat => write!(f, "in_chat"),
            SessionState::Booking(step) => {
                let tag = match step {
                    BookingStep::CollectingCounterpart => "counterpart",
                    BookingStep::CollectingServiceName => "service",
                    BookingStep::CollectingCost => "cost",
                    BookingStep::CollectingAddress => "address",
                    BookingStep::CollectingDate => "date",
                    BookingStep::CollectingTime => "time",
                    BookingStep::CollectingComments => "comments",
                };
                write!(f, "booking:{tag}")
            }
        }
    }
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(SessionState::Idle),
            "awaiting_provider_code" => Ok(SessionState::AwaitingProviderCode),
            "in_chat" => Ok(SessionState::InChat),
            other => {
                let step = other
                    .strip_prefix("booking:")
                    .ok_or_else(|| format!("invalid session state: '{other}'"))?;
                let step = match step {
                    "counterpart" => BookingStep::CollectingCounterpart,
                    "service" => BookingStep::CollectingServiceName,
                    "cost" => BookingStep::CollectingCost,
                    "address" => BookingStep::CollectingAddress,
                    "date" => BookingStep::CollectingDate,
                    "time" => BookingStep::CollectingTime,
                    "comments" => BookingStep::CollectingComments,
                    unknown => return Err(format!("invalid booking step: '{unknown}'")),
                };
                Ok(SessionState::Booking(step))
            }
        }
    }
}

/// Free-form key/value payload carried alongside the state tag.
///
/// Merging is additive: a patch overwrites keys it names and leaves the rest
/// untouched, so earlier workflow steps' data stays visible to later steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionPayload(Map<String, Value>);

impl SessionPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge `patch` into this payload, overwriting keys the patch names.
    pub fn merge(&mut self, patch: SessionPayload) {
        for (k, v) in patch.0 {
            self.0.insert(k, v);
        }
    }

    pub fn insert(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.0.get(key).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    // Typed accessors for the keys the core reads on hot paths.

    pub fn role(&self) -> Option<Role> {
        self.get_str(keys::ROLE).and_then(|s| s.parse().ok())
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.get_i64(keys::CHAT_ID)
    }

    pub fn counterpart_id(&self) -> Option<i64> {
        self.get_i64(keys::COUNTERPART_ID)
    }

    // Builder-style constructors for patches.

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_role(self, role: Role) -> Self {
        self.with(keys::ROLE, Value::String(role.to_string()))
    }

    pub fn with_chat_id(self, chat_id: i64) -> Self {
        self.with(keys::CHAT_ID, Value::from(chat_id))
    }

    pub fn with_counterpart_id(self, counterpart_id: i64) -> Self {
        self.with(keys::COUNTERPART_ID, Value::from(counterpart_id))
    }
}

/// A user's session row: state tag plus payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub state: SessionState,
    pub payload: SessionPayload,
}

impl Session {
    /// A fresh Idle session with an empty payload (the shape `clear` produces
    /// and the shape unknown users are treated as having).
    pub fn idle() -> Self {
        Self::default()
    }
}
