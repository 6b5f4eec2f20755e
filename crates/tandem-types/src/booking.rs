//! Booking (service record) types.
//!
//! A booking is the committed outcome of the booking workflow: a provider, a
//! client, a service description, cost, address, date/time, and comments.
//! Once completed or cancelled the row is immutable.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a booking.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (status IN ('active', 'completed', 'cancelled'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Completed,
    Cancelled,
}

impl Default for BookingStatus {
    fn default() -> Self {
        BookingStatus::Active
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Active => write!(f, "active"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BookingStatus::Active),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("invalid booking status: '{other}'")),
        }
    }
}

/// A committed service record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub provider_id: i64,
    pub client_id: i64,
    pub service: String,
    /// Whole currency units.
    pub cost: i64,
    pub address: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub comments: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a booking; the store assigns id, status, and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub provider_id: i64,
    pub client_id: i64,
    pub service: String,
    pub cost: i64,
    pub address: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub comments: String,
}
