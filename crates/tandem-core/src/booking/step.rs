//! Pure per-step logic of the booking pipeline.
//!
//! The transition table (`next_step`), the entering prompt per step, and the
//! per-step input validation live here with no transport or storage
//! dependency. Each validator owns exactly one input class; a failure
//! re-prompts the same step and discards nothing.

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tandem_types::session::{BookingStep, SessionPayload, keys};
use tandem_types::user::is_valid_public_code;
use thiserror::Error;

/// A rejected input for the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("malformed public code")]
    BadCode,
    #[error("malformed cost")]
    BadCost,
    #[error("malformed date")]
    BadDate,
    #[error("malformed time")]
    BadTime,
}

impl StepError {
    /// The re-prompt shown to the user; the step does not advance.
    pub fn reprompt(self) -> &'static str {
        match self {
            StepError::BadCode => "Invalid code format. Enter 6 digits:",
            StepError::BadCost => "Enter a whole number, digits only:",
            StepError::BadDate => "Invalid date format. Use DD.MM.YYYY or YYYY-MM-DD:",
            StepError::BadTime => "Invalid time format. Use HH:MM:",
        }
    }
}

/// The step after `step`, or `None` for the final (commit) step.
pub fn next_step(step: BookingStep) -> Option<BookingStep> {
    match step {
        BookingStep::CollectingCounterpart => Some(BookingStep::CollectingServiceName),
        BookingStep::CollectingServiceName => Some(BookingStep::CollectingCost),
        BookingStep::CollectingCost => Some(BookingStep::CollectingAddress),
        BookingStep::CollectingAddress => Some(BookingStep::CollectingDate),
        BookingStep::CollectingDate => Some(BookingStep::CollectingTime),
        BookingStep::CollectingTime => Some(BookingStep::CollectingComments),
        BookingStep::CollectingComments => None,
    }
}

/// The prompt shown when a step becomes current.
pub fn prompt(step: BookingStep) -> &'static str {
    match step {
        BookingStep::CollectingCounterpart => "Enter the client's 6-digit code:",
        BookingStep::CollectingServiceName => "Enter the service name:",
        BookingStep::CollectingCost => "Enter the service cost:",
        BookingStep::CollectingAddress => "Enter the service address:",
        BookingStep::CollectingDate => "Enter the date (e.g. 15.12.2025):",
        BookingStep::CollectingTime => "Enter the time (e.g. 14:30):",
        BookingStep::CollectingComments => "Enter comments (or '-' for none):",
    }
}

/// Non-negative whole-currency cost, digits only.
pub fn parse_cost(input: &str) -> Result<i64, StepError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StepError::BadCost);
    }
    trimmed.parse().map_err(|_| StepError::BadCost)
}

/// Date in either `DD.MM.YYYY` or `YYYY-MM-DD`.
pub fn parse_booking_date(input: &str) -> Result<NaiveDate, StepError> {
    let trimmed = input.trim();
    for format in ["%d.%m.%Y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(StepError::BadDate)
}

/// Time in `HH:MM`.
pub fn parse_booking_time(input: &str) -> Result<NaiveTime, StepError> {
    NaiveTime::parse_from_str(input.trim(), "%H:%M").map_err(|_| StepError::BadTime)
}

/// Validate `input` for `step` and produce the payload patch it contributes.
///
/// The counterpart step only validates the code format here (resolving it
/// needs the user repository) and the comments step contributes nothing (its
/// input feeds the commit directly); both return an empty patch.
pub fn collect(step: BookingStep, input: &str) -> Result<SessionPayload, StepError> {
    let patch = SessionPayload::new();
    match step {
        BookingStep::CollectingCounterpart => {
            if !is_valid_public_code(input.trim()) {
                return Err(StepError::BadCode);
            }
            Ok(patch)
        }
        BookingStep::CollectingServiceName => {
            Ok(patch.with(keys::SERVICE, json!(input.trim())))
        }
        BookingStep::CollectingCost => {
            let cost = parse_cost(input)?;
            Ok(patch.with(keys::COST, json!(cost)))
        }
        BookingStep::CollectingAddress => {
            Ok(patch.with(keys::ADDRESS, json!(input.trim())))
        }
        BookingStep::CollectingDate => {
            let date = parse_booking_date(input)?;
            Ok(patch.with(keys::DATE, json!(date.to_string())))
        }
        BookingStep::CollectingTime => {
            let time = parse_booking_time(input)?;
            Ok(patch.with(keys::TIME, json!(time.format("%H:%M").to_string())))
        }
        BookingStep::CollectingComments => Ok(patch),
    }
}
