//! BookingRepository trait definition.

use chrono::NaiveDate;
use tandem_types::booking::{Booking, NewBooking};
use tandem_types::error::RepositoryError;

/// Repository trait for booking (service record) persistence.
pub trait BookingRepository: Send + Sync {
    /// Create a booking in the `Active` status.
    fn create(
        &self,
        booking: &NewBooking,
    ) -> impl std::future::Future<Output = Result<Booking, RepositoryError>> + Send;

    /// Non-cancelled bookings for a provider on a date, ordered by time.
    ///
    /// Used as advisory context before accepting a time slot; nothing
    /// enforces slot uniqueness.
    fn on_date(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<Vec<Booking>, RepositoryError>> + Send;

    /// `Active -> Completed`, verifying provider ownership.
    fn complete(
        &self,
        booking_id: i64,
        provider_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// `Active -> Cancelled`, verifying provider ownership.
    fn cancel(
        &self,
        booking_id: i64,
        provider_id: i64,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
