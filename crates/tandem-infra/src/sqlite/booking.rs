//! SQLite booking repository implementation.

use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::Row;
use tandem_core::repository::booking::BookingRepository;
use tandem_types::booking::{Booking, BookingStatus, NewBooking};
use tandem_types::error::RepositoryError;

use super::chat::{format_datetime, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `BookingRepository`.
#[derive(Clone)]
pub struct SqliteBookingRepository {
    pool: DatabasePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Booking.
struct BookingRow {
    id: i64,
    provider_id: i64,
    client_id: i64,
    service: String,
    cost: i64,
    address: String,
    service_date: String,
    service_time: String,
    comments: String,
    status: String,
    created_at: String,
}

impl BookingRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            provider_id: row.try_get("provider_id")?,
            client_id: row.try_get("client_id")?,
            service: row.try_get("service")?,
            cost: row.try_get("cost")?,
            address: row.try_get("address")?,
            service_date: row.try_get("service_date")?,
            service_time: row.try_get("service_time")?,
            comments: row.try_get("comments")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_booking(self) -> Result<Booking, RepositoryError> {
        let status: BookingStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;
        let date: NaiveDate = self
            .service_date
            .parse()
            .map_err(|_| RepositoryError::Query(format!("invalid date: '{}'", self.service_date)))?;
        let time = NaiveTime::parse_from_str(&self.service_time, "%H:%M")
            .map_err(|_| RepositoryError::Query(format!("invalid time: '{}'", self.service_time)))?;

        Ok(Booking {
            id: self.id,
            provider_id: self.provider_id,
            client_id: self.client_id,
            service: self.service,
            cost: self.cost,
            address: self.address,
            date,
            time,
            comments: self.comments,
            status,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: &NewBooking) -> Result<Booking, RepositoryError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO bookings
               (provider_id, client_id, service, cost, address, service_date, service_time, comments, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'active', ?)"#,
        )
        .bind(booking.provider_id)
        .bind(booking.client_id)
        .bind(&booking.service)
        .bind(booking.cost)
        .bind(&booking.address)
        .bind(booking.date.to_string())
        .bind(booking.time.format("%H:%M").to_string())
        .bind(&booking.comments)
        .bind(format_datetime(&now))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(Booking {
            id: result.last_insert_rowid(),
            provider_id: booking.provider_id,
            client_id: booking.client_id,
            service: booking.service.clone(),
            cost: booking.cost,
            address: booking.address.clone(),
            date: booking.date,
            time: booking.time,
            comments: booking.comments.clone(),
            status: BookingStatus::Active,
            created_at: now,
        })
    }

    async fn on_date(
        &self,
        provider_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT * FROM bookings
               WHERE provider_id = ? AND service_date = ? AND status != 'cancelled'
               ORDER BY service_time"#,
        )
        .bind(provider_id)
        .bind(date.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut bookings = Vec::with_capacity(rows.len());
        for row in &rows {
            let booking_row =
                BookingRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            bookings.push(booking_row.into_booking()?);
        }

        Ok(bookings)
    }

    async fn complete(&self, booking_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE bookings SET status = 'completed'
               WHERE id = ? AND provider_id = ? AND status = 'active'"#,
        )
        .bind(booking_id)
        .bind(provider_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn cancel(&self, booking_id: i64, provider_id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"UPDATE bookings SET status = 'cancelled'
               WHERE id = ? AND provider_id = ? AND status = 'active'"#,
        )
        .bind(booking_id)
        .bind(provider_id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_util::{insert_user, test_pool};

    const PROVIDER: i64 = 20;
    const CLIENT: i64 = 10;

    fn new_booking(time: &str, service: &str) -> NewBooking {
        NewBooking {
            provider_id: PROVIDER,
            client_id: CLIENT,
            service: service.to_string(),
            cost: 1500,
            address: "Main St 1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 12, 15).unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M").unwrap(),
            comments: "No comments".to_string(),
        }
    }

    async fn repo_with_users() -> SqliteBookingRepository {
        let pool = test_pool().await;
        insert_user(&pool, CLIENT, "000123").await;
        insert_user(&pool, PROVIDER, "654321").await;
        SqliteBookingRepository::new(pool)
    }

    #[tokio::test]
    async fn test_create_roundtrips_date_and_time() {
        let repo = repo_with_users().await;
        let created = repo.create(&new_booking("14:30", "Haircut")).await.unwrap();
        assert_eq!(created.status, BookingStatus::Active);

        let on_date = repo
            .on_date(PROVIDER, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap())
            .await
            .unwrap();
        assert_eq!(on_date.len(), 1);
        assert_eq!(on_date[0].id, created.id);
        assert_eq!(on_date[0].time, NaiveTime::from_hms_opt(14, 30, 0).unwrap());
        assert_eq!(on_date[0].service, "Haircut");
    }

    #[tokio::test]
    async fn test_on_date_orders_by_time_and_skips_cancelled() {
        let repo = repo_with_users().await;
        repo.create(&new_booking("16:00", "Late")).await.unwrap();
        repo.create(&new_booking("09:00", "Early")).await.unwrap();
        let cancelled = repo.create(&new_booking("12:00", "Cancelled")).await.unwrap();
        repo.cancel(cancelled.id, PROVIDER).await.unwrap();

        let on_date = repo
            .on_date(PROVIDER, NaiveDate::from_ymd_opt(2025, 12, 15).unwrap())
            .await
            .unwrap();
        let services: Vec<&str> = on_date.iter().map(|b| b.service.as_str()).collect();
        assert_eq!(services, vec!["Early", "Late"]);
    }

    #[tokio::test]
    async fn test_complete_and_cancel_verify_ownership_and_status() {
        let repo = repo_with_users().await;
        let booking = repo.create(&new_booking("10:00", "Trim")).await.unwrap();

        // Wrong provider: no transition.
        assert!(!repo.complete(booking.id, 999).await.unwrap());
        // Right provider: transitions once; the row is immutable afterwards.
        assert!(repo.complete(booking.id, PROVIDER).await.unwrap());
        assert!(!repo.complete(booking.id, PROVIDER).await.unwrap());
        assert!(!repo.cancel(booking.id, PROVIDER).await.unwrap());
    }
}
