use chrono::{DateTime, Utc};
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::bookings::models::{Booking, BookingStatus};

/// Repository for booking persistence
///
/// The slot-occupancy queries treat any non-cancelled row as occupying its
/// (branch, stylist, start_time) slot.
pub struct BookingRepository {
    pool: MySqlPool,
}

impl BookingRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a new booking and return it with its assigned id.
    ///
    /// The unique index on active (branch, stylist, start_time) rows backs
    /// up the application-level slot check; a concurrent duplicate insert
    /// surfaces as a conflict here.
    pub async fn create(&self, booking: &Booking) -> Result<Booking> {
        let result = sqlx::query(
            r#"
            INSERT INTO booking (
                branch_id, stylist_id, service_id, customer_id,
                start_time, status, total_price, currency
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.branch_id)
        .bind(booking.stylist_id)
        .bind(booking.service_id)
        .bind(booking.customer_id)
        .bind(booking.start_time)
        .bind(booking.status)
        .bind(booking.total_price)
        .bind(booking.currency)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::conflict(
                "The requested slot has already been booked".to_string(),
            ),
            other => AppError::Database(other),
        })?;

        let id = result.last_insert_id() as i64;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal("Booking was created but not found"))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, branch_id, stylist_id, service_id, customer_id,
                   start_time, status, total_price, currency,
                   created_at, updated_at
            FROM booking
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch booking: {}", e)))?;

        Ok(booking)
    }

    /// Find a non-cancelled booking occupying the exact slot, if any.
    pub async fn find_active_by_slot(
        &self,
        branch_id: i64,
        stylist_id: i64,
        start_time: DateTime<Utc>,
    ) -> Result<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, branch_id, stylist_id, service_id, customer_id,
                   start_time, status, total_price, currency,
                   created_at, updated_at
            FROM booking
            WHERE branch_id = ? AND stylist_id = ? AND start_time = ?
              AND status != 'cancelled'
            "#,
        )
        .bind(branch_id)
        .bind(stylist_id)
        .bind(start_time)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to check slot occupancy: {}", e)))?;

        Ok(booking)
    }

    /// Move a booking from `from` to `to`. Returns false when the row was
    /// not in the expected status.
    pub async fn transition(
        &self,
        id: i64,
        from: BookingStatus,
        to: BookingStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE booking
            SET status = ?, updated_at = NOW()
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to update booking status: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// Start times occupied by non-cancelled bookings inside [from, to)
    pub async fn booked_start_times(
        &self,
        branch_id: i64,
        stylist_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT start_time
            FROM booking
            WHERE branch_id = ? AND stylist_id = ?
              AND start_time >= ? AND start_time < ?
              AND status != 'cancelled'
            "#,
        )
        .bind(branch_id)
        .bind(stylist_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to list booked slots: {}", e)))?;

        Ok(rows.into_iter().map(|(t,)| t).collect())
    }

    /// Confirmed bookings whose start time passed the completion cutoff
    pub async fn list_confirmed_started_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.list_by_status_started_before(BookingStatus::Confirmed, cutoff)
            .await
    }

    /// Pending bookings whose start time has already passed
    pub async fn list_pending_started_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        self.list_by_status_started_before(BookingStatus::Pending, cutoff)
            .await
    }

    async fn list_by_status_started_before(
        &self,
        status: BookingStatus,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT id, branch_id, stylist_id, service_id, customer_id,
                   start_time, status, total_price, currency,
                   created_at, updated_at
            FROM booking
            WHERE status = ? AND start_time < ?
            ORDER BY start_time
            "#,
        )
        .bind(status)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to list bookings for sweep: {}", e)))?;

        Ok(bookings)
    }

    /// Confirmed bookings starting inside [from, to) with no reminder row yet
    pub async fn list_confirmed_needing_reminder(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.id, b.branch_id, b.stylist_id, b.service_id, b.customer_id,
                   b.start_time, b.status, b.total_price, b.currency,
                   b.created_at, b.updated_at
            FROM booking b
            LEFT JOIN notification n
              ON n.booking_id = b.id AND n.kind = 'booking_reminder'
            WHERE b.status = 'confirmed'
              AND b.start_time >= ? AND b.start_time < ?
              AND n.id IS NULL
            ORDER BY b.start_time
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to list reminder candidates: {}", e)))?;

        Ok(bookings)
    }
}
