use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::payments::models::{Payment, PaymentStatus};

/// Repository for payment persistence
///
/// Status updates are guarded by the expected current status so that
/// transitions stay monotonic even under concurrent callback delivery.
pub struct PaymentRepository {
    pool: MySqlPool,
}

impl PaymentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Insert a new payment row. The UNIQUE constraint on booking_id keeps
    /// payments one-to-one with bookings.
    pub async fn create(&self, payment: &Payment) -> Result<Payment> {
        sqlx::query(
            r#"
            INSERT INTO payment (
                id, booking_id, method, status, amount, currency, provider_ref
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(payment.booking_id)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(&payment.provider_ref)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::conflict(format!(
                    "Payment already exists for booking {}",
                    payment.booking_id
                ))
            }
            other => AppError::Database(other),
        })?;

        self.find_by_id(&payment.id)
            .await?
            .ok_or_else(|| AppError::internal("Payment was created but not found"))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, method, status, amount, currency,
                   provider_ref, created_at, updated_at
            FROM payment
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch payment: {}", e)))?;

        Ok(payment)
    }

    pub async fn find_by_booking_id(&self, booking_id: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, method, status, amount, currency,
                   provider_ref, created_at, updated_at
            FROM payment
            WHERE booking_id = ?
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch payment by booking: {}", e)))?;

        Ok(payment)
    }

    /// Move a payment from `from` to `to`. Returns false when the row was
    /// not in the expected status (someone else transitioned it first).
    pub async fn transition(
        &self,
        id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment
            SET status = ?, updated_at = NOW()
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to update payment status: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// Guarded transition that also replaces the provider correlation id
    /// (e.g. Stripe session id upgraded to the payment-intent id).
    pub async fn transition_with_ref(
        &self,
        id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
        provider_ref: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payment
            SET status = ?, provider_ref = COALESCE(?, provider_ref), updated_at = NOW()
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to)
        .bind(provider_ref)
        .bind(id)
        .bind(from)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to update payment: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    /// Persist the provider correlation issued at payment creation
    pub async fn set_provider_ref(&self, id: &str, provider_ref: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE payment
            SET provider_ref = ?, updated_at = NOW()
            WHERE id = ?
            "#,
        )
        .bind(provider_ref)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to set provider ref: {}", e)))?;

        Ok(())
    }
}
