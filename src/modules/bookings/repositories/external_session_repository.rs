use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::bookings::models::ExternalSession;

/// Repository for external calendar linkage rows
pub struct ExternalSessionRepository {
    pool: MySqlPool,
}

impl ExternalSessionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, session: &ExternalSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO external_session (booking_id, calendar_kind, external_event_id)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(session.booking_id)
        .bind(&session.calendar_kind)
        .bind(&session.external_event_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to record external session: {}", e)))?;

        Ok(())
    }

    pub async fn find_by_booking_id(&self, booking_id: i64) -> Result<Option<ExternalSession>> {
        let session = sqlx::query_as::<_, ExternalSession>(
            r#"
            SELECT booking_id, calendar_kind, external_event_id, created_at
            FROM external_session
            WHERE booking_id = ?
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch external session: {}", e)))?;

        Ok(session)
    }

    pub async fn delete_by_booking_id(&self, booking_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM external_session WHERE booking_id = ?")
            .bind(booking_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to delete external session: {}", e)))?;

        Ok(())
    }
}
