use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::notifications::models::Notification;

/// Repository for outbound notification records
pub struct NotificationRepository {
    pool: MySqlPool,
}

impl NotificationRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notification (
                id, customer_id, booking_id, kind, channel, body, sent
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(notification.customer_id)
        .bind(notification.booking_id)
        .bind(notification.kind)
        .bind(notification.channel)
        .bind(&notification.body)
        .bind(notification.sent)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to record notification: {}", e)))?;

        Ok(())
    }
}
