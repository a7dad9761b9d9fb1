use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::webhooks::models::{WebhookEvent, WebhookSource};

/// Repository for the durable webhook queue
pub struct WebhookEventRepository {
    pool: MySqlPool,
}

impl WebhookEventRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Enqueue a raw event for asynchronous processing
    pub async fn enqueue(&self, event: &WebhookEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO webhook_event (id, source, headers, payload, forwarded)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.id)
        .bind(event.source)
        .bind(&event.headers)
        .bind(&event.payload)
        .bind(event.forwarded)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to enqueue webhook event: {}", e)))?;

        Ok(())
    }

    /// Oldest unforwarded events, for the downstream consumer
    pub async fn list_pending(&self, limit: i64) -> Result<Vec<WebhookEvent>> {
        let events = sqlx::query_as::<_, WebhookEvent>(
            r#"
            SELECT id, source, headers, payload, forwarded, received_at
            FROM webhook_event
            WHERE forwarded = FALSE
            ORDER BY received_at
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to list webhook events: {}", e)))?;

        Ok(events)
    }

    pub async fn mark_forwarded(&self, id: &str) -> Result<()> {
        sqlx::query("UPDATE webhook_event SET forwarded = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::internal(format!("Failed to mark event forwarded: {}", e)))?;

        Ok(())
    }

    /// Find an event by source, for queue inspection
    pub async fn count_pending(&self, source: WebhookSource) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM webhook_event
            WHERE source = ? AND forwarded = FALSE
            "#,
        )
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to count webhook events: {}", e)))?;

        Ok(count.0)
    }
}
