use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::calendar::models::Credential;

/// Repository for stored OAuth credentials
pub struct CredentialRepository {
    pool: MySqlPool,
}

impl CredentialRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, user_id: i64, integration: &str) -> Result<Option<Credential>> {
        let credential = sqlx::query_as::<_, Credential>(
            r#"
            SELECT user_id, integration, access_token, refresh_token,
                   provider_data, updated_at
            FROM credential
            WHERE user_id = ? AND integration = ?
            "#,
        )
        .bind(user_id)
        .bind(integration)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch credential: {}", e)))?;

        Ok(credential)
    }

    /// Persist a refreshed access token
    pub async fn update_access_token(
        &self,
        user_id: i64,
        integration: &str,
        access_token: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE credential
            SET access_token = ?, updated_at = NOW()
            WHERE user_id = ? AND integration = ?
            "#,
        )
        .bind(access_token)
        .bind(user_id)
        .bind(integration)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to update access token: {}", e)))?;

        Ok(())
    }
}
