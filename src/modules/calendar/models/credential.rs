use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Stored OAuth credential for an external integration.
///
/// Owned by the auth/integration layer; the booking core only reads it,
/// plus the one opportunistic access-token refresh on a 401 response.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Credential {
    pub user_id: i64,

    /// Integration this credential belongs to ("google")
    pub integration: String,

    pub access_token: String,
    pub refresh_token: String,

    /// Arbitrary provider data blob (scopes, expiry, account info)
    pub provider_data: Option<serde_json::Value>,

    pub updated_at: Option<DateTime<Utc>>,
}

impl Credential {
    pub const GOOGLE: &'static str = "google";
}
