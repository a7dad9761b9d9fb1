use actix_web::{dev::Payload, FromRequest, HttpRequest};
use std::future::{ready, Ready};
use std::str::FromStr;

use crate::core::{AppError, Role};

/// Identity of the caller, as established by the edge gateway.
///
/// Session/token mechanics live upstream; this service trusts the
/// `X-User-Id` and `X-User-Role` headers injected after authentication.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext {
    pub user_id: i64,
    pub role: Role,
}

impl AuthContext {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}

impl FromRequest for AuthContext {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_auth_context(req))
    }
}

fn extract_auth_context(req: &HttpRequest) -> Result<AuthContext, AppError> {
    let user_id = req
        .headers()
        .get("X-User-Id")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing X-User-Id header".to_string()))?
        .parse::<i64>()
        .map_err(|_| AppError::Unauthorized("Invalid X-User-Id header".to_string()))?;

    if user_id <= 0 {
        return Err(AppError::Unauthorized(
            "X-User-Id must be a positive integer".to_string(),
        ));
    }

    let role = req
        .headers()
        .get("X-User-Role")
        .and_then(|h| h.to_str().ok())
        .map(Role::from_str)
        .transpose()?
        .unwrap_or(Role::Customer);

    Ok(AuthContext { user_id, role })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_extracts_identity_from_headers() {
        let req = TestRequest::default()
            .insert_header(("X-User-Id", "42"))
            .insert_header(("X-User-Role", "staff"))
            .to_http_request();

        let ctx = extract_auth_context(&req).unwrap();
        assert_eq!(ctx.user_id, 42);
        assert_eq!(ctx.role, Role::Staff);
    }

    #[test]
    fn test_role_defaults_to_customer() {
        let req = TestRequest::default()
            .insert_header(("X-User-Id", "7"))
            .to_http_request();

        let ctx = extract_auth_context(&req).unwrap();
        assert_eq!(ctx.role, Role::Customer);
    }

    #[test]
    fn test_missing_user_id_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        assert!(extract_auth_context(&req).is_err());
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let req = TestRequest::default()
            .insert_header(("X-User-Id", "7"))
            .insert_header(("X-User-Role", "owner"))
            .to_http_request();

        assert!(extract_auth_context(&req).is_err());
    }
}
