//! Middleware for session token validation and authorization
//!
//! The auth middleware resolves the caller once per request: it validates
//! the bearer token, checks the persisted session, loads the admin, and
//! aggregates the effective permission set into [`CurrentAdmin`] in the
//! request extensions. Handlers declare their required permission slugs
//! against that context; no global request-identity state exists.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::net::SocketAddr;
use tracing::error;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::rbac;
use crate::state::AppState;

/// Authenticated caller context, resolved once per request
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: Uuid,
    pub username: Option<String>,
    /// Effective permission set: role-derived and direct grants,
    /// deduplicated by slug
    pub permissions: Vec<String>,
}

impl CurrentAdmin {
    /// Allow iff any one of the required slugs is present in the caller's
    /// resolved permission set
    pub fn require_any(&self, required: &[&str]) -> ApiResult<()> {
        if rbac::has_any_permission(&self.permissions, required) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not have permission to perform this action".to_string(),
            ))
        }
    }
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> ApiResult<&str> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::Unauthorized)
}

/// Requesting client IP: first hop of `X-Forwarded-For` when present,
/// otherwise the peer address
pub fn client_ip(headers: &HeaderMap, addr: &SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

/// Requesting client user agent, empty when absent
pub fn user_agent(headers: &HeaderMap) -> String {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Validate the bearer token and its persisted session, then attach the
/// caller's [`CurrentAdmin`] context to the request
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?;

    state.jwt_service.validate_access_token(token).map_err(|e| {
        error!("Failed to validate token: {}", e);
        ApiError::Unauthorized
    })?;

    // A valid signature is not enough: the session must exist, be
    // unrevoked, and be unexpired.
    let session = state
        .session_repository
        .find_by_token(token)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if session.is_revoked || session.expires_at <= Utc::now() {
        return Err(ApiError::Unauthorized);
    }

    let admin = state
        .admin_repository
        .find_by_id(session.admin_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if admin.deleted || !admin.is_active {
        return Err(ApiError::Unauthorized);
    }

    let permissions = state.admin_repository.aggregate_permissions(admin.id).await?;

    req.extensions_mut().insert(CurrentAdmin {
        id: admin.id,
        username: admin.username.clone(),
        permissions,
    });

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert!(bearer_token(&HeaderMap::new()).is_err());
        assert!(bearer_token(&headers_with_auth("Basic abc")).is_err());
        assert!(bearer_token(&headers_with_auth("Bearer ")).is_err());
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let addr: SocketAddr = "10.0.0.1:443".parse().unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.2"),
        );
        assert_eq!(client_ip(&headers, &addr), "203.0.113.7");

        assert_eq!(client_ip(&HeaderMap::new(), &addr), "10.0.0.1");
    }

    #[test]
    fn test_require_any() {
        let ctx = CurrentAdmin {
            id: Uuid::new_v4(),
            username: Some("editor".to_string()),
            permissions: vec!["kanban.view".to_string(), "profile.view".to_string()],
        };

        assert!(ctx.require_any(&["kanban.view"]).is_ok());
        assert!(ctx.require_any(&["admin.view", "profile.view"]).is_ok());
        assert!(matches!(
            ctx.require_any(&["admin.view"]),
            Err(ApiError::Forbidden(_))
        ));
    }
}
