//! Authentication routes: registration, login, logout, profile, verify

use axum::{
    Extension, Json,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{CurrentAdmin, bearer_token, client_ip, user_agent};
use crate::models::{AdminResponse, NewAdmin};
use crate::repositories::AdminRepository;
use crate::state::AppState;
use crate::validation;

/// Registration payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token pair issued at login
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Current admin with the aggregated permission set
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub item: AdminResponse,
    pub permissions: Vec<String>,
}

/// Create an account and assign the default role
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_username(&payload.username)?;
    validation::validate_email(&payload.email)?;
    validation::validate_phone(&payload.phone)?;
    validation::validate_password(&payload.password)?;

    let default_role = state
        .role_repository
        .find_by_slug("user")
        .await?
        .ok_or_else(|| ApiError::Validation("Default role is not configured".to_string()))?;

    let new = NewAdmin {
        first_name: payload.first_name,
        last_name: payload.last_name,
        phone: payload.phone,
        username: payload.username,
        email: payload.email,
        password: payload.password,
        photo: None,
        is_active: true,
        roles: vec![default_role.id],
    };

    state.admin_repository.create(&new, None).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Register successful" })),
    ))
}

/// Verify credentials, issue the token pair, and persist the session
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    info!("Login attempt for {}", payload.username);

    let admin = state
        .admin_repository
        .find_by_identifier(&payload.username)
        .await?
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

    if !AdminRepository::verify_password(&admin, &payload.password)? {
        return Err(ApiError::InvalidCredentials);
    }

    if !admin.is_active {
        return Err(ApiError::AccountDisabled);
    }

    let pair = state.jwt_service.generate_token_pair(&admin).map_err(|e| {
        error!("Failed to generate tokens: {}", e);
        ApiError::Internal
    })?;

    state
        .session_repository
        .create_login_session(
            admin.id,
            &pair,
            &client_ip(&headers, &addr),
            &user_agent(&headers),
        )
        .await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: pair.expires_in,
    }))
}

/// Revoke the session carrying the presented token
pub async fn logout(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let token = bearer_token(&headers)?;
    let ip = client_ip(&headers, &addr);

    state.session_repository.revoke_by_token(token, &ip).await?;

    Ok(Json(json!({ "message": "Logout successful" })))
}

/// Current admin together with the permission set resolved for this
/// request
pub async fn profile(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
) -> ApiResult<Json<ProfileResponse>> {
    let admin = fetch_admin(&state, ctx.id).await?;

    Ok(Json(ProfileResponse {
        item: admin,
        permissions: ctx.permissions,
    }))
}

/// Session and active-flag check; the middleware has already rejected
/// invalid, revoked, and disabled callers
pub async fn verify(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
) -> ApiResult<Json<serde_json::Value>> {
    fetch_admin(&state, ctx.id).await?;

    Ok(Json(json!({ "message": "success" })))
}

async fn fetch_admin(state: &AppState, id: Uuid) -> ApiResult<AdminResponse> {
    let admin = state
        .admin_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

    Ok(admin.into())
}
