//! Login session management routes

use axum::{
    Extension, Json,
    extract::{ConnectInfo, Path, Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use serde_json::json;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::{CurrentAdmin, client_ip};
use crate::models::SessionResponse;
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

/// Paginated session listing with search across token, IP, and user agent
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["token.view"])?;

    let (items, total) = state.session_repository.list(&query).await?;
    Ok(Json(Page::new(items, &query, total)))
}

/// Single session
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["token.view"])?;

    let session = state
        .session_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    Ok(Json(SessionResponse::from(session)))
}

/// Sessions belonging to one admin
pub async fn by_admin(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["token.view"])?;

    let sessions = state.session_repository.find_by_admin(id).await?;
    Ok(Json(sessions))
}

/// Revoke a session, recording the acting admin and requesting IP
pub async fn revoke(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["token.revoke"])?;

    let ip = client_ip(&headers, &addr);
    state.session_repository.revoke(id, ctx.id, &ip).await?;

    Ok(Json(json!({ "message": "Session revoked successfully" })))
}

/// Hard-delete a session row
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["token.delete"])?;

    state.session_repository.delete(id).await?;

    Ok(Json(json!({ "message": "Session deleted successfully" })))
}
