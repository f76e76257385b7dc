//! Role management routes

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentAdmin;
use crate::models::{NewRole, Permission, RoleWithCounts, UpdateRole};
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

/// Single-role detail view: counts plus granted permissions
#[derive(Debug, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: RoleWithCounts,
    pub permissions: Vec<Permission>,
}

/// Paginated role listing with name search and per-row counts
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.view"])?;

    let (items, total) = state.role_repository.list(&query).await?;
    Ok(Json(Page::new(items, &query, total)))
}

/// All active roles with their permissions
pub async fn all(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.view"])?;

    let items = state.role_repository.get_all_active().await?;
    Ok(Json(items))
}

/// Create a role with its permission grants
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Json(payload): Json<NewRole>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.create"])?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("Role name is required".to_string()));
    }

    let role = state.role_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// Single role with counts and granted permissions
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.view"])?;

    let role = state
        .role_repository
        .find_with_counts(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

    let permissions = state.role_repository.permissions_of(id).await?;

    Ok(Json(RoleDetail { role, permissions }))
}

/// The role's granted permission slugs
pub async fn permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.view"])?;

    let slugs = state.role_repository.permission_slugs(id).await?;
    Ok(Json(json!({ "permissions": slugs })))
}

/// Rename a role and replace its grants
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRole>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.update"])?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("Role name is required".to_string()));
        }
    }

    state.role_repository.update(id, &payload).await?;

    Ok(Json(json!({ "message": "Role updated successfully" })))
}

/// Delete a role; refused while assigned, and the superadmin role is
/// structurally protected
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.delete"])?;

    state.role_repository.delete(id).await?;

    Ok(Json(json!({ "message": "Role deleted successfully" })))
}

/// Toggle a role's active flag
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["role.status"])?;

    let is_active = state.role_repository.toggle_status(id).await?;

    Ok(Json(json!({
        "message": "Status changed successfully",
        "is_active": is_active,
    })))
}
