//! Permission management routes

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentAdmin;
use crate::models::{NewPermission, UpdatePermission};
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;

/// Paginated permission listing with search across name, slug, and group
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.view"])?;

    let (items, total) = state.permission_repository.list(&query).await?;
    Ok(Json(Page::new(items, &query, total)))
}

/// All active, non-deleted permissions in catalogue order
pub async fn all(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.view"])?;

    let items = state.permission_repository.get_all_active().await?;
    Ok(Json(items))
}

/// Create a permission; the slug is derived from the name
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Json(payload): Json<NewPermission>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.create"])?;

    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Permission name is required".to_string(),
        ));
    }
    if payload.group_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Permission group is required".to_string(),
        ));
    }

    let permission = state.permission_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

/// Single permission with its grant counts
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.view"])?;

    let permission = state
        .permission_repository
        .find_with_counts(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

    Ok(Json(permission))
}

/// Partial update; renaming re-derives the slug
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePermission>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.update"])?;

    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(ApiError::Validation(
                "Permission name is required".to_string(),
            ));
        }
    }

    state.permission_repository.update(id, &payload).await?;

    Ok(Json(json!({ "message": "Permission updated successfully" })))
}

/// Soft-delete a permission; refused while any grant references it
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.delete"])?;

    state.permission_repository.soft_delete(id, ctx.id).await?;

    Ok(Json(json!({ "message": "Permission deleted successfully" })))
}

/// Clear a permission's soft-delete state
pub async fn restore(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.restore"])?;

    state.permission_repository.restore(id).await?;

    Ok(Json(json!({ "message": "Permission restored successfully" })))
}

/// Hard-delete a permission with zero outstanding grants
pub async fn force_remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.delete"])?;

    state.permission_repository.hard_delete(id).await?;

    Ok(Json(json!({ "message": "Permission permanently deleted" })))
}

/// Toggle a permission's active flag; refused while referenced
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["permission.status"])?;

    let is_active = state.permission_repository.toggle_status(id).await?;

    Ok(Json(json!({
        "message": "Status changed successfully",
        "is_active": is_active,
    })))
}
