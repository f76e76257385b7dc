//! Admin account management routes

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
use crate::models::{NewAdmin, UpdateAdmin};
use crate::pagination::{Page, PageQuery};
use crate::state::AppState;
use crate::validation;

/// Paginated admin listing with search, sort, status/deleted filters, and
/// a role filter
pub async fn list(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.view"])?;

    let (items, total) = state.admin_repository.list(&query).await?;
    Ok(Json(Page::new(items, &query, total)))
}

/// All active, non-deleted admins with their roles
pub async fn all(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.view"])?;

    let items = state.admin_repository.get_all_active().await?;
    Ok(Json(items))
}

/// Create an admin with its role assignments
pub async fn create(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Json(payload): Json<NewAdmin>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.create"])?;

    validation::validate_username(&payload.username)?;
    validation::validate_email(&payload.email)?;
    validation::validate_phone(&payload.phone)?;
    validation::validate_password(&payload.password)?;

    let admin = state.admin_repository.create(&payload, Some(ctx.id)).await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Single admin with roles and resolved audit actors
pub async fn get(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.view"])?;

    let detail = state
        .admin_repository
        .find_detail(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

    Ok(Json(detail))
}

/// The admin's effective permission set, sorted for deterministic display
pub async fn permissions(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.view"])?;

    let mut slugs = state.admin_repository.aggregate_permissions(id).await?;
    slugs.sort();

    Ok(Json(json!({ "permissions": slugs })))
}

/// Partial update; role assignments are replaced when provided
pub async fn update(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAdmin>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.update"])?;

    if let Some(username) = &payload.username {
        validation::validate_username(username)?;
    }
    if let Some(email) = &payload.email {
        validation::validate_email(email)?;
    }
    if let Some(phone) = &payload.phone {
        validation::validate_phone(phone)?;
    }
    if let Some(password) = &payload.password {
        validation::validate_password(password)?;
    }

    state.admin_repository.update(id, &payload, ctx.id).await?;

    Ok(Json(json!({ "message": "Admin updated successfully" })))
}

/// Soft-delete an admin; protected accounts are refused
pub async fn remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.delete"])?;

    state.admin_repository.soft_delete(id, ctx.id).await?;

    Ok(Json(json!({ "message": "Admin deleted successfully" })))
}

/// Hard-delete an admin together with its assignments and sessions
pub async fn force_remove(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.delete"])?;

    state.admin_repository.hard_delete(id).await?;

    Ok(Json(json!({ "message": "Admin permanently deleted" })))
}

/// Toggle an admin's active flag
pub async fn toggle_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<CurrentAdmin>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    ctx.require_any(&["admin.status"])?;

    let is_active = state.admin_repository.toggle_status(id).await?;

    Ok(Json(json!({
        "message": "Status changed successfully",
        "is_active": is_active,
    })))
}
