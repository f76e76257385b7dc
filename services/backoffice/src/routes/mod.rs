//! HTTP routes for the back-office API
//!
//! Everything except registration, login, and the health probe sits behind
//! the auth middleware; each handler declares the permission slugs it
//! requires against the caller's resolved set.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;

use crate::middleware::auth_middleware;
use crate::state::AppState;

mod admins;
mod auth;
mod permissions;
mod roles;
mod sessions;

/// Create the router for the back-office API
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/profile", get(auth::profile))
        .route("/auth/verify", get(auth::verify))
        .route("/admins", get(admins::list).post(admins::create))
        .route("/admins/all", get(admins::all))
        .route(
            "/admins/:id",
            get(admins::get).put(admins::update).delete(admins::remove),
        )
        .route("/admins/:id/permissions", get(admins::permissions))
        .route("/admins/:id/force", delete(admins::force_remove))
        .route("/admins/:id/status", post(admins::toggle_status))
        .route("/roles", get(roles::list).post(roles::create))
        .route("/roles/all", get(roles::all))
        .route(
            "/roles/:id",
            get(roles::get).put(roles::update).delete(roles::remove),
        )
        .route("/roles/:id/permissions", get(roles::permissions))
        .route("/roles/:id/status", post(roles::toggle_status))
        .route(
            "/permissions",
            get(permissions::list).post(permissions::create),
        )
        .route("/permissions/all", get(permissions::all))
        .route(
            "/permissions/:id",
            get(permissions::get)
                .put(permissions::update)
                .delete(permissions::remove),
        )
        .route("/permissions/:id/restore", post(permissions::restore))
        .route("/permissions/:id/force", delete(permissions::force_remove))
        .route("/permissions/:id/status", post(permissions::toggle_status))
        .route("/sessions", get(sessions::list))
        .route("/sessions/:id", get(sessions::get).delete(sessions::remove))
        .route("/sessions/:id/revoke", post(sessions::revoke))
        .route("/sessions/admin/:id", get(sessions::by_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

/// Service liveness and database connectivity
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(json!({
        "status": "ok",
        "service": "backoffice",
        "database": database,
    }))
}
