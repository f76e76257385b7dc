//! Application state shared across handlers

use sqlx::PgPool;

use crate::jwt::JwtService;
use crate::repositories::{
    AdminRepository, PermissionRepository, RoleRepository, SessionRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub admin_repository: AdminRepository,
    pub role_repository: RoleRepository,
    pub permission_repository: PermissionRepository,
    pub session_repository: SessionRepository,
}

impl AppState {
    pub fn new(db_pool: PgPool, jwt_service: JwtService) -> Self {
        AppState {
            admin_repository: AdminRepository::new(db_pool.clone()),
            role_repository: RoleRepository::new(db_pool.clone()),
            permission_repository: PermissionRepository::new(db_pool.clone()),
            session_repository: SessionRepository::new(db_pool.clone()),
            db_pool,
            jwt_service,
        }
    }
}
