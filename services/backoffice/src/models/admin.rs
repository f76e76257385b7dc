//! Admin account model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Role;

/// Admin account entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub photo: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
    pub deleted_reason: Option<String>,
}

/// New admin creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewAdmin {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub photo: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub roles: Vec<Uuid>,
}

fn default_true() -> bool {
    true
}

/// Admin update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateAdmin {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub photo: Option<String>,
    pub is_active: Option<bool>,
    pub roles: Option<Vec<Uuid>>,
}

/// Admin payload returned to clients, without the secret hash and
/// soft-delete bookkeeping
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AdminResponse {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub photo: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        AdminResponse {
            id: admin.id,
            first_name: admin.first_name,
            last_name: admin.last_name,
            phone: admin.phone,
            username: admin.username,
            email: admin.email,
            photo: admin.photo,
            last_login: admin.last_login,
            is_active: admin.is_active,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
            created_by: admin.created_by,
            updated_by: admin.updated_by,
        }
    }
}

/// Admin together with its assigned roles
#[derive(Debug, Clone, Serialize)]
pub struct AdminWithRoles {
    #[serde(flatten)]
    pub admin: AdminResponse,
    pub roles: Vec<Role>,
}

/// Single-admin detail view: roles plus the audit actors resolved by
/// explicit lookup of the created_by/updated_by id columns
#[derive(Debug, Clone, Serialize)]
pub struct AdminDetail {
    #[serde(flatten)]
    pub admin: AdminResponse,
    pub roles: Vec<Role>,
    pub created_by_username: Option<String>,
    pub updated_by_username: Option<String>,
}
