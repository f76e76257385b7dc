//! Permission model and related payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Permission entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub group_name: String,
    pub group_order: i32,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New permission creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct NewPermission {
    pub name: String,
    pub group_name: String,
    #[serde(default)]
    pub group_order: i32,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Permission update payload
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdatePermission {
    pub name: Option<String>,
    pub group_name: Option<String>,
    pub group_order: Option<i32>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Permission together with its grant counts
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PermissionWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub permission: Permission,
    pub admin_count: i64,
    pub role_count: i64,
}
