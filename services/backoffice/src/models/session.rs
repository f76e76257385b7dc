//! Login session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Session entity: a signed token pair plus client metadata representing
/// one authenticated login
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub token: String,
    pub refresh_token: String,
    pub ip: String,
    pub user_agent: String,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<Uuid>,
    pub revoked_by_ip: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Session payload returned to clients; raw tokens are never echoed back
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionResponse {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub ip: String,
    pub user_agent: String,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoked_by: Option<Uuid>,
    pub revoked_by_ip: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(s: Session) -> Self {
        SessionResponse {
            id: s.id,
            admin_id: s.admin_id,
            ip: s.ip,
            user_agent: s.user_agent,
            expires_at: s.expires_at,
            is_revoked: s.is_revoked,
            revoked_at: s.revoked_at,
            revoked_by: s.revoked_by,
            revoked_by_ip: s.revoked_by_ip,
            created_at: s.created_at,
        }
    }
}
