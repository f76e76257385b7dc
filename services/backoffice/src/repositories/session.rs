//! Login session repository

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::jwt::TokenPair;
use crate::models::{Session, SessionResponse};
use crate::pagination::PageQuery;

const SESSION_COLUMNS: &str = "id, admin_id, token, refresh_token, ip, user_agent, expires_at, \
     is_revoked, revoked_at, revoked_by, revoked_by_ip, created_at, updated_at";

const RESPONSE_COLUMNS: &str = "id, admin_id, ip, user_agent, expires_at, is_revoked, \
     revoked_at, revoked_by, revoked_by_ip, created_at";

/// Sort keys accepted by the session listing
const SORT_KEYS: &[(&str, &str)] = &[
    ("id", "id"),
    ("ip", "ip"),
    ("user_agent", "user_agent"),
    ("expires_at", "expires_at"),
    ("created_at", "created_at"),
];

/// Session repository
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist the session issued at login and stamp the admin's last
    /// login. Both writes run in one transaction so a persistence failure
    /// fails the whole login with no partial session state.
    pub async fn create_login_session(
        &self,
        admin_id: Uuid,
        pair: &TokenPair,
        ip: &str,
        user_agent: &str,
    ) -> ApiResult<Session> {
        let expires_at = Utc::now() + Duration::seconds(pair.expires_in as i64);

        let mut tx = self.pool.begin().await?;

        let session = sqlx::query_as::<_, Session>(&format!(
            "INSERT INTO sessions (admin_id, token, refresh_token, ip, user_agent, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(admin_id)
        .bind(&pair.access_token)
        .bind(&pair.refresh_token)
        .bind(ip)
        .bind(user_agent)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE admins SET last_login = NOW() WHERE id = $1")
            .bind(admin_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Created session {} for admin {}", session.id, admin_id);
        Ok(session)
    }

    /// Find a session by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Find a session by its access token
    pub async fn find_by_token(&self, token: &str) -> ApiResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE token = $1"
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Paginated session listing with search across token, client IP, and
    /// user agent. Raw tokens are matched but never returned.
    pub async fn list(&self, query: &PageQuery) -> ApiResult<(Vec<SessionResponse>, i64)> {
        let pattern = query.search_pattern();
        let sort = query.sort_column(SORT_KEYS, "id")?;
        let order = query.order().as_sql();

        let filter = "WHERE (token ILIKE $1 OR ip ILIKE $1 OR user_agent ILIKE $1)";

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM sessions {filter}"))
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

        let sessions = sqlx::query_as::<_, SessionResponse>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM sessions {filter} \
             ORDER BY {sort} {order} LIMIT $2 OFFSET $3"
        ))
        .bind(&pattern)
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok((sessions, total))
    }

    /// Sessions belonging to one admin, newest first
    pub async fn find_by_admin(&self, admin_id: Uuid) -> ApiResult<Vec<SessionResponse>> {
        let sessions = sqlx::query_as::<_, SessionResponse>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM sessions WHERE admin_id = $1 ORDER BY created_at DESC"
        ))
        .bind(admin_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    /// Revoke the session carrying the given access token. Revoking an
    /// already-revoked session is accepted as success; a revoked session
    /// is never un-revoked through this path.
    pub async fn revoke_by_token(&self, token: &str, ip: &str) -> ApiResult<()> {
        let session = self
            .find_by_token(token)
            .await?
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        if session.is_revoked {
            return Ok(());
        }

        self.mark_revoked(session.id, None, ip).await
    }

    /// Revoke a session by ID, recording the acting admin and requesting
    /// IP. Idempotent like [`revoke_by_token`](Self::revoke_by_token).
    pub async fn revoke(&self, id: Uuid, actor: Uuid, ip: &str) -> ApiResult<()> {
        let session = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        if session.is_revoked {
            return Ok(());
        }

        self.mark_revoked(session.id, Some(actor), ip).await
    }

    async fn mark_revoked(&self, id: Uuid, actor: Option<Uuid>, ip: &str) -> ApiResult<()> {
        sqlx::query(
            "UPDATE sessions SET is_revoked = TRUE, revoked_at = NOW(), revoked_by = $2, \
                 revoked_by_ip = $3, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(actor)
        .bind(ip)
        .execute(&self.pool)
        .await?;

        info!("Revoked session {} from {}", id, ip);
        Ok(())
    }

    /// Hard-delete a session row
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("Deleted session {}", id);
        Ok(())
    }
}
