//! Admin account repository

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{Admin, AdminDetail, AdminResponse, AdminWithRoles, NewAdmin, Role, UpdateAdmin};
use crate::pagination::PageQuery;
use crate::rbac;

/// Username that can never be status-toggled or deleted
pub const RESERVED_USERNAME: &str = "super_admin";

/// Role slug that protects its holders from deletion
pub const SUPERADMIN_SLUG: &str = "superadmin";

const ADMIN_COLUMNS: &str = "id, first_name, last_name, phone, username, email, password_hash, \
     photo, last_login, is_active, created_at, updated_at, created_by, updated_by, \
     deleted, deleted_at, deleted_by, deleted_reason";

const RESPONSE_COLUMNS: &str = "id, first_name, last_name, phone, username, email, photo, \
     last_login, is_active, created_at, updated_at, created_by, updated_by";

/// Sort keys accepted by the admin listing
const SORT_KEYS: &[(&str, &str)] = &[
    ("id", "id"),
    ("first_name", "first_name"),
    ("last_name", "last_name"),
    ("username", "username"),
    ("email", "email"),
    ("phone", "phone"),
    ("last_login", "last_login"),
    ("created_at", "created_at"),
];

/// Admin repository
#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    /// Create a new admin repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a plaintext secret with argon2
    pub fn hash_password(password: &str) -> ApiResult<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                ApiError::Internal
            })?
            .to_string();
        Ok(hash)
    }

    /// Compare a plaintext secret against an admin's stored hash
    pub fn verify_password(admin: &Admin, password: &str) -> ApiResult<bool> {
        let parsed_hash = PasswordHash::new(&admin.password_hash).map_err(|e| {
            tracing::error!("Failed to parse password hash: {}", e);
            ApiError::Internal
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Find an admin by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    /// Find a non-deleted admin by username, email, or phone
    pub async fn find_by_identifier(&self, identifier: &str) -> ApiResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins \
             WHERE (username = $1 OR email = $1 OR phone = $1) AND deleted = FALSE"
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    /// Paginated admin listing with search, status/deleted filters, and an
    /// optional role filter
    pub async fn list(&self, query: &PageQuery) -> ApiResult<(Vec<AdminWithRoles>, i64)> {
        let pattern = query.search_pattern();
        let is_active = query.active_flag()?;
        let deleted = query.deleted_flag()?.unwrap_or(false);
        let role_filter = query.role_filter()?;
        let sort = query.sort_column(SORT_KEYS, "id")?;
        let order = query.order().as_sql();

        let filter = "WHERE (COALESCE(first_name, '') ILIKE $1 \
                 OR COALESCE(last_name, '') ILIKE $1 \
                 OR COALESCE(username, '') ILIKE $1 \
                 OR COALESCE(email, '') ILIKE $1 \
                 OR COALESCE(phone, '') ILIKE $1) \
             AND ($2::bool IS NULL OR is_active = $2) \
             AND deleted = $3 \
             AND ($4::uuid[] IS NULL OR EXISTS ( \
                 SELECT 1 FROM admin_roles ar \
                 WHERE ar.admin_id = admins.id AND ar.role_id = ANY($4)))";

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM admins {filter}"
        ))
        .bind(&pattern)
        .bind(is_active)
        .bind(deleted)
        .bind(&role_filter)
        .fetch_one(&self.pool)
        .await?;

        let admins = sqlx::query_as::<_, AdminResponse>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM admins {filter} \
             ORDER BY {sort} {order} LIMIT $5 OFFSET $6"
        ))
        .bind(&pattern)
        .bind(is_active)
        .bind(deleted)
        .bind(&role_filter)
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let items = self.attach_roles(admins).await?;
        Ok((items, total))
    }

    /// All active, non-deleted admins with their roles
    pub async fn get_all_active(&self) -> ApiResult<Vec<AdminWithRoles>> {
        let admins = sqlx::query_as::<_, AdminResponse>(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM admins \
             WHERE is_active = TRUE AND deleted = FALSE ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_roles(admins).await
    }

    async fn attach_roles(&self, admins: Vec<AdminResponse>) -> ApiResult<Vec<AdminWithRoles>> {
        let ids: Vec<Uuid> = admins.iter().map(|a| a.id).collect();
        let mut roles_by_admin = self.roles_for(&ids).await?;

        Ok(admins
            .into_iter()
            .map(|admin| {
                let roles = roles_by_admin.remove(&admin.id).unwrap_or_default();
                AdminWithRoles { admin, roles }
            })
            .collect())
    }

    /// Roles assigned to each of the given admins
    pub async fn roles_for(&self, admin_ids: &[Uuid]) -> ApiResult<HashMap<Uuid, Vec<Role>>> {
        #[derive(sqlx::FromRow)]
        struct AssignmentRow {
            admin_id: Uuid,
            #[sqlx(flatten)]
            role: Role,
        }

        let rows = sqlx::query_as::<_, AssignmentRow>(
            "SELECT ar.admin_id, r.id, r.name, r.slug, r.description, r.is_default, \
                    r.is_active, r.created_at, r.updated_at \
             FROM admin_roles ar \
             JOIN roles r ON r.id = ar.role_id \
             WHERE ar.admin_id = ANY($1) \
             ORDER BY r.name",
        )
        .bind(admin_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<Uuid, Vec<Role>> = HashMap::new();
        for row in rows {
            map.entry(row.admin_id).or_default().push(row.role);
        }
        Ok(map)
    }

    /// Single-admin detail: roles plus the audit actor usernames resolved
    /// by an explicit lookup of the created_by/updated_by columns
    pub async fn find_detail(&self, id: Uuid) -> ApiResult<Option<AdminDetail>> {
        let Some(admin) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let roles = self
            .roles_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        let created_by_username = self.username_of(admin.created_by).await?;
        let updated_by_username = self.username_of(admin.updated_by).await?;

        Ok(Some(AdminDetail {
            admin: admin.into(),
            roles,
            created_by_username,
            updated_by_username,
        }))
    }

    async fn username_of(&self, id: Option<Uuid>) -> ApiResult<Option<String>> {
        let Some(id) = id else {
            return Ok(None);
        };

        let username = sqlx::query_scalar::<_, Option<String>>(
            "SELECT username FROM admins WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(username.flatten())
    }

    /// Create an admin and its role assignments in one transaction
    pub async fn create(&self, new: &NewAdmin, actor: Option<Uuid>) -> ApiResult<AdminResponse> {
        info!("Creating admin: {}", new.username);

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM admins WHERE email = $1 OR username = $2 OR phone = $3",
        )
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.phone)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict(
                "Admin with this username, email, or phone already exists".to_string(),
            ));
        }

        let password_hash = Self::hash_password(&new.password)?;

        let mut tx = self.pool.begin().await?;

        let admin = sqlx::query_as::<_, AdminResponse>(&format!(
            "INSERT INTO admins \
                 (first_name, last_name, phone, username, email, password_hash, photo, \
                  is_active, created_by, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9) \
             RETURNING {RESPONSE_COLUMNS}"
        ))
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone)
        .bind(&new.username)
        .bind(&new.email)
        .bind(&password_hash)
        .bind(&new.photo)
        .bind(new.is_active)
        .bind(actor)
        .fetch_one(&mut *tx)
        .await?;

        for role_id in &new.roles {
            sqlx::query("INSERT INTO admin_roles (admin_id, role_id) VALUES ($1, $2)")
                .bind(admin.id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(admin)
    }

    /// Update an admin; role assignments are replaced when provided. All
    /// writes run in one transaction.
    pub async fn update(&self, id: Uuid, upd: &UpdateAdmin, actor: Uuid) -> ApiResult<()> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM admins \
             WHERE id <> $1 AND (email = $2 OR username = $3 OR phone = $4)",
        )
        .bind(id)
        .bind(upd.email.as_deref().unwrap_or(""))
        .bind(upd.username.as_deref().unwrap_or(""))
        .bind(upd.phone.as_deref().unwrap_or(""))
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict(
                "Admin with this username, email, or phone already exists".to_string(),
            ));
        }

        let password_hash = match &upd.password {
            Some(password) => Some(Self::hash_password(password)?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE admins SET \
                 first_name = COALESCE($2, first_name), \
                 last_name = COALESCE($3, last_name), \
                 phone = COALESCE($4, phone), \
                 username = COALESCE($5, username), \
                 email = COALESCE($6, email), \
                 photo = COALESCE($7, photo), \
                 is_active = COALESCE($8, is_active), \
                 password_hash = COALESCE($9, password_hash), \
                 updated_by = $10, \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&upd.first_name)
        .bind(&upd.last_name)
        .bind(&upd.phone)
        .bind(&upd.username)
        .bind(&upd.email)
        .bind(&upd.photo)
        .bind(upd.is_active)
        .bind(&password_hash)
        .bind(actor)
        .execute(&mut *tx)
        .await?;

        if let Some(roles) = &upd.roles {
            sqlx::query("DELETE FROM admin_roles WHERE admin_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for role_id in roles {
                sqlx::query("INSERT INTO admin_roles (admin_id, role_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(role_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        info!("Updated admin {} ({})", id, current.username.unwrap_or_default());
        Ok(())
    }

    /// Whether the admin currently holds the given role slug
    pub async fn has_role_slug(&self, id: Uuid, slug: &str) -> ApiResult<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM admin_roles ar \
             JOIN roles r ON r.id = ar.role_id \
             WHERE ar.admin_id = $1 AND r.slug = $2",
        )
        .bind(id)
        .bind(slug)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Reject mutation of protected accounts. Runs before any delete or
    /// status change, regardless of the caller's permission level.
    async fn check_protected(&self, admin: &Admin) -> ApiResult<()> {
        if admin.username.as_deref() == Some(RESERVED_USERNAME) {
            return Err(ApiError::Forbidden(
                "The super admin account cannot be modified".to_string(),
            ));
        }

        if self.has_role_slug(admin.id, SUPERADMIN_SLUG).await? {
            return Err(ApiError::Forbidden(
                "Admins holding the superadmin role cannot be modified".to_string(),
            ));
        }

        Ok(())
    }

    /// Soft-delete an admin (flag, timestamp, acting admin)
    pub async fn soft_delete(&self, id: Uuid, actor: Uuid) -> ApiResult<()> {
        let admin = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        self.check_protected(&admin).await?;

        sqlx::query(
            "UPDATE admins SET deleted = TRUE, deleted_at = NOW(), deleted_by = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        info!("Soft-deleted admin {}", id);
        Ok(())
    }

    /// Hard-delete an admin together with its assignments, direct grants,
    /// and sessions
    pub async fn hard_delete(&self, id: Uuid) -> ApiResult<()> {
        let admin = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        self.check_protected(&admin).await?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM admin_roles WHERE admin_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM admin_permissions WHERE admin_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sessions WHERE admin_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Hard-deleted admin {}", id);
        Ok(())
    }

    /// Toggle an admin's active flag
    pub async fn toggle_status(&self, id: Uuid) -> ApiResult<bool> {
        let admin = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        if admin.username.as_deref() == Some(RESERVED_USERNAME) {
            return Err(ApiError::Forbidden(
                "The super admin account's status cannot be changed".to_string(),
            ));
        }

        let new_state = !admin.is_active;
        sqlx::query("UPDATE admins SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(new_state)
            .execute(&self.pool)
            .await?;

        Ok(new_state)
    }

    /// Resolve the admin's effective permission set: role-derived grants
    /// unioned with direct grants, deduplicated by slug.
    pub async fn aggregate_permissions(&self, id: Uuid) -> ApiResult<Vec<String>> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Admin not found".to_string()))?;

        let role_slugs = sqlx::query_scalar::<_, Option<String>>(
            "SELECT p.slug FROM admin_roles ar \
             JOIN role_permissions rp ON rp.role_id = ar.role_id \
             LEFT JOIN permissions p ON p.id = rp.permission_id \
             WHERE ar.admin_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let direct_slugs = sqlx::query_scalar::<_, Option<String>>(
            "SELECT p.slug FROM admin_permissions ap \
             LEFT JOIN permissions p ON p.id = ap.permission_id \
             WHERE ap.admin_id = $1",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rbac::merge_permission_slugs(
            role_slugs.into_iter().chain(direct_slugs),
        ))
    }
}
