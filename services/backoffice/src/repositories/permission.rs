//! Permission repository

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{NewPermission, Permission, PermissionWithCounts, UpdatePermission};
use crate::pagination::PageQuery;
use crate::validation::slugify;

const PERMISSION_COLUMNS: &str =
    "id, name, slug, group_name, group_order, sort_order, is_active, created_at, updated_at";

const COUNT_COLUMNS: &str = "(SELECT COUNT(*) FROM admin_permissions ap WHERE ap.permission_id = permissions.id) AS admin_count, \
     (SELECT COUNT(*) FROM role_permissions rp WHERE rp.permission_id = permissions.id) AS role_count";

/// Sort keys accepted by the permission listing
const SORT_KEYS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("slug", "slug"),
    ("group_name", "group_name"),
    ("group_order", "group_order"),
    ("sort_order", "sort_order"),
    ("created_at", "created_at"),
];

/// Permission repository
#[derive(Clone)]
pub struct PermissionRepository {
    pool: PgPool,
}

impl PermissionRepository {
    /// Create a new permission repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a permission by ID, soft-deleted rows included
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Permission>> {
        let permission = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

    /// Non-deleted permission with its grant counts
    pub async fn find_with_counts(&self, id: Uuid) -> ApiResult<Option<PermissionWithCounts>> {
        let permission = sqlx::query_as::<_, PermissionWithCounts>(&format!(
            "SELECT {PERMISSION_COLUMNS}, {COUNT_COLUMNS} FROM permissions \
             WHERE id = $1 AND deleted = FALSE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(permission)
    }

    /// How many roles and admins currently hold the permission
    pub async fn reference_counts(&self, id: Uuid) -> ApiResult<(i64, i64)> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT (SELECT COUNT(*) FROM role_permissions rp WHERE rp.permission_id = $1), \
                    (SELECT COUNT(*) FROM admin_permissions ap WHERE ap.permission_id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }

    /// Paginated permission listing with search across name, slug, and
    /// group, status/deleted filters, and per-row grant counts
    pub async fn list(&self, query: &PageQuery) -> ApiResult<(Vec<PermissionWithCounts>, i64)> {
        let pattern = query.search_pattern();
        let is_active = query.active_flag()?;
        let deleted = query.deleted_flag()?.unwrap_or(false);
        let sort = query.sort_column(SORT_KEYS, "id")?;
        let order = query.order().as_sql();

        let filter = "WHERE (name ILIKE $1 OR slug ILIKE $1 OR group_name ILIKE $1) \
             AND ($2::bool IS NULL OR is_active = $2) \
             AND deleted = $3";

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM permissions {filter}"))
                .bind(&pattern)
                .bind(is_active)
                .bind(deleted)
                .fetch_one(&self.pool)
                .await?;

        let permissions = sqlx::query_as::<_, PermissionWithCounts>(&format!(
            "SELECT {PERMISSION_COLUMNS}, {COUNT_COLUMNS} FROM permissions {filter} \
             ORDER BY {sort} {order} LIMIT $4 OFFSET $5"
        ))
        .bind(&pattern)
        .bind(is_active)
        .bind(deleted)
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok((permissions, total))
    }

    /// All active, non-deleted permissions in catalogue order
    pub async fn get_all_active(&self) -> ApiResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(&format!(
            "SELECT {PERMISSION_COLUMNS} FROM permissions \
             WHERE is_active = TRUE AND deleted = FALSE \
             ORDER BY group_order, sort_order"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Create a permission; the slug is derived from the name
    pub async fn create(&self, new: &NewPermission) -> ApiResult<Permission> {
        let slug = slugify(&new.name);
        info!("Creating permission: {} ({})", new.name, slug);

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM permissions WHERE name = $1 OR slug = $2",
        )
        .bind(&new.name)
        .bind(&slug)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict("Permission already exists".to_string()));
        }

        let permission = sqlx::query_as::<_, Permission>(&format!(
            "INSERT INTO permissions (name, slug, group_name, group_order, sort_order, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {PERMISSION_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&slug)
        .bind(&new.group_name)
        .bind(new.group_order)
        .bind(new.sort_order)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(permission)
    }

    /// Update a permission; renaming re-derives the slug
    pub async fn update(&self, id: Uuid, upd: &UpdatePermission) -> ApiResult<()> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

        let (name, slug) = match &upd.name {
            Some(name) => (name.clone(), slugify(name)),
            None => (current.name.clone(), current.slug.clone()),
        };

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM permissions WHERE id <> $1 AND (name = $2 OR slug = $3)",
        )
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict("Permission already exists".to_string()));
        }

        sqlx::query(
            "UPDATE permissions SET \
                 name = $2, \
                 slug = $3, \
                 group_name = COALESCE($4, group_name), \
                 group_order = COALESCE($5, group_order), \
                 sort_order = COALESCE($6, sort_order), \
                 is_active = COALESCE($7, is_active), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .bind(&upd.group_name)
        .bind(upd.group_order)
        .bind(upd.sort_order)
        .bind(upd.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Refuse mutation while any role or admin still holds the permission
    async fn check_unreferenced(&self, id: Uuid, action: &str) -> ApiResult<()> {
        let (role_count, admin_count) = self.reference_counts(id).await?;

        if role_count > 0 || admin_count > 0 {
            return Err(ApiError::Conflict(format!(
                "Permission is granted to {} role(s) and {} admin(s) and cannot be {}",
                role_count, admin_count, action
            )));
        }

        Ok(())
    }

    /// Soft-delete a permission (flag, timestamp, acting admin). Refused
    /// while any grant references it.
    pub async fn soft_delete(&self, id: Uuid, actor: Uuid) -> ApiResult<()> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

        self.check_unreferenced(id, "deleted").await?;

        sqlx::query(
            "UPDATE permissions SET deleted = TRUE, deleted_at = NOW(), deleted_by = $2 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(actor)
        .execute(&self.pool)
        .await?;

        info!("Soft-deleted permission {}", id);
        Ok(())
    }

    /// Clear a permission's soft-delete state
    pub async fn restore(&self, id: Uuid) -> ApiResult<()> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

        sqlx::query(
            "UPDATE permissions SET deleted = FALSE, deleted_at = NULL, deleted_by = NULL, \
                 deleted_reason = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        info!("Restored permission {}", id);
        Ok(())
    }

    /// Hard-delete a permission. Requires zero outstanding grants.
    pub async fn hard_delete(&self, id: Uuid) -> ApiResult<()> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

        self.check_unreferenced(id, "deleted").await?;

        sqlx::query("DELETE FROM permissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        info!("Hard-deleted permission {}", id);
        Ok(())
    }

    /// Toggle a permission's active flag. Refused while referenced, since
    /// disabling a granted permission would silently change access.
    pub async fn toggle_status(&self, id: Uuid) -> ApiResult<bool> {
        let permission = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Permission not found".to_string()))?;

        self.check_unreferenced(id, "toggled").await?;

        let new_state = !permission.is_active;
        sqlx::query("UPDATE permissions SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(new_state)
            .execute(&self.pool)
            .await?;

        Ok(new_state)
    }
}
