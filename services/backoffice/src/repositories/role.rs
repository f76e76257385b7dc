//! Role repository

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{NewRole, Permission, Role, RoleWithCounts, RoleWithPermissions, UpdateRole};
use crate::pagination::PageQuery;
use crate::repositories::admin::SUPERADMIN_SLUG;
use crate::validation::slugify;

const ROLE_COLUMNS: &str =
    "id, name, slug, description, is_default, is_active, created_at, updated_at";

const COUNT_COLUMNS: &str = "(SELECT COUNT(*) FROM admin_roles ar WHERE ar.role_id = roles.id) AS admin_count, \
     (SELECT COUNT(*) FROM role_permissions rp WHERE rp.role_id = roles.id) AS permission_count";

/// Sort keys accepted by the role listing
const SORT_KEYS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("slug", "slug"),
    ("created_at", "created_at"),
];

/// Role repository
#[derive(Clone)]
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    /// Create a new role repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a role by ID
    pub async fn find_by_id(&self, id: Uuid) -> ApiResult<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }

    /// Find a role by slug
    pub async fn find_by_slug(&self, slug: &str) -> ApiResult<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>(&format!("SELECT {ROLE_COLUMNS} FROM roles WHERE slug = $1"))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }

    /// Paginated role listing with name search and an active filter; each
    /// row carries its assignment and grant counts
    pub async fn list(&self, query: &PageQuery) -> ApiResult<(Vec<RoleWithCounts>, i64)> {
        let pattern = query.search_pattern();
        let is_active = query.active_flag()?;
        let sort = query.sort_column(SORT_KEYS, "id")?;
        let order = query.order().as_sql();

        let filter = "WHERE name ILIKE $1 AND ($2::bool IS NULL OR is_active = $2)";

        let total =
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM roles {filter}"))
                .bind(&pattern)
                .bind(is_active)
                .fetch_one(&self.pool)
                .await?;

        let roles = sqlx::query_as::<_, RoleWithCounts>(&format!(
            "SELECT {ROLE_COLUMNS}, {COUNT_COLUMNS} FROM roles {filter} \
             ORDER BY {sort} {order} LIMIT $3 OFFSET $4"
        ))
        .bind(&pattern)
        .bind(is_active)
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok((roles, total))
    }

    /// Role with its assignment and grant counts
    pub async fn find_with_counts(&self, id: Uuid) -> ApiResult<Option<RoleWithCounts>> {
        let role = sqlx::query_as::<_, RoleWithCounts>(&format!(
            "SELECT {ROLE_COLUMNS}, {COUNT_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role)
    }

    /// Permissions granted to a role
    pub async fn permissions_of(&self, id: Uuid) -> ApiResult<Vec<Permission>> {
        let permissions = sqlx::query_as::<_, Permission>(
            "SELECT p.id, p.name, p.slug, p.group_name, p.group_order, p.sort_order, \
                    p.is_active, p.created_at, p.updated_at \
             FROM role_permissions rp \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = $1 \
             ORDER BY p.group_order, p.sort_order",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(permissions)
    }

    /// Permission slugs granted to a role
    pub async fn permission_slugs(&self, id: Uuid) -> ApiResult<Vec<String>> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

        let slugs = sqlx::query_scalar::<_, String>(
            "SELECT p.slug FROM role_permissions rp \
             JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = $1 \
             ORDER BY p.group_order, p.sort_order",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }

    /// Create a role and its permission grants in one transaction
    pub async fn create(&self, new: &NewRole) -> ApiResult<Role> {
        let slug = slugify(&new.name);
        info!("Creating role: {} ({})", new.name, slug);

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM roles WHERE name = $1 OR slug = $2",
        )
        .bind(&new.name)
        .bind(&slug)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict("Role already exists".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let role = sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, slug, description, is_default, is_active) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&slug)
        .bind(&new.description)
        .bind(new.is_default)
        .bind(new.is_active)
        .fetch_one(&mut *tx)
        .await?;

        for permission_id in &new.permissions {
            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
                .bind(role.id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(role)
    }

    /// Update a role; permission grants are replaced when provided. All
    /// writes run in one transaction.
    pub async fn update(&self, id: Uuid, upd: &UpdateRole) -> ApiResult<()> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

        let (name, slug) = match &upd.name {
            Some(name) => (name.clone(), slugify(name)),
            None => (current.name.clone(), current.slug.clone()),
        };

        let existing = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM roles WHERE id <> $1 AND (name = $2 OR slug = $3)",
        )
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Err(ApiError::Conflict("Role already exists".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE roles SET \
                 name = $2, \
                 slug = $3, \
                 description = COALESCE($4, description), \
                 is_default = COALESCE($5, is_default), \
                 is_active = COALESCE($6, is_active), \
                 updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&name)
        .bind(&slug)
        .bind(&upd.description)
        .bind(upd.is_default)
        .bind(upd.is_active)
        .execute(&mut *tx)
        .await?;

        if let Some(permissions) = &upd.permissions {
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for permission_id in permissions {
                sqlx::query(
                    "INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)",
                )
                .bind(id)
                .bind(permission_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete a role. Refused while any admin holds it; the superadmin
    /// role is additionally protected as a structural invariant.
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let role = self
            .find_with_counts(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

        if role.role.slug == SUPERADMIN_SLUG && role.admin_count > 0 {
            return Err(ApiError::Forbidden(
                "The superadmin role cannot be deleted".to_string(),
            ));
        }

        if role.admin_count > 0 {
            return Err(ApiError::Conflict(format!(
                "Role is assigned to {} admin(s) and cannot be deleted",
                role.admin_count
            )));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Deleted role {} ({})", id, role.role.slug);
        Ok(())
    }

    /// Toggle a role's active flag. The superadmin role is protected once
    /// assigned.
    pub async fn toggle_status(&self, id: Uuid) -> ApiResult<bool> {
        let role = self
            .find_with_counts(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Role not found".to_string()))?;

        if role.role.slug == SUPERADMIN_SLUG && role.admin_count > 0 {
            return Err(ApiError::Forbidden(
                "The superadmin role's status cannot be changed".to_string(),
            ));
        }

        let new_state = !role.role.is_active;
        sqlx::query("UPDATE roles SET is_active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(new_state)
            .execute(&self.pool)
            .await?;

        Ok(new_state)
    }

    /// All active roles with their permissions
    pub async fn get_all_active(&self) -> ApiResult<Vec<RoleWithPermissions>> {
        let roles = sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE is_active = TRUE ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(roles.len());
        for role in roles {
            let permissions = self.permissions_of(role.id).await?;
            items.push(RoleWithPermissions { role, permissions });
        }

        Ok(items)
    }
}
