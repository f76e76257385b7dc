//! Database seeding: the permission catalogue, the base roles, and their
//! admin accounts
//!
//! Seeding resets the RBAC tables and rebuilds them from the catalogue
//! below, all inside one transaction. The `superadmin` and `admin` roles
//! receive every permission; `editor` and `user` receive everything except
//! the management slugs in [`RESTRICTED_SLUGS`].

use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::repositories::AdminRepository;

struct PermissionSeed {
    name: &'static str,
    slug: &'static str,
    group: &'static str,
    group_order: i32,
    sort_order: i32,
}

struct RoleSeed {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    is_default: bool,
}

struct AdminSeed {
    first_name: &'static str,
    last_name: &'static str,
    username: &'static str,
    email: &'static str,
    phone: &'static str,
    role_slug: &'static str,
}

macro_rules! permission {
    ($name:literal, $slug:literal, $group:literal, $group_order:literal, $sort_order:literal) => {
        PermissionSeed {
            name: $name,
            slug: $slug,
            group: $group,
            group_order: $group_order,
            sort_order: $sort_order,
        }
    };
}

const PERMISSIONS: &[PermissionSeed] = &[
    permission!("Admin Dashboard", "admin.dashboard", "dashboard", 1, 1),
    // modules
    permission!("Admin Module", "admin.module", "module", 2, 1),
    permission!("User Module", "user.module", "module", 2, 2),
    permission!("Role & Permission Module", "role.permission.module", "module", 2, 3),
    permission!("Kanban Module", "kanban.module", "module", 2, 4),
    // admin
    permission!("Admin View", "admin.view", "admin", 3, 1),
    permission!("Admin Create", "admin.create", "admin", 3, 2),
    permission!("Admin Update", "admin.update", "admin", 3, 3),
    permission!("Admin Delete", "admin.delete", "admin", 3, 4),
    permission!("Admin Status", "admin.status", "admin", 3, 5),
    permission!("Admin Restore", "admin.restore", "admin", 3, 6),
    permission!("Admin Force Delete", "admin.force-delete", "admin", 3, 7),
    // user
    permission!("User View", "user.view", "user", 4, 1),
    permission!("User Create", "user.create", "user", 4, 2),
    permission!("User Update", "user.update", "user", 4, 3),
    permission!("User Delete", "user.delete", "user", 4, 4),
    permission!("User Status", "user.status", "user", 4, 5),
    // role
    permission!("Role View", "role.view", "role", 5, 1),
    permission!("Role Create", "role.create", "role", 5, 2),
    permission!("Role Update", "role.update", "role", 5, 3),
    permission!("Role Delete", "role.delete", "role", 5, 4),
    permission!("Role Status", "role.status", "role", 5, 5),
    permission!("Role Restore", "role.restore", "role", 5, 6),
    permission!("Role Force Delete", "role.force-delete", "role", 5, 7),
    // permission
    permission!("Permission View", "permission.view", "permission", 6, 1),
    permission!("Permission Create", "permission.create", "permission", 6, 2),
    permission!("Permission Update", "permission.update", "permission", 6, 3),
    permission!("Permission Delete", "permission.delete", "permission", 6, 4),
    permission!("Permission Status", "permission.status", "permission", 6, 5),
    permission!("Permission Group Order", "permission.group.order", "permission", 6, 6),
    permission!("Permission Order", "permission.order", "permission", 6, 7),
    permission!("Permission Restore", "permission.restore", "permission", 6, 8),
    permission!("Permission Force Delete", "permission.force-delete", "permission", 6, 9),
    // token
    permission!("Token View", "token.view", "token", 7, 1),
    permission!("Token Revoke", "token.revoke", "token", 7, 2),
    permission!("Token Delete", "token.delete", "token", 7, 3),
    // kanban
    permission!("Kanban View", "kanban.view", "kanban", 8, 1),
    permission!("Kanban Create", "kanban.create", "kanban", 8, 2),
    permission!("Kanban Update", "kanban.update", "kanban", 8, 3),
    permission!("Kanban Delete", "kanban.delete", "kanban", 8, 4),
    permission!("Kanban Status", "kanban.status", "kanban", 8, 5),
    permission!("Kanban Restore", "kanban.restore", "kanban", 8, 6),
    permission!("Kanban Force Delete", "kanban.force-delete", "kanban", 8, 7),
    // profile
    permission!("Profile View", "profile.view", "profile", 9, 1),
    permission!("Profile Update", "profile.update", "profile", 9, 2),
];

const ROLES: &[RoleSeed] = &[
    RoleSeed {
        name: "Super Admin",
        slug: "superadmin",
        description: "Super Admin Role",
        is_default: true,
    },
    RoleSeed {
        name: "Admin",
        slug: "admin",
        description: "Admin Role",
        is_default: false,
    },
    RoleSeed {
        name: "Editor",
        slug: "editor",
        description: "Editor Role",
        is_default: false,
    },
    RoleSeed {
        name: "User",
        slug: "user",
        description: "User Role",
        is_default: false,
    },
];

const ADMINS: &[AdminSeed] = &[
    AdminSeed {
        first_name: "Super",
        last_name: "Admin",
        username: "super_admin",
        email: "superadmin@admin.com",
        phone: "0700000001",
        role_slug: "superadmin",
    },
    AdminSeed {
        first_name: "Admin",
        last_name: "Admin",
        username: "admin",
        email: "admin@admin.com",
        phone: "0700000002",
        role_slug: "admin",
    },
    AdminSeed {
        first_name: "Editor",
        last_name: "Editor",
        username: "editor",
        email: "editor@admin.com",
        phone: "0700000003",
        role_slug: "editor",
    },
    AdminSeed {
        first_name: "User",
        last_name: "User",
        username: "user",
        email: "user@admin.com",
        phone: "0700000004",
        role_slug: "user",
    },
];

/// Management slugs withheld from the editor and user roles
const RESTRICTED_SLUGS: &[&str] = &[
    "admin.view",
    "admin.create",
    "admin.update",
    "admin.delete",
    "admin.status",
    "role.view",
    "role.create",
    "role.update",
    "role.delete",
    "role.status",
    "permission.view",
    "permission.create",
    "permission.update",
    "permission.delete",
    "token.view",
    "token.revoke",
    "token.delete",
];

const SEED_PASSWORD: &str = "password";

/// Reset the RBAC tables and rebuild them from the catalogue. All writes
/// run in one transaction.
pub async fn run(pool: &PgPool) -> anyhow::Result<()> {
    let mut tx = pool.begin().await?;

    reset(&mut tx).await?;
    let permission_ids = seed_permissions(&mut tx).await?;
    let role_ids = seed_roles(&mut tx, &permission_ids).await?;
    seed_admins(&mut tx, &role_ids).await?;

    tx.commit().await?;

    info!(
        "Seeded {} permissions, {} roles, and {} admin accounts",
        PERMISSIONS.len(),
        ROLES.len(),
        ADMINS.len()
    );
    Ok(())
}

async fn reset(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    // child tables first; admins last because permissions.deleted_by
    // references them
    for table in [
        "admin_roles",
        "admin_permissions",
        "role_permissions",
        "sessions",
        "permissions",
        "roles",
        "admins",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut **tx)
            .await?;
    }

    info!("Cleared RBAC tables");
    Ok(())
}

async fn seed_permissions(
    tx: &mut Transaction<'_, Postgres>,
) -> anyhow::Result<HashMap<&'static str, Uuid>> {
    let mut ids = HashMap::new();

    for seed in PERMISSIONS {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO permissions (name, slug, group_name, group_order, sort_order) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(seed.name)
        .bind(seed.slug)
        .bind(seed.group)
        .bind(seed.group_order)
        .bind(seed.sort_order)
        .fetch_one(&mut **tx)
        .await?;

        ids.insert(seed.slug, id);
    }

    Ok(ids)
}

async fn seed_roles(
    tx: &mut Transaction<'_, Postgres>,
    permission_ids: &HashMap<&'static str, Uuid>,
) -> anyhow::Result<HashMap<&'static str, Uuid>> {
    let mut ids = HashMap::new();

    for seed in ROLES {
        let role_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO roles (name, slug, description, is_default) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(seed.name)
        .bind(seed.slug)
        .bind(seed.description)
        .bind(seed.is_default)
        .fetch_one(&mut **tx)
        .await?;

        let full_access = seed.slug == "superadmin" || seed.slug == "admin";

        for permission in PERMISSIONS {
            if !full_access && RESTRICTED_SLUGS.contains(&permission.slug) {
                continue;
            }

            sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
                .bind(role_id)
                .bind(permission_ids[permission.slug])
                .execute(&mut **tx)
                .await?;
        }

        ids.insert(seed.slug, role_id);
    }

    Ok(ids)
}

async fn seed_admins(
    tx: &mut Transaction<'_, Postgres>,
    role_ids: &HashMap<&'static str, Uuid>,
) -> anyhow::Result<()> {
    let password_hash = AdminRepository::hash_password(SEED_PASSWORD)?;

    for seed in ADMINS {
        let admin_id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO admins (first_name, last_name, phone, username, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(seed.first_name)
        .bind(seed.last_name)
        .bind(seed.phone)
        .bind(seed.username)
        .bind(seed.email)
        .bind(&password_hash)
        .fetch_one(&mut **tx)
        .await?;

        let role_id = role_ids
            .get(seed.role_slug)
            .ok_or_else(|| anyhow::anyhow!("Unknown role slug: {}", seed.role_slug))?;

        sqlx::query("INSERT INTO admin_roles (admin_id, role_id) VALUES ($1, $2)")
            .bind(admin_id)
            .bind(role_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalogue_slugs_are_unique() {
        let slugs: HashSet<_> = PERMISSIONS.iter().map(|p| p.slug).collect();
        assert_eq!(slugs.len(), PERMISSIONS.len());
    }

    #[test]
    fn test_catalogue_covers_every_guarded_endpoint() {
        let guarded = [
            "admin.view",
            "admin.create",
            "admin.update",
            "admin.delete",
            "admin.status",
            "role.view",
            "role.create",
            "role.update",
            "role.delete",
            "role.status",
            "permission.view",
            "permission.create",
            "permission.update",
            "permission.delete",
            "permission.restore",
            "permission.status",
            "token.view",
            "token.revoke",
            "token.delete",
        ];

        let slugs: HashSet<_> = PERMISSIONS.iter().map(|p| p.slug).collect();
        for slug in guarded {
            assert!(slugs.contains(slug), "missing catalogue entry: {}", slug);
        }
    }

    #[test]
    fn test_restricted_slugs_exist_in_catalogue() {
        let slugs: HashSet<_> = PERMISSIONS.iter().map(|p| p.slug).collect();
        for slug in RESTRICTED_SLUGS {
            assert!(slugs.contains(slug), "unknown restricted slug: {}", slug);
        }
    }

    #[test]
    fn test_superadmin_role_is_present_and_default() {
        let superadmin = ROLES.iter().find(|r| r.slug == "superadmin").unwrap();
        assert!(superadmin.is_default);

        let assigned: HashSet<_> = ADMINS.iter().map(|a| a.role_slug).collect();
        assert!(assigned.contains("superadmin"));

        let role_slugs: HashSet<_> = ROLES.iter().map(|r| r.slug).collect();
        for admin in ADMINS {
            assert!(role_slugs.contains(admin.role_slug));
        }
    }
}
