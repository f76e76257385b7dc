//! Entity and payload models for the back-office API

mod admin;
mod permission;
mod role;
mod session;

pub use admin::{Admin, AdminDetail, AdminResponse, AdminWithRoles, NewAdmin, UpdateAdmin};
pub use permission::{NewPermission, Permission, PermissionWithCounts, UpdatePermission};
pub use role::{NewRole, Role, RoleWithCounts, RoleWithPermissions, UpdateRole};
pub use session::{Session, SessionResponse};
