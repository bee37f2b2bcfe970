//! Identity records for the authorization domain
//!
//! These are the persistence-layer shapes the authorization core reasons
//! about. The CRUD route handlers own everything else (patients, visits,
//! prescriptions); they only ever see a resolved [`super::principal::Principal`]
//! and a check result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric user identifier
pub type UserId = i64;
/// Numeric role identifier
pub type RoleId = i64;
/// Numeric permission identifier
pub type PermissionId = i64;
/// Numeric organization (tenant) identifier
pub type OrganizationId = i64;

/// User identity record
///
/// `role` is the legacy string role name kept alongside the RBAC `role_id`
/// foreign key; new code resolves both through
/// [`super::principal::RoleReference`] and only ever reasons about one
/// representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user id
    pub id: UserId,
    /// Login name
    pub username: String,
    /// Adaptive password hash (bcrypt, or argon2 PHC format)
    #[serde(skip)]
    pub password_hash: String,
    /// Legacy role name
    pub role: String,
    /// Canonical RBAC role; `None` is a detectable anomaly, not a valid state
    pub role_id: Option<RoleId>,
    /// Home tenant; `None` for platform-level accounts
    pub organization_id: Option<OrganizationId>,
    /// Inactive users cannot authenticate
    pub active: bool,
}

impl User {
    /// Whether this user has a canonical role assignment
    pub fn has_role_assigned(&self) -> bool {
        self.role_id.is_some()
    }
}

/// Role record referenced by users and permission grants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Unique role name
    pub name: String,
    pub description: String,
}

/// Permission catalog entry, seeded at deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    /// Unique permission name
    pub name: String,
    pub description: String,
}

/// Role-to-permission grant; pairs are unique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: RoleId,
    pub permission_id: PermissionId,
}

/// The tenant boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
}

/// Compliance record written by the audit gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub actor_id: UserId,
    pub action: String,
    pub entity: String,
    pub timestamp: DateTime<Utc>,
    pub organization_id: Option<OrganizationId>,
}
