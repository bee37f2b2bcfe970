//! The resolved, request-scoped identity
//!
//! A [`Principal`] is constructed exactly once per request by the identity
//! resolver and threaded explicitly through the call chain. It is never
//! persisted and never read back out of ambient request state.

use serde::{Deserialize, Serialize};

use super::model::{OrganizationId, RoleId, User, UserId};

/// Normalized identity-and-claims value for a single request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    /// Role name used by role checks
    pub role: String,
    /// Canonical RBAC role; `None` means the user has no role assigned
    pub role_id: Option<RoleId>,
    /// Home tenant; `None` for platform-level accounts
    pub organization_id: Option<OrganizationId>,
    /// Tenant the principal is currently operating as, when switched
    pub current_organization_id: Option<OrganizationId>,
}

impl Principal {
    /// Build a principal from a user record
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            role_id: user.role_id,
            organization_id: user.organization_id,
            current_organization_id: None,
        }
    }

    /// The tenant this principal is acting in
    ///
    /// Defaults to the home organization when no explicit switch happened,
    /// so a platform admin can operate "as" a tenant without losing their
    /// home tenant.
    pub fn effective_organization(&self) -> Option<OrganizationId> {
        self.current_organization_id.or(self.organization_id)
    }

    /// Operate as the given tenant for the remainder of the request
    pub fn switch_organization(&mut self, organization_id: OrganizationId) {
        self.current_organization_id = Some(organization_id);
    }

    /// Platform-level principals have no home tenant
    pub fn is_platform_scoped(&self) -> bool {
        self.organization_id.is_none()
    }
}

/// Unified view over the legacy string role and the canonical `role_id`
///
/// The repository resolves either variant to a canonical [`super::model::Role`]
/// record so downstream code reasons about a single representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleReference {
    /// Canonical RBAC foreign key
    Canonical(RoleId),
    /// Legacy role name awaiting migration
    Legacy(String),
}

impl RoleReference {
    /// Prefer the canonical id when the user record carries one
    pub fn from_user(user: &User) -> Self {
        match user.role_id {
            Some(role_id) => Self::Canonical(role_id),
            None => Self::Legacy(user.role.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "dr.adams".to_string(),
            password_hash: String::new(),
            role: "doctor".to_string(),
            role_id: Some(3),
            organization_id: Some(12),
            active: true,
        }
    }

    #[test]
    fn test_effective_organization_defaults_to_home() {
        let principal = Principal::from_user(&sample_user());
        assert_eq!(principal.effective_organization(), Some(12));
    }

    #[test]
    fn test_switch_organization_overrides_without_losing_home() {
        let mut principal = Principal::from_user(&sample_user());
        principal.switch_organization(40);
        assert_eq!(principal.effective_organization(), Some(40));
        assert_eq!(principal.organization_id, Some(12));
    }

    #[test]
    fn test_role_reference_prefers_canonical() {
        let user = sample_user();
        assert_eq!(RoleReference::from_user(&user), RoleReference::Canonical(3));

        let legacy = User {
            role_id: None,
            ..user
        };
        assert_eq!(
            RoleReference::from_user(&legacy),
            RoleReference::Legacy("doctor".to_string())
        );
    }
}
