//! Role and permission checks
//!
//! Role checks compare names and grant the reserved super-admin role an
//! unconditional bypass. Permission checks have no such code path: they
//! derive the effective permission set from the grant table on every call,
//! and the super-admin's complete reach comes from its seeded grants. Role
//! and permission edits are therefore visible to new requests without a
//! restart.

use std::sync::Arc;

use crate::domain::error::Result;
use crate::domain::principal::Principal;
use crate::infrastructure::constants::SUPER_ADMIN_ROLE;
use crate::infrastructure::repository::RoleRepository;

/// Answers "does this principal hold role X / permission Z"
pub struct RbacEngine {
    roles: Arc<dyn RoleRepository>,
}

impl RbacEngine {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    /// True when the principal holds the role, or holds the super-admin role
    pub fn require_role(&self, principal: &Principal, role: &str) -> bool {
        principal.role == SUPER_ADMIN_ROLE || principal.role == role
    }

    /// True when the principal holds any of the roles, or the super-admin role
    pub fn require_any_role(&self, principal: &Principal, roles: &[&str]) -> bool {
        principal.role == SUPER_ADMIN_ROLE || roles.iter().any(|role| principal.role == *role)
    }

    /// True iff the permission appears in the principal's effective set
    ///
    /// The set is the join of `role_id` through the grant table; a principal
    /// with no canonical role has no permissions.
    pub async fn has_permission(&self, principal: &Principal, permission: &str) -> Result<bool> {
        let Some(role_id) = principal.role_id else {
            return Ok(false);
        };
        Ok(self
            .roles
            .permissions_for_role(role_id)
            .await?
            .contains(permission))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryRoleRepository;

    fn principal(role: &str, role_id: Option<i64>) -> Principal {
        Principal {
            id: 1,
            username: "u".to_string(),
            role: role.to_string(),
            role_id,
            organization_id: Some(1),
            current_organization_id: None,
        }
    }

    fn engine() -> RbacEngine {
        RbacEngine::new(Arc::new(InMemoryRoleRepository::with_seed_catalog()))
    }

    #[test]
    fn test_role_check_matches_name() {
        let engine = engine();
        let doctor = principal("doctor", Some(3));

        assert!(engine.require_role(&doctor, "doctor"));
        assert!(!engine.require_role(&doctor, "nurse"));
    }

    #[test]
    fn test_super_admin_bypasses_any_role_check() {
        let engine = engine();
        let admin = principal(SUPER_ADMIN_ROLE, Some(1));

        assert!(engine.require_role(&admin, "doctor"));
        assert!(engine.require_role(&admin, "a-role-that-does-not-exist"));
        assert!(engine.require_any_role(&admin, &["nurse", "receptionist"]));
        assert!(engine.require_any_role(&admin, &[]));
    }

    #[test]
    fn test_any_role_is_membership() {
        let engine = engine();
        let nurse = principal("nurse", Some(4));

        assert!(engine.require_any_role(&nurse, &["doctor", "nurse"]));
        assert!(!engine.require_any_role(&nurse, &["doctor", "orgadmin"]));
    }

    #[tokio::test]
    async fn test_permission_derives_from_grant_table() {
        let engine = engine();
        let doctor = principal("doctor", Some(3));

        assert!(engine.has_permission(&doctor, "prescribe").await.unwrap());
        assert!(!engine
            .has_permission(&doctor, "manageBilling")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_no_canonical_role_means_no_permissions() {
        let engine = engine();
        let stray = principal("doctor", None);

        assert!(!engine.has_permission(&stray, "prescribe").await.unwrap());
    }

    #[tokio::test]
    async fn test_super_admin_permissions_are_structural() {
        // the bypass does not extend to permission checks; the seed catalog
        // carries the complete grant set instead
        let repo = Arc::new(InMemoryRoleRepository::with_seed_catalog());
        let engine = RbacEngine::new(repo.clone());
        let admin = principal(SUPER_ADMIN_ROLE, Some(1));

        assert!(engine.has_permission(&admin, "prescribe").await.unwrap());

        // revoking the grant removes the permission, bypass or not
        let permission = repo
            .find_permission_by_name("prescribe")
            .await
            .unwrap()
            .unwrap();
        repo.revoke_permission(1, permission.id).await.unwrap();
        assert!(!engine.has_permission(&admin, "prescribe").await.unwrap());
    }
}
