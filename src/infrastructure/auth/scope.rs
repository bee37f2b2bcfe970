//! Organization (tenant) isolation guard
//!
//! Checked on every tenant-scoped read and write as a mandatory gate,
//! orthogonal to roles and permissions: a permission grant can never leak
//! across tenants. Platform-level principals with no home tenant are
//! exempt by definition.

use crate::domain::error::{Error, Result};
use crate::domain::model::OrganizationId;
use crate::domain::principal::Principal;

/// Tenant-boundary comparison
pub struct OrganizationScopeGuard;

impl OrganizationScopeGuard {
    /// Whether the principal's effective tenant matches the resource's
    pub fn same_organization(principal: &Principal, resource_org: OrganizationId) -> bool {
        match principal.effective_organization() {
            None => true,
            Some(org) => org == resource_org,
        }
    }

    /// Deny with `OrganizationMismatch` on a tenant-boundary violation
    pub fn check(principal: &Principal, resource_org: OrganizationId) -> Result<()> {
        if Self::same_organization(principal, resource_org) {
            Ok(())
        } else {
            Err(Error::OrganizationMismatch)
        }
    }
}
