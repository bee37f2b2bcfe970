//! Persistence boundaries for users, roles, and permissions
//!
//! The relational store behind the wider platform is out of scope here; the
//! authorization core talks to these traits and ships in-memory
//! implementations. Writers take the write lock for the whole mutation, so
//! concurrent readers never observe a partially-applied role-permission
//! update, and effective permission sets are recomputed on every call
//! rather than cached across requests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::error::{Error, Result};
use crate::domain::model::{
    Permission, PermissionId, Role, RoleId, RolePermission, User, UserId,
};
use crate::domain::principal::RoleReference;
use crate::infrastructure::constants::SUPER_ADMIN_ROLE;

/// User record access
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn create(&self, user: User) -> Result<()>;
    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<()>;
    /// Assign a canonical role, keeping the legacy name in step
    async fn assign_role(&self, id: UserId, role_id: RoleId, role_name: &str) -> Result<()>;
    async fn count(&self) -> Result<usize>;
}

/// Role, permission, and grant access
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>>;
    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>>;
    /// Effective permission names for a role, derived from the grant table
    async fn permissions_for_role(&self, role_id: RoleId) -> Result<HashSet<String>>;
    /// Idempotent: granting an existing pair is a no-op
    async fn grant_permission(&self, role_id: RoleId, permission_id: PermissionId) -> Result<()>;
    /// Idempotent: revoking an absent pair is a no-op
    async fn revoke_permission(&self, role_id: RoleId, permission_id: PermissionId) -> Result<()>;
    /// Resolve either role representation to the canonical record
    async fn resolve(&self, reference: &RoleReference) -> Result<Option<Role>>;
}

/// In-memory user store
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(Error::invalid_argument(format!(
                "user id {} already exists",
                user.id
            )));
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn update_password_hash(&self, id: UserId, password_hash: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn assign_role(&self, id: UserId, role_id: RoleId, role_name: &str) -> Result<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("user {}", id)))?;
        user.role_id = Some(role_id);
        user.role = role_name.to_string();
        Ok(())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.users.read().await.len())
    }
}

/// Roles, permissions, and the unique role-permission grant table
struct RoleCatalog {
    roles: HashMap<RoleId, Role>,
    permissions: HashMap<PermissionId, Permission>,
    grants: HashSet<RolePermission>,
}

/// In-memory role/permission store
pub struct InMemoryRoleRepository {
    catalog: RwLock<RoleCatalog>,
}

impl InMemoryRoleRepository {
    /// Empty catalog, mainly for tests
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(RoleCatalog {
                roles: HashMap::new(),
                permissions: HashMap::new(),
                grants: HashSet::new(),
            }),
        }
    }

    /// Seed the deployment catalog: the permission set, the clinical roles,
    /// and their grants. The super-admin role receives every permission so
    /// its bypass in role checks is matched by a complete, reviewable grant
    /// set rather than a special case in permission checks.
    pub fn with_seed_catalog() -> Self {
        let permission_names = [
            ("viewPatients", "Read patient records"),
            ("editPatients", "Create and update patient records"),
            ("viewVisits", "Read visit history"),
            ("editVisits", "Record and update visits"),
            ("prescribe", "Issue prescriptions"),
            ("viewLabs", "Read lab results"),
            ("editLabs", "Enter lab results"),
            ("manageBilling", "Create and adjust invoices"),
            ("manageSchedule", "Manage appointment schedules"),
            ("manageUsers", "Provision and deactivate user accounts"),
            ("manageRoles", "Edit roles and permission grants"),
        ];

        let mut permissions = HashMap::new();
        let mut by_name: HashMap<&str, PermissionId> = HashMap::new();
        for (index, (name, description)) in permission_names.into_iter().enumerate() {
            let id = index as PermissionId + 1;
            permissions.insert(
                id,
                Permission {
                    id,
                    name: name.to_string(),
                    description: description.to_string(),
                },
            );
            by_name.insert(name, id);
        }

        let role_defs: [(&str, &str, &[&str]); 5] = [
            (
                SUPER_ADMIN_ROLE,
                "Platform administrator with a complete permission grant",
                &[
                    "viewPatients",
                    "editPatients",
                    "viewVisits",
                    "editVisits",
                    "prescribe",
                    "viewLabs",
                    "editLabs",
                    "manageBilling",
                    "manageSchedule",
                    "manageUsers",
                    "manageRoles",
                ],
            ),
            (
                "orgadmin",
                "Organization administrator",
                &[
                    "viewPatients",
                    "editPatients",
                    "viewVisits",
                    "manageBilling",
                    "manageSchedule",
                    "manageUsers",
                ],
            ),
            (
                "doctor",
                "Treating physician",
                &[
                    "viewPatients",
                    "editPatients",
                    "viewVisits",
                    "editVisits",
                    "prescribe",
                    "viewLabs",
                ],
            ),
            (
                "nurse",
                "Clinical staff",
                &["viewPatients", "viewVisits", "editVisits", "viewLabs", "editLabs"],
            ),
            (
                "receptionist",
                "Front desk",
                &["viewPatients", "viewVisits", "manageSchedule"],
            ),
        ];

        let mut roles = HashMap::new();
        let mut grants = HashSet::new();
        for (index, (name, description, permission_set)) in role_defs.into_iter().enumerate() {
            let role_id = index as RoleId + 1;
            roles.insert(
                role_id,
                Role {
                    id: role_id,
                    name: name.to_string(),
                    description: description.to_string(),
                },
            );
            for permission in permission_set {
                grants.insert(RolePermission {
                    role_id,
                    permission_id: by_name[permission],
                });
            }
        }

        Self {
            catalog: RwLock::new(RoleCatalog {
                roles,
                permissions,
                grants,
            }),
        }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_role(&self, id: RoleId) -> Result<Option<Role>> {
        Ok(self.catalog.read().await.roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self
            .catalog
            .read()
            .await
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn find_permission_by_name(&self, name: &str) -> Result<Option<Permission>> {
        Ok(self
            .catalog
            .read()
            .await
            .permissions
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn permissions_for_role(&self, role_id: RoleId) -> Result<HashSet<String>> {
        let catalog = self.catalog.read().await;
        Ok(catalog
            .grants
            .iter()
            .filter(|grant| grant.role_id == role_id)
            .filter_map(|grant| catalog.permissions.get(&grant.permission_id))
            .map(|permission| permission.name.clone())
            .collect())
    }

    async fn grant_permission(&self, role_id: RoleId, permission_id: PermissionId) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        if !catalog.roles.contains_key(&role_id) {
            return Err(Error::not_found(format!("role {}", role_id)));
        }
        if !catalog.permissions.contains_key(&permission_id) {
            return Err(Error::not_found(format!("permission {}", permission_id)));
        }
        catalog.grants.insert(RolePermission {
            role_id,
            permission_id,
        });
        Ok(())
    }

    async fn revoke_permission(&self, role_id: RoleId, permission_id: PermissionId) -> Result<()> {
        let mut catalog = self.catalog.write().await;
        catalog.grants.remove(&RolePermission {
            role_id,
            permission_id,
        });
        Ok(())
    }

    async fn resolve(&self, reference: &RoleReference) -> Result<Option<Role>> {
        match reference {
            RoleReference::Canonical(role_id) => self.find_role(*role_id).await,
            RoleReference::Legacy(name) => self.find_role_by_name(name).await,
        }
    }
}
