//! Login, logout, and password management

use std::sync::Arc;

use crate::domain::error::{Error, Result};
use crate::domain::model::{Role, User, UserId};
use crate::infrastructure::auth::password::{hash_password, verify_password, PasswordPolicy};
use crate::infrastructure::auth::session::{SessionStore, SessionUser};
use crate::infrastructure::auth::token::TokenCodec;
use crate::infrastructure::repository::{RoleRepository, UserRepository};

/// Result of a successful login
pub struct LoginOutcome {
    pub user: User,
    /// Opaque session handle for the cookie
    pub session_id: String,
    /// Stateless bearer token for API clients
    pub token: String,
}

/// Authentication entry points consumed by the transport layer
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    roles: Arc<dyn RoleRepository>,
    sessions: Arc<SessionStore>,
    codec: Arc<TokenCodec>,
    default_role: String,
    password_policy: PasswordPolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleRepository>,
        sessions: Arc<SessionStore>,
        codec: Arc<TokenCodec>,
        default_role: String,
    ) -> Self {
        Self {
            users,
            roles,
            sessions,
            codec,
            default_role,
            password_policy: PasswordPolicy::default(),
        }
    }

    /// Verify credentials, establish a session, and issue a token
    ///
    /// Every failure collapses to `Unauthenticated`: unknown user, wrong
    /// password, and deactivated account are indistinguishable to the
    /// caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::Unauthenticated);
        }

        let Some(user) = self.users.find_by_username(username).await? else {
            return Err(Error::Unauthenticated);
        };
        if !user.active {
            return Err(Error::Unauthenticated);
        }
        if !verify_password(password, &user.password_hash)? {
            return Err(Error::Unauthenticated);
        }

        if !user.has_role_assigned() {
            tracing::warn!(
                user = user.id,
                username = %user.username,
                "user authenticated with no role assigned; actions will not be \
                 audit-attributed until a role is assigned"
            );
        }

        let session_id = self.sessions.create(SessionUser {
            id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            role_id: user.role_id,
            organization_id: user.organization_id,
            current_organization_id: None,
        });
        let token = self.codec.issue_for(&user)?;

        Ok(LoginOutcome {
            user,
            session_id,
            token,
        })
    }

    /// Destroy the caller's session; idempotent
    pub fn logout(&self, session_id: &str) {
        self.sessions.destroy(session_id);
    }

    /// Re-verify the current password, then rehash and store the new one
    pub async fn change_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(Error::Unauthenticated)?;

        if !verify_password(current_password, &user.password_hash)? {
            return Err(Error::Unauthenticated);
        }

        self.password_policy
            .validate(new_password)
            .map_err(|errors| Error::invalid_argument(errors.join(", ")))?;

        let new_hash = hash_password(new_password)?;
        self.users.update_password_hash(user.id, &new_hash).await
    }

    /// Remediation policy for users discovered with no role: assign the
    /// configured default role. Applied only through this explicit
    /// operation, never silently during resolution.
    pub async fn remediate_missing_role(&self, user_id: UserId) -> Result<Role> {
        let role = self
            .roles
            .find_role_by_name(&self.default_role)
            .await?
            .ok_or_else(|| {
                Error::config(format!(
                    "configured default role '{}' does not exist",
                    self.default_role
                ))
            })?;

        self.users
            .assign_role(user_id, role.id, &role.name)
            .await?;
        tracing::info!(
            user = user_id,
            role = %role.name,
            "assigned default role to user with no role"
        );
        Ok(role)
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.codec.ttl_secs()
    }
}
