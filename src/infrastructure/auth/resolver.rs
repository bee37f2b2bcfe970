//! Request identity resolution
//!
//! Merges the session store and the token codec into one normalized
//! [`Principal`] per request. A session takes precedence over a bearer
//! token when both are presented; there is one precedence rule, not a
//! negotiated merge.

use std::sync::Arc;

use crate::domain::error::{Error, Result};
use crate::domain::principal::{Principal, RoleReference};
use crate::infrastructure::auth::session::SessionStore;
use crate::infrastructure::auth::token::TokenCodec;
use crate::infrastructure::repository::RoleRepository;

/// Credential material extracted from a request by the transport layer
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    /// Opaque session id from the session cookie
    pub session_id: Option<String>,
    /// Bearer token from the Authorization header
    pub bearer_token: Option<String>,
}

impl RequestCredentials {
    pub fn from_session<S: Into<String>>(session_id: S) -> Self {
        Self {
            session_id: Some(session_id.into()),
            bearer_token: None,
        }
    }

    pub fn from_bearer<S: Into<String>>(token: S) -> Self {
        Self {
            session_id: None,
            bearer_token: Some(token.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.session_id.is_none() && self.bearer_token.is_none()
    }
}

/// Resolves request credentials to a principal
pub struct IdentityResolver {
    sessions: Arc<SessionStore>,
    codec: Arc<TokenCodec>,
    roles: Arc<dyn RoleRepository>,
}

impl IdentityResolver {
    pub fn new(
        sessions: Arc<SessionStore>,
        codec: Arc<TokenCodec>,
        roles: Arc<dyn RoleRepository>,
    ) -> Self {
        Self {
            sessions,
            codec,
            roles,
        }
    }

    /// Resolve a principal or fail the request
    ///
    /// Order: (1) a live session wins and gets its activity refreshed; a
    /// session presented past its idle timeout is terminal as
    /// `SessionExpired`, with the session destroyed. (2) Otherwise a bearer
    /// token, verified by signature and expiry; token principals are not
    /// session-backed and have no activity-refresh semantics. (3) Otherwise
    /// `Unauthenticated`.
    pub async fn resolve(&self, credentials: &RequestCredentials) -> Result<Principal> {
        if let Some(session_id) = &credentials.session_id {
            match self.sessions.validate_and_touch(session_id) {
                Ok(session) => {
                    if let Some(token) = &credentials.bearer_token {
                        self.warn_on_mismatch(&session.user.username, session.user.id, token);
                    }
                    return Ok(session.user.to_principal());
                }
                Err(Error::SessionExpired) => return Err(Error::SessionExpired),
                // unknown or already-destroyed session id: fall through to the token
                Err(_) => {}
            }
        }

        if let Some(token) = &credentials.bearer_token {
            let claims = self.codec.verify(token)?;
            let mut principal = claims.to_principal();
            // Tokens carry only the role name; map it onto the canonical
            // role record so downstream checks reason about one
            // representation.
            if principal.role_id.is_none() && !principal.role.is_empty() {
                if let Some(role) = self
                    .roles
                    .resolve(&RoleReference::Legacy(principal.role.clone()))
                    .await?
                {
                    principal.role_id = Some(role.id);
                }
            }
            return Ok(principal);
        }

        Err(Error::Unauthenticated)
    }

    /// Resolution that never errors, for endpoints that merely behave
    /// differently for anonymous callers
    pub async fn resolve_optional(&self, credentials: &RequestCredentials) -> Option<Principal> {
        self.resolve(credentials).await.ok()
    }

    /// Session wins silently, but a user-id disagreement between the two
    /// credentials is worth surfacing.
    fn warn_on_mismatch(&self, username: &str, session_user_id: i64, token: &str) {
        if let Ok(claims) = self.codec.verify(token) {
            if claims.sub != session_user_id {
                tracing::warn!(
                    session_user = session_user_id,
                    token_user = claims.sub,
                    username,
                    "session and bearer token identify different users; session wins"
                );
            }
        }
    }
}
