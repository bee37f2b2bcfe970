//! Protected-route middleware and extractors
//!
//! The authenticate middleware resolves a [`Principal`] once per request and
//! injects it into request extensions; handlers receive it through
//! [`PrincipalExtractor`] and never reach into ambient request state.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::domain::error::{Error, Result};
use crate::domain::principal::Principal;
use crate::infrastructure::auth::rbac::RbacEngine;
use crate::infrastructure::auth::resolver::RequestCredentials;
use crate::infrastructure::constants::SESSION_COOKIE_NAME;

use super::AppState;

/// Pull the session cookie and bearer token off a request
pub fn extract_credentials(jar: &CookieJar, headers: &HeaderMap) -> RequestCredentials {
    let session_id = jar
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string());

    let bearer_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    RequestCredentials {
        session_id,
        bearer_token,
    }
}

/// Authentication middleware for every protected route
///
/// Fails the request with 401 on any resolution error; on success the
/// resolved principal rides in the request extensions.
pub async fn authenticate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Response> {
    let credentials = extract_credentials(&jar, req.headers());

    match state.resolver.resolve(&credentials).await {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            Ok(next.run(req).await)
        }
        Err(err) => Err(err.into_response()),
    }
}

/// Fail with 403 unless the principal holds the role (super-admin bypasses)
pub fn ensure_role(rbac: &RbacEngine, principal: &Principal, role: &str) -> Result<()> {
    if rbac.require_role(principal, role) {
        Ok(())
    } else {
        Err(Error::forbidden(format!("role '{}'", role)))
    }
}

/// Fail with 403 unless the principal holds any of the roles
pub fn ensure_any_role(rbac: &RbacEngine, principal: &Principal, roles: &[&str]) -> Result<()> {
    if rbac.require_any_role(principal, roles) {
        Ok(())
    } else {
        Err(Error::forbidden(format!("one of roles {:?}", roles)))
    }
}

/// Fail with 403 unless the principal's effective permission set contains
/// the named permission
pub async fn ensure_permission(
    rbac: &RbacEngine,
    principal: &Principal,
    permission: &str,
) -> Result<()> {
    if rbac.has_permission(principal, permission).await? {
        Ok(())
    } else {
        Err(Error::forbidden(format!("permission '{}'", permission)))
    }
}

/// Principal extractor for handlers behind the authenticate middleware
#[derive(Debug, Clone)]
pub struct PrincipalExtractor(pub Principal);

impl std::ops::Deref for PrincipalExtractor {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> axum::extract::FromRequestParts<S> for PrincipalExtractor
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(PrincipalExtractor)
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

/// Optional principal (for endpoints that work with or without auth)
#[derive(Debug, Clone)]
pub struct OptionalPrincipal(pub Option<Principal>);

impl<S> axum::extract::FromRequestParts<S> for OptionalPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(OptionalPrincipal(
            parts.extensions.get::<Principal>().cloned(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::repository::InMemoryRoleRepository;
    use std::sync::Arc;

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

    #[test]
    fn test_ensure_role_names_requirement() {
        let rbac = RbacEngine::new(Arc::new(InMemoryRoleRepository::with_seed_catalog()));
        let nurse = principal("nurse", Some(4));

        let err = ensure_role(&rbac, &nurse, "doctor").unwrap_err();
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("doctor"));
    }

    #[tokio::test]
    async fn test_ensure_permission_names_requirement() {
        let rbac = RbacEngine::new(Arc::new(InMemoryRoleRepository::with_seed_catalog()));
        let receptionist = principal("receptionist", Some(5));

        let err = ensure_permission(&rbac, &receptionist, "prescribe")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("prescribe"));
    }

    #[test]
    fn test_extract_credentials_reads_bearer() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());

        let credentials = extract_credentials(&jar, &headers);
        assert_eq!(credentials.bearer_token.as_deref(), Some("abc.def.ghi"));
        assert!(credentials.session_id.is_none());
    }

    #[test]
    fn test_extract_credentials_ignores_non_bearer() {
        let jar = CookieJar::new();
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcg==".parse().unwrap());

        let credentials = extract_credentials(&jar, &headers);
        assert!(credentials.is_empty());
    }
}
