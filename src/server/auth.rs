//! Authentication handlers: login, logout, change password

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::infrastructure::constants::SESSION_COOKIE_NAME;
use crate::infrastructure::utils::TimeUtils;

use super::middleware::PrincipalExtractor;
use super::models::{
    ApiResponse, ChangePasswordRequest, LoginRequest, LoginResponse, UserSummary,
};
use super::AppState;

/// Login handler
///
/// On success sets the session cookie and returns the bearer token with a
/// sanitized user summary. Failures return a generic 401 that does not
/// distinguish unknown users from wrong passwords.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(login_req): Json<LoginRequest>,
) -> axum::response::Response {
    match state
        .auth
        .login(&login_req.username, &login_req.password)
        .await
    {
        Ok(outcome) => {
            let response = LoginResponse {
                token: outcome.token,
                expires_at: TimeUtils::now_unix_secs() + state.auth.token_ttl_secs(),
                user: UserSummary::from(&outcome.user),
            };
            let jar = jar.add(session_cookie(outcome.session_id, state.secure_cookies));
            (jar, Json(ApiResponse::success(response))).into_response()
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<LoginResponse>::error(
                "Invalid username or password".to_string(),
            )),
        )
            .into_response(),
    }
}

/// Logout handler; idempotent
pub async fn logout_handler(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.auth.logout(cookie.value());
    }
    let jar = jar.remove(SESSION_COOKIE_NAME);

    (jar, Json(ApiResponse::success("Logged out".to_string())))
}

/// Change-password handler; requires re-verification of the current password
pub async fn change_password_handler(
    State(state): State<AppState>,
    principal: PrincipalExtractor,
    Json(req): Json<ChangePasswordRequest>,
) -> axum::response::Response {
    match state
        .auth
        .change_password(principal.id, &req.current_password, &req.new_password)
        .await
    {
        Ok(()) => Json(ApiResponse::success("Password updated".to_string())).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Session cookie: HttpOnly, SameSite=Lax, Secure outside development
fn session_cookie(session_id: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc123".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_dev_cookie_is_not_secure() {
        let cookie = session_cookie("abc123".to_string(), false);
        assert_eq!(cookie.secure(), Some(false));
    }
}
