//! HTTP surface: router assembly, shared state, and error mapping

pub mod auth;
pub mod middleware;
pub mod models;
pub mod records;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::domain::error::Error;
use crate::infrastructure::auth::audit::AuditGate;
use crate::infrastructure::auth::rbac::RbacEngine;
use crate::infrastructure::auth::resolver::IdentityResolver;
use crate::infrastructure::auth::service::AuthService;

use models::ApiResponse;
use records::PatientDirectory;

/// Shared state threaded through every handler
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<IdentityResolver>,
    pub rbac: Arc<RbacEngine>,
    pub auth: Arc<AuthService>,
    pub audit: Arc<AuditGate>,
    pub patients: Arc<PatientDirectory>,
    /// Session cookies carry the Secure flag outside development
    pub secure_cookies: bool,
}

/// Assemble the application router
///
/// Everything under the protected router runs behind the authenticate
/// middleware; login, logout, and health do not.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/password", put(auth::change_password_handler))
        .route(
            "/api/patients",
            get(records::list_patients).post(records::create_patient),
        )
        .route("/api/patients/{id}", get(records::get_patient))
        .route("/api/visits", post(records::record_visit))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .merge(protected)
        .layer(CorsLayer::new())
        .with_state(state)
}

async fn health_handler() -> impl IntoResponse {
    Json(ApiResponse::success("ok".to_string()))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // internal details stay out of responses
        let message = match &self {
            Error::Internal { .. } | Error::Config { .. } => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
