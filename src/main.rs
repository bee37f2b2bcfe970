//! CliniCore authorization service - main entry point

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use clinicore_auth::domain::model::User;
use clinicore_auth::infrastructure::auth::audit::{AuditGate, InMemoryAuditSink};
use clinicore_auth::infrastructure::auth::password::hash_password;
use clinicore_auth::infrastructure::auth::rbac::RbacEngine;
use clinicore_auth::infrastructure::auth::resolver::IdentityResolver;
use clinicore_auth::infrastructure::auth::service::AuthService;
use clinicore_auth::infrastructure::auth::session::SessionStore;
use clinicore_auth::infrastructure::auth::token::TokenCodec;
use clinicore_auth::infrastructure::config::AuthSettings;
use clinicore_auth::infrastructure::constants::SUPER_ADMIN_ROLE;
use clinicore_auth::infrastructure::repository::{
    InMemoryRoleRepository, InMemoryUserRepository, RoleRepository, UserRepository,
};
use clinicore_auth::infrastructure::secret::SecretProvider;
use clinicore_auth::server::records::PatientDirectory;
use clinicore_auth::server::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = AuthSettings::load()?;
    settings.log_security_warnings();

    // Fail fast: a production deployment without a signing secret must not
    // serve a single request.
    let secrets = SecretProvider::provision(&settings)?;

    let roles: Arc<dyn RoleRepository> = Arc::new(InMemoryRoleRepository::with_seed_catalog());
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
    bootstrap_fallback_admin(users.as_ref(), roles.as_ref(), &settings).await?;

    let sessions = Arc::new(SessionStore::new(settings.session_idle_timeout_secs));
    let codec = Arc::new(TokenCodec::new(
        &secrets,
        settings.token_issuer.clone(),
        settings.token_expiration_secs,
    ));

    let state = AppState {
        resolver: Arc::new(IdentityResolver::new(
            sessions.clone(),
            codec.clone(),
            roles.clone(),
        )),
        rbac: Arc::new(RbacEngine::new(roles.clone())),
        auth: Arc::new(AuthService::new(
            users.clone(),
            roles.clone(),
            sessions,
            codec,
            settings.default_role.clone(),
        )),
        audit: Arc::new(AuditGate::new(
            settings.fallback_principal_id,
            Arc::new(InMemoryAuditSink::new()),
        )),
        patients: Arc::new(PatientDirectory::new()),
        secure_cookies: settings.environment.is_production(),
    };

    let addr = format!("0.0.0.0:{}", settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "clinicore-auth listening");
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}

/// Provision the reserved fallback administrator when no users exist yet
///
/// The fallback account carries the configured sentinel principal id and is
/// excluded from audit attribution; it exists so a deployment can be
/// administered before any real administrator account does.
async fn bootstrap_fallback_admin(
    users: &dyn UserRepository,
    roles: &dyn RoleRepository,
    settings: &AuthSettings,
) -> anyhow::Result<()> {
    if users.count().await? > 0 {
        return Ok(());
    }

    let role = roles
        .find_role_by_name(SUPER_ADMIN_ROLE)
        .await?
        .ok_or_else(|| anyhow::anyhow!("seed catalog is missing the super-admin role"))?;

    let password = match std::env::var("CLINICORE_BOOTSTRAP_PASSWORD") {
        Ok(password) => password,
        Err(_) => {
            let generated: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(20)
                .map(char::from)
                .collect();
            tracing::warn!(
                password = %generated,
                "CLINICORE_BOOTSTRAP_PASSWORD not set; generated a one-time password \
                 for the fallback administrator"
            );
            generated
        }
    };

    users
        .create(User {
            id: settings.fallback_principal_id,
            username: "admin".to_string(),
            password_hash: hash_password(&password)
                .map_err(|e| anyhow::anyhow!("failed to hash bootstrap password: {}", e))?,
            role: role.name.clone(),
            role_id: Some(role.id),
            organization_id: None,
            active: true,
        })
        .await?;

    tracing::warn!(
        user = settings.fallback_principal_id,
        "no users exist; provisioned the fallback administrator. Its actions are \
         excluded from audit logging; create a real administrator account and retire it"
    );
    Ok(())
}
