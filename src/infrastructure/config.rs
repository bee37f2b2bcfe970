//! Configuration management
//!
//! Settings are layered: defaults, then an optional `clinicore.toml`, then
//! `CLINICORE_*` environment variables (highest priority). Validation runs
//! once at startup; a bad configuration never serves traffic.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::error::{Error, Result};
use crate::infrastructure::constants::{
    DEFAULT_REMEDIATION_ROLE, FALLBACK_PRINCIPAL_ID, JWT_SECRET_MIN_LENGTH, SERVER_DEFAULT_PORT,
    SESSION_IDLE_TIMEOUT_SECS, TOKEN_EXPIRATION_SECS, TOKEN_ISSUER,
};

/// Deployment environment, selected once at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Development,
}

impl Environment {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Authorization core settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AuthSettings {
    pub environment: Environment,
    /// Token signing secret; required in production, optional in development
    pub jwt_secret: Option<String>,
    #[validate(range(min = 1))]
    pub token_expiration_secs: u64,
    pub token_issuer: String,
    #[validate(range(min = 60))]
    pub session_idle_timeout_secs: u64,
    /// Reserved sentinel principal id excluded from audit attribution
    pub fallback_principal_id: i64,
    /// Role name assigned when remediating a user with no role
    pub default_role: String,
    pub port: u16,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            jwt_secret: None,
            token_expiration_secs: TOKEN_EXPIRATION_SECS,
            token_issuer: TOKEN_ISSUER.to_string(),
            session_idle_timeout_secs: SESSION_IDLE_TIMEOUT_SECS,
            fallback_principal_id: FALLBACK_PRINCIPAL_ID,
            default_role: DEFAULT_REMEDIATION_ROLE.to_string(),
            port: SERVER_DEFAULT_PORT,
        }
    }
}

impl AuthSettings {
    /// Load settings from file and environment
    pub fn load() -> Result<Self> {
        let settings: Self = config::Config::builder()
            .add_source(config::File::with_name("clinicore").required(false))
            .add_source(config::Environment::with_prefix("CLINICORE").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;

        Ok(settings)
    }

    /// Collect security warnings worth surfacing at startup
    pub fn security_warnings(&self) -> Vec<SecurityWarning> {
        let mut warnings = Vec::new();

        if let Some(secret) = &self.jwt_secret {
            if secret.len() < JWT_SECRET_MIN_LENGTH {
                warnings.push(SecurityWarning {
                    code: "JWT_SECRET_TOO_SHORT",
                    message: format!(
                        "CLINICORE_JWT_SECRET is {} bytes, minimum {} recommended",
                        secret.len(),
                        JWT_SECRET_MIN_LENGTH
                    ),
                    severity: WarningSeverity::High,
                });
            }
        } else if !self.environment.is_production() {
            warnings.push(SecurityWarning {
                code: "EPHEMERAL_JWT_SECRET",
                message: "No signing secret configured; an ephemeral secret will be generated \
                          and every issued token is invalidated on restart. Unsuitable for \
                          production."
                    .to_string(),
                severity: WarningSeverity::Critical,
            });
        }

        warnings
    }

    /// Log all security warnings at startup
    pub fn log_security_warnings(&self) {
        for warning in self.security_warnings() {
            match warning.severity {
                WarningSeverity::Critical => {
                    tracing::error!("[SECURITY] {}: {}", warning.code, warning.message);
                }
                WarningSeverity::High => {
                    tracing::warn!("[SECURITY] {}: {}", warning.code, warning.message);
                }
                WarningSeverity::Medium => {
                    tracing::info!("[SECURITY] {}: {}", warning.code, warning.message);
                }
            }
        }
    }
}

/// Security warning from configuration validation
#[derive(Debug, Clone)]
pub struct SecurityWarning {
    /// Warning code for programmatic handling
    pub code: &'static str,
    /// Human-readable message
    pub message: String,
    pub severity: WarningSeverity,
}

/// Warning severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Critical,
    High,
    Medium,
}
