//! Token signing secret provisioning
//!
//! Two named strategies, selected once at boot from the environment and
//! never re-derived per request:
//!
//! - [`SecretStrategy::Required`] (production): a missing secret aborts the
//!   process with a configuration error before any request is served.
//! - [`SecretStrategy::EphemeralDev`] (non-production): a missing secret is
//!   replaced by a random per-process value, with a loud warning that every
//!   issued token dies on restart.
//!
//! The resulting [`SecretProvider`] is passed by dependency injection into
//! the token codec; request-handling code never reads an ambient global.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::error::{Error, Result};
use crate::infrastructure::config::{AuthSettings, Environment};
use crate::infrastructure::constants::GENERATED_SECRET_LENGTH;

/// How the signing secret is obtained at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretStrategy {
    /// Secret must be configured; refuse to start otherwise
    Required,
    /// Generate a random per-process secret when none is configured
    EphemeralDev,
}

impl SecretStrategy {
    /// Production requires a configured secret; everything else may fall
    /// back to an ephemeral one.
    pub fn for_environment(environment: Environment) -> Self {
        if environment.is_production() {
            Self::Required
        } else {
            Self::EphemeralDev
        }
    }
}

/// Boot-time provisioned signing secret
#[derive(Clone)]
pub struct SecretProvider {
    secret: String,
    strategy: SecretStrategy,
}

impl SecretProvider {
    /// Provision the signing secret according to the environment's strategy
    ///
    /// Fails fast: in production a missing secret is a fatal configuration
    /// error, raised before the listener ever binds.
    pub fn provision(settings: &AuthSettings) -> Result<Self> {
        let strategy = SecretStrategy::for_environment(settings.environment);

        let secret = match (&settings.jwt_secret, strategy) {
            (Some(secret), _) if !secret.is_empty() => secret.clone(),
            (_, SecretStrategy::Required) => {
                return Err(Error::config(
                    "CLINICORE_JWT_SECRET must be set in production; refusing to start \
                     without a token signing secret",
                ));
            }
            (_, SecretStrategy::EphemeralDev) => {
                tracing::warn!(
                    "No signing secret configured; generated an ephemeral development \
                     secret. All issued tokens are invalidated when this process exits. \
                     Do not run this configuration in production."
                );
                generate_secret(GENERATED_SECRET_LENGTH)
            }
        };

        Ok(Self { secret, strategy })
    }

    /// Construct from an explicit secret, mainly for tests and embedding
    pub fn from_secret<S: Into<String>>(secret: S) -> Self {
        Self {
            secret: secret.into(),
            strategy: SecretStrategy::Required,
        }
    }

    /// Key material for the token codec
    pub fn secret(&self) -> &[u8] {
        self.secret.as_bytes()
    }

    pub fn strategy(&self) -> SecretStrategy {
        self.strategy
    }
}

impl std::fmt::Debug for SecretProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material
        f.debug_struct("SecretProvider")
            .field("strategy", &self.strategy)
            .field("secret_len", &self.secret.len())
            .finish()
    }
}

fn generate_secret(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
