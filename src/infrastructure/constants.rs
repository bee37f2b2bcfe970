//! Application-wide constants and default values
//!
//! Centralizes reserved identities, timeouts, and limits so every component
//! reads the same defaults and deployments override them in one place.

// ============================================================================
// Session Configuration
// ============================================================================

/// Default idle timeout between authenticated requests on one session (24h)
pub const SESSION_IDLE_TIMEOUT_SECS: u64 = 86_400;

/// Cookie carrying the opaque session id
pub const SESSION_COOKIE_NAME: &str = "clinicore_session";

// ============================================================================
// Token Configuration
// ============================================================================

/// Default bearer token lifetime (two weeks)
///
/// Long-lived by deployment policy; tokens are stateless and cannot be
/// revoked server-side before expiry.
pub const TOKEN_EXPIRATION_SECS: u64 = 14 * 24 * 3_600;

/// Issuer claim stamped into every token
pub const TOKEN_ISSUER: &str = "clinicore";

/// Minimum signing secret length before a startup warning is raised
pub const JWT_SECRET_MIN_LENGTH: usize = 32;

/// Length of a generated development-only signing secret
pub const GENERATED_SECRET_LENGTH: usize = 64;

// ============================================================================
// Credential Configuration
// ============================================================================

/// bcrypt work factor for newly hashed passwords
pub const BCRYPT_COST: u32 = 12;

/// Minimum password length accepted on password change
pub const PASSWORD_MIN_LENGTH: usize = 8;

// ============================================================================
// RBAC Configuration
// ============================================================================

/// Role name granted an unconditional bypass in role checks
///
/// The permission table still grants this role every permission at seed
/// time, so `has_permission` needs no special case and the super-admin's
/// reach stays explicit and reviewable.
pub const SUPER_ADMIN_ROLE: &str = "superadmin";

/// Reserved principal id used before any real administrator exists
///
/// Never a subject of audit logging. Bootstrap trivia made explicit; the
/// deployed value is configurable.
pub const FALLBACK_PRINCIPAL_ID: i64 = 0;

/// Role assigned when remediating a user found with no role
pub const DEFAULT_REMEDIATION_ROLE: &str = "receptionist";

// ============================================================================
// Server Configuration
// ============================================================================

/// Default HTTP listen port
pub const SERVER_DEFAULT_PORT: u16 = 3000;
