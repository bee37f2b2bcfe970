//! Error handling types

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the CliniCore authorization core
///
/// Authentication and authorization failures are terminal for a request:
/// there is no partial principal and no silent continuation. Internal
/// failures during resolution map to a 5xx, never to an implicit allow.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable session or bearer token was presented
    #[error("Authentication required")]
    Unauthenticated,

    /// Token signature verified but the expiry claim is in the past
    #[error("Token expired, please log in again")]
    TokenExpired,

    /// Signature mismatch or malformed token; deliberately generic
    #[error("Invalid authentication token")]
    TokenInvalid,

    /// Idle timeout exceeded; the session has been destroyed server-side
    #[error("Session expired, please log in again")]
    SessionExpired,

    /// Authenticated but lacking the required role or permission
    #[error("Access denied: requires {required}")]
    Forbidden { required: String },

    /// Authenticated and permitted, but the resource belongs to another tenant
    #[error("Resource not found")]
    OrganizationMismatch,

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Create a forbidden error naming the missing role or permission
    pub fn forbidden<S: Into<String>>(required: S) -> Self {
        Self::Forbidden {
            required: required.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code this error maps to at the transport boundary
    ///
    /// `OrganizationMismatch` maps to 404 rather than 403 so a response never
    /// confirms that a resource exists in another tenant.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Unauthenticated
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::SessionExpired => 401,
            Self::Forbidden { .. } => 403,
            Self::OrganizationMismatch | Self::NotFound { .. } => 404,
            Self::InvalidArgument { .. } => 400,
            Self::Config { .. } | Self::Internal { .. } => 500,
        }
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}
