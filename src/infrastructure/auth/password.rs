//! Password hashing and verification
//!
//! New passwords are hashed with bcrypt at a tunable cost. Verification
//! auto-detects the stored format so argon2 PHC-format hashes from earlier
//! provisioning tooling keep working. Verification answers only true or
//! false; callers never learn whether the user or the password was wrong.

use crate::domain::error::{Error, Result};
use crate::infrastructure::constants::{BCRYPT_COST, PASSWORD_MIN_LENGTH};

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| Error::internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash, auto-detecting the algorithm
///
/// Supports bcrypt (`$2a$`/`$2b$`/`$2y$`) and argon2 (PHC `$argon2...`)
/// formats. An empty hash verifies false.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    if hash.is_empty() {
        return Ok(false);
    }

    if hash.starts_with("$argon2") {
        verify_argon2(password, hash)
    } else if hash.starts_with("$2") {
        verify_bcrypt(password, hash)
    } else {
        Err(Error::internal("Unknown password hash format"))
    }
}

fn verify_bcrypt(password: &str, hash: &str) -> Result<bool> {
    bcrypt::verify(password, hash)
        .map_err(|e| Error::internal(format!("Password verification failed: {}", e)))
}

fn verify_argon2(password: &str, hash: &str) -> Result<bool> {
    use argon2::{
        password_hash::{PasswordHash, PasswordVerifier},
        Argon2,
    };

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| Error::internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Password strength requirements applied on password change
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: PASSWORD_MIN_LENGTH,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
        }
    }
}

impl PasswordPolicy {
    /// Validate a password against the policy
    pub fn validate(&self, password: &str) -> std::result::Result<(), Vec<&'static str>> {
        let mut errors = Vec::new();

        if password.len() < self.min_length {
            errors.push("Password too short");
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            errors.push("Password must contain an uppercase letter");
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            errors.push("Password must contain a lowercase letter");
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push("Password must contain a digit");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
