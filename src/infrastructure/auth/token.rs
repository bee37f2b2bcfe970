//! Stateless bearer token codec
//!
//! Tokens are compact three-part signed structures: header, claim payload,
//! detached signature. Only the signature proves authenticity; the secret
//! is injected at construction and never embedded in the token. Because
//! tokens are stateless they cannot be revoked server-side before expiry.

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::error::{Error, Result};
use crate::domain::model::{OrganizationId, User, UserId};
use crate::domain::principal::Principal;
use crate::infrastructure::secret::SecretProvider;
use crate::infrastructure::utils::TimeUtils;

/// Token claim payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: UserId,
    /// Login name
    pub username: String,
    /// Role name
    pub role: String,
    /// Home tenant, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<OrganizationId>,
    /// Issued at timestamp
    pub iat: u64,
    /// Expiration timestamp
    pub exp: u64,
    /// Issuer
    pub iss: String,
}

impl Claims {
    /// Claims for a user, expiring `ttl_secs` from now
    pub fn for_user(user: &User, issuer: &str, ttl_secs: u64) -> Self {
        let now = TimeUtils::now_unix_secs();
        Self {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            org: user.organization_id,
            iat: now,
            exp: now + ttl_secs,
            iss: issuer.to_string(),
        }
    }

    /// Principal view of these claims
    ///
    /// Token-based principals carry no canonical `role_id`: the token holds
    /// only minimal identity claims, and permission checks resolve the role
    /// through the repository instead.
    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.sub,
            username: self.username.clone(),
            role: self.role.clone(),
            role_id: None,
            organization_id: self.org,
            current_organization_id: None,
        }
    }
}

/// Signs and verifies bearer tokens
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl_secs: u64,
}

impl TokenCodec {
    pub fn new(secrets: &SecretProvider, issuer: String, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secrets.secret()),
            decoding_key: DecodingKey::from_secret(secrets.secret()),
            issuer,
            ttl_secs,
        }
    }

    /// Issue a token for a user with the configured lifetime
    pub fn issue_for(&self, user: &User) -> Result<String> {
        self.issue(&Claims::for_user(user, &self.issuer, self.ttl_secs))
    }

    /// Sign an explicit claim set
    pub fn issue(&self, claims: &Claims) -> Result<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| Error::internal(format!("Token signing failed: {}", e)))
    }

    /// Verify signature and expiry, distinguishing the two failure modes
    ///
    /// A valid signature with a past expiry is `TokenExpired`; any signature
    /// mismatch or malformed structure is `TokenInvalid`. Callers rely on
    /// the distinction for accurate user-facing messages.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        // exact expiry semantics, no clock leeway
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                _ => Error::TokenInvalid,
            })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec_with(secret: &str) -> TokenCodec {
        TokenCodec::new(
            &SecretProvider::from_secret(secret),
            "clinicore".to_string(),
            3_600,
        )
    }

    fn sample_user() -> User {
        User {
            id: 42,
            username: "dr.osei".to_string(),
            password_hash: String::new(),
            role: "doctor".to_string(),
            role_id: Some(3),
            organization_id: Some(9),
            active: true,
        }
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let codec = codec_with("unit-test-secret-of-reasonable-size");
        let token = codec.issue_for(&sample_user()).expect("issue");
        let claims = codec.verify(&token).expect("verify");

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, "doctor");
        assert_eq!(claims.org, Some(9));
        assert_eq!(claims.iss, "clinicore");
    }

    #[test]
    fn test_foreign_secret_is_invalid_not_expired() {
        let issuing = codec_with("first-secret-first-secret-first!");
        let verifying = codec_with("second-secret-second-secret-2nd!");

        let token = issuing.issue_for(&sample_user()).expect("issue");
        assert!(matches!(verifying.verify(&token), Err(Error::TokenInvalid)));
    }

    #[test]
    fn test_tampered_payload_is_invalid() {
        let codec = codec_with("unit-test-secret-of-reasonable-size");
        let token = codec.issue_for(&sample_user()).expect("issue");

        // flip a character inside the payload segment
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut payload: Vec<u8> = parts[1].clone().into_bytes();
        payload[0] = if payload[0] == b'A' { b'B' } else { b'A' };
        parts[1] = String::from_utf8(payload).unwrap();
        let tampered = parts.join(".");

        assert!(matches!(codec.verify(&tampered), Err(Error::TokenInvalid)));
    }

    #[test]
    fn test_past_expiry_with_valid_signature_is_expired() {
        let codec = codec_with("unit-test-secret-of-reasonable-size");
        let now = TimeUtils::now_unix_secs();
        let claims = Claims {
            sub: 42,
            username: "dr.osei".to_string(),
            role: "doctor".to_string(),
            org: Some(9),
            iat: now - 10,
            exp: now - 1,
            iss: "clinicore".to_string(),
        };

        let token = codec.issue(&claims).expect("issue");
        assert!(matches!(codec.verify(&token), Err(Error::TokenExpired)));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let codec = codec_with("unit-test-secret-of-reasonable-size");
        assert!(matches!(
            codec.verify("not-a-token"),
            Err(Error::TokenInvalid)
        ));
    }

    #[test]
    fn test_token_principal_has_no_canonical_role() {
        let codec = codec_with("unit-test-secret-of-reasonable-size");
        let token = codec.issue_for(&sample_user()).expect("issue");
        let principal = codec.verify(&token).expect("verify").to_principal();

        assert_eq!(principal.id, 42);
        assert_eq!(principal.role_id, None);
        assert_eq!(principal.effective_organization(), Some(9));
    }
}
