//! Password hashing and signed session tokens.
//!
//! - Passwords are hashed with bcrypt. Hashing and verification are CPU-heavy,
//!   so the async wrappers move them onto tokio's blocking pool.
//! - Sessions are HS256 JSON Web Tokens carrying the admin id and username,
//!   valid for seven days. Verification never fails loudly: any problem with
//!   a token simply means "not logged in".

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Session lifetime: 7 days.
pub const SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 7;

/// Identity embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Admin id
    pub sub: Uuid,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Use the configured secret, or a random per-process one when none is set.
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret.filter(|s| !s.is_empty()) {
            Some(secret) => Self::new(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "SESSION_SECRET is not set; using a random key, sessions will not survive a restart"
                );
                let bytes: [u8; 32] = rand::random();
                Self::new(&bytes)
            }
        }
    }

    /// Sign a fresh session for `admin_id`, expiring in [`SESSION_TTL_SECS`].
    pub fn issue(&self, admin_id: Uuid, username: &str) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        self.sign(&SessionClaims {
            sub: admin_id,
            username: username.to_string(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        })
    }

    fn sign(&self, claims: &SessionClaims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("failed to sign session: {e}")))
    }

    /// Verify signature and expiry. Any failure yields `None`.
    pub fn verify(&self, token: &str) -> Option<SessionClaims> {
        match decode::<SessionClaims>(token, &self.decoding, &self.validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                None
            }
        }
    }
}

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

/// Compare a plaintext password against a bcrypt hash. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))
}
