// Password hashing and validation service

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use std::sync::OnceLock;
use tracing::error;

use crate::auth::error::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a fresh random salt
    pub fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Failed to hash password: {}", e);
                AuthError::PasswordHashError
            })
    }

    /// Verify a password against a stored hash
    ///
    /// A mismatch is `Ok(false)`; an unparseable stored hash is an error.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!("Stored password hash is malformed: {}", e);
            AuthError::PasswordHashError
        })?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Run a full verification against a throwaway hash
    ///
    /// Used when no account matches, so that path costs the same Argon2 work
    /// as a wrong password on a real account. Never matches.
    pub fn verify_dummy(password: &str) -> Result<(), AuthError> {
        static DUMMY_HASH: OnceLock<String> = OnceLock::new();

        let hash = match DUMMY_HASH.get() {
            Some(hash) => hash,
            None => {
                let hash = Self::hash_password("showroom-dummy-credential")?;
                DUMMY_HASH.get_or_init(|| hash)
            }
        };
        Self::verify_password(password, hash)?;
        Ok(())
    }

    /// Validate password strength requirements
    pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
        let length = password.chars().count();
        if length < MIN_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(AuthError::ValidationError(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }
        if password.trim().is_empty() {
            return Err(AuthError::ValidationError(
                "Password must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
