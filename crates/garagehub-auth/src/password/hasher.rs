//! Argon2id password hashing and verification.
//!
//! The rest of the core consumes this as an opaque one-way capability:
//! `hash(plaintext) -> digest` and `verify(plaintext, digest) -> bool`.
//! Swapping the algorithm touches only this file.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};

use garagehub_core::error::AppError;

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext password using Argon2id with a random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext password against a stored Argon2id hash.
    ///
    /// Returns `Ok(true)` if the password matches, `Ok(false)` if not.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash_password("correct horse").unwrap();
        assert!(hasher.verify_password("correct horse", &hash).unwrap());
        assert!(!hasher.verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn test_invalid_digest_is_error_not_false() {
        let hasher = PasswordHasher::new();
        assert!(hasher.verify_password("anything", "not-a-digest").is_err());
    }
}
