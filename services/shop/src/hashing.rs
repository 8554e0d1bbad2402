//! Credential hashing
//!
//! Hashing sits behind [`CredentialHasher`] so the scheme can be swapped
//! without touching account logic. [`Argon2Hasher`] is the default;
//! [`Sha256Hasher`] reproduces the legacy unsalted SHA-256/base64 digests so
//! accounts imported from the old store can still sign in.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Failure to produce a credential hash
#[derive(Error, Debug)]
#[error("Failed to hash password: {0}")]
pub struct HashError(String);

/// One-way credential hashing capability
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext password for storage
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Check a plaintext password against a stored hash
    fn verify(&self, password: &str, stored: &str) -> bool;
}

/// Salted Argon2id hashes in PHC string format
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError(e.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// Deterministic, unsalted SHA-256 digest encoded as base64
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl CredentialHasher for Sha256Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        Ok(STANDARD.encode(Sha256::digest(password.as_bytes())))
    }

    fn verify(&self, password: &str, stored: &str) -> bool {
        STANDARD.encode(Sha256::digest(password.as_bytes())) == stored
    }
}

/// Configured hashing scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    #[default]
    Argon2,
    Sha256,
}

/// Build the hasher for a scheme
pub fn hasher_for(scheme: PasswordScheme) -> Arc<dyn CredentialHasher> {
    match scheme {
        PasswordScheme::Argon2 => Arc::new(Argon2Hasher),
        PasswordScheme::Sha256 => Arc::new(Sha256Hasher),
    }
}
