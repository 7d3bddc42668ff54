//! Argon2id credential hashing.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, SecretString};

/// Hashes and verifies passwords with Argon2id and a per-credential random
/// salt. The parameters live in the emitted PHC string, so they can be
/// tightened later without invalidating stored hashes.
#[derive(Clone, Copy, Debug, Default)]
pub struct CredentialHasher;

impl CredentialHasher {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Hash a password into a PHC-format string.
    ///
    /// # Errors
    ///
    /// Returns an error if hashing fails.
    pub fn hash(&self, password: &SecretString) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash password: {err}"))?;

        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC string.
    ///
    /// A mismatch is `Ok(false)`; only a malformed hash is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored hash cannot be parsed.
    pub fn verify(&self, password: &SecretString, stored_hash: &str) -> Result<bool> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|err| anyhow!("malformed password hash: {err}"))?;

        match Argon2::default().verify_password(password.expose_secret().as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(err) => Err(anyhow!("failed to verify password: {err}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() -> Result<()> {
        let hasher = CredentialHasher::new();
        let password = SecretString::from("correct horse battery staple");

        let hash = hasher.hash(&password)?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&password, &hash)?);
        Ok(())
    }

    #[test]
    fn test_wrong_password_is_not_an_error() -> Result<()> {
        let hasher = CredentialHasher::new();
        let hash = hasher.hash(&SecretString::from("hunter2"))?;

        assert!(!hasher.verify(&SecretString::from("hunter3"), &hash)?);
        Ok(())
    }

    #[test]
    fn test_salts_differ_between_hashes() -> Result<()> {
        let hasher = CredentialHasher::new();
        let password = SecretString::from("hunter2");

        let first = hasher.hash(&password)?;
        let second = hasher.hash(&password)?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        let hasher = CredentialHasher::new();
        let result = hasher.verify(&SecretString::from("hunter2"), "not-a-phc-string");
        assert!(result.is_err());
    }
}
