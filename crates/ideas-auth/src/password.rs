//! Password hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
};
use argon2::Argon2;

use crate::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

/// One-way salted password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` into a self-describing string (algorithm, salt, digest).
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// `Ok(false)` for a wrong password; `Err` only for an unreadable hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError>;
}

/// Argon2id with the crate's default cost parameters, PHC string output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash).map_err(|e| AuthError::Hash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

pub fn check_password_strength(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword {
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_its_own_password() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("open sesame").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(!hash.contains("open sesame"));
        assert!(hasher.verify("open sesame", &hash).unwrap());
        assert!(!hasher.verify("open sesame!", &hash).unwrap());
    }

    #[test]
    fn test_same_password_gets_a_fresh_salt() {
        let hasher = Argon2Hasher::new();
        let a = hasher.hash("hunter22").unwrap();
        let b = hasher.hash("hunter22").unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify("hunter22", &b).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let err = Argon2Hasher::new().verify("x", "not-a-phc-string").unwrap_err();
        assert!(matches!(err, AuthError::Hash(_)));
    }

    #[test]
    fn test_password_strength() {
        assert_eq!(
            check_password_strength("12345"),
            Err(AuthError::WeakPassword { min: 6 })
        );
        assert!(check_password_strength("123456").is_ok());
    }
}
