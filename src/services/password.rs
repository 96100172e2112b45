//! Redactor password hashing
//!
//! Passwords are stored as Argon2id PHC strings with a random salt per hash.
//! Plaintext passwords never reach the database.

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with Argon2id.
///
/// The result is a PHC string carrying algorithm, parameters and salt.
///
/// ```ignore
/// use newspaper_agency::services::password::hash_password;
///
/// let hash = hash_password("s3cret-pass")?;
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Check a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only a malformed hash is an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted_argon2id() {
        let first = hash_password("press-pass-42").expect("Failed to hash password");
        let second = hash_password("press-pass-42").expect("Failed to hash password");

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = hash_password("press-pass-42").expect("Failed to hash password");

        assert!(verify_password("press-pass-42", &hash).unwrap());
        assert!(!verify_password("Press-pass-42", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "invalid_hash_format");
        assert!(result.is_err(), "Invalid hash format should return error");
    }

    #[test]
    fn test_hash_does_not_leak_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(!hash.contains("correct horse battery"));
    }

    #[test]
    fn test_non_ascii_password() {
        let hash = hash_password("Zeitung-Ü-ñ").unwrap();
        assert!(verify_password("Zeitung-Ü-ñ", &hash).unwrap());
    }
}
