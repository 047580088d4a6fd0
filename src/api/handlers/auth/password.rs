//! Password hashing and verification using Argon2id.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

/// Hash a password with a freshly generated salt.
///
/// Returns the PHC string suitable for storage.
///
/// # Errors
/// Returns an error if hashing fails.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; `Err` only for malformed stored hashes.
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed.
pub(crate) fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| anyhow!("invalid stored password hash: {err}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter2!").expect("hash");
        assert!(verify_password("hunter2!", &hash).expect("verify"));
    }

    #[test]
    fn wrong_password_fails() {
        let hash = hash_password("hunter2!").expect("hash");
        assert!(!verify_password("hunter3!", &hash).expect("verify"));
    }

    #[test]
    fn fresh_salt_per_hash() {
        let first = hash_password("hunter2!").expect("hash");
        let second = hash_password("hunter2!").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_stored_hash_is_an_error() {
        assert!(verify_password("hunter2!", "not-a-phc-string").is_err());
    }
}
