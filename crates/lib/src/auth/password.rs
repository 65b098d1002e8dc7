//! Argon2id password hashing

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core},
};

use super::AuthError;
use crate::Result;

/// Checked against when the username is unknown, so that path costs the same
/// Argon2 work as a wrong password.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-user-placeholder").ok());

/// Hash a password using Argon2id
///
/// Returns the hash as a PHC string, which embeds the salt and parameters.
pub fn hash_password(password: impl AsRef<str>) -> Result<String> {
    let salt = SaltString::generate(&mut rand_core::OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_ref().as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHashingFailed {
            reason: e.to_string(),
        })?;
    Ok(hash.to_string())
}

/// Verify a password against a PHC hash.
///
/// A hash that cannot be parsed fails like a wrong password.
pub fn verify_password(password: impl AsRef<str>, password_hash: impl AsRef<str>) -> Result<()> {
    let parsed_hash =
        PasswordHash::new(password_hash.as_ref()).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_ref().as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials.into())
}

/// Fail a login for a username that does not exist.
///
/// Runs one verification against a fixed hash first, so the response time
/// does not reveal whether the username exists.
pub fn reject_unknown_user(password: impl AsRef<str>) -> AuthError {
    if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}
