//! Bearer credential extraction and verification.

use async_trait::async_trait;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use thiserror::Error as ThisError;

use super::AuthError;
use crate::constants::BEARER_SCHEME;
use crate::rbac::PrincipalId;

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// The scheme is matched case-insensitively. A missing header, a non-UTF-8
/// value, another scheme or an empty token all count as no credential.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::AuthenticationMissing)?;

    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::AuthenticationMissing)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::AuthenticationMissing);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::AuthenticationMissing);
    }
    Ok(token)
}

/// Why a credential was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum CredentialError {
    #[error("unknown token")]
    UnknownToken,
    #[error("token expired")]
    Expired,
}

/// Turns a bearer token into the principal it was issued to.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<PrincipalId, CredentialError>;
}
