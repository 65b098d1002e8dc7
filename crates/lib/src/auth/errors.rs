//! Authentication and authorization error types.
//!
//! Each [`AuthError`] variant corresponds to one terminal outcome of the
//! request gate, and [`AuthError::status_code`] and the `IntoResponse` impl
//! fix the HTTP status and body that clients see for it.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error as ThisError;

use crate::Error;
use crate::constants::{
    INSUFFICIENT_PERMISSIONS, INVALID_LOGIN, INVALID_OR_EXPIRED_TOKEN, NO_TOKEN_PROVIDED,
    PERMISSION_CHECK_UNAVAILABLE,
};

/// Errors produced while authenticating or authorizing a request.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - The `Display` text of the gate variants is part of the wire contract
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, ThisError)]
pub enum AuthError {
    /// No usable bearer credential was supplied.
    #[error("{}", NO_TOKEN_PROVIDED)]
    AuthenticationMissing,

    /// The credential was unknown or expired.
    #[error("{}", INVALID_OR_EXPIRED_TOKEN)]
    AuthenticationInvalid,

    /// The principal is authenticated but lacks the required permission.
    #[error("{}", INSUFFICIENT_PERMISSIONS)]
    AuthorizationDenied,

    /// The permission store could not be consulted.
    #[error("{}", PERMISSION_CHECK_UNAVAILABLE)]
    ResolverUnavailable {
        /// The store failure
        #[source]
        source: Box<Error>,
    },

    /// Username or password did not match at login.
    #[error("{}", INVALID_LOGIN)]
    InvalidCredentials,

    /// Argon2 could not hash a password.
    #[error("Password hashing failed: {reason}")]
    PasswordHashingFailed {
        /// Description of the failure
        reason: String,
    },
}

impl AuthError {
    /// HTTP status for this outcome.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AuthenticationMissing
            | AuthError::AuthenticationInvalid
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::AuthorizationDenied => StatusCode::FORBIDDEN,
            AuthError::ResolverUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::PasswordHashingFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if the request carried no valid identity.
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            AuthError::AuthenticationMissing
                | AuthError::AuthenticationInvalid
                | AuthError::InvalidCredentials
        )
    }

    /// Check if an authenticated principal was refused.
    pub fn is_authorization_error(&self) -> bool {
        matches!(self, AuthError::AuthorizationDenied)
    }

    /// Check if the failure was structural rather than a decision.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, AuthError::ResolverUnavailable { .. })
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Only the fixed message reaches the client; the source stays in logs
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Error::Auth(err)
    }
}
