//! Store error types for the Rolegate persistence layer.
//!
//! This module defines structured error types for store operations,
//! providing better error context and type safety compared to string-based errors.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// Role not found by name.
    #[error("Role not found: {name}")]
    RoleNotFound {
        /// The name of the role that was not found
        name: String,
    },

    /// Permission not found by name.
    #[error("Permission not found: {name}")]
    PermissionNotFound {
        /// The name of the permission that was not found
        name: String,
    },

    /// User not found by id or username.
    #[error("User not found: {user}")]
    UserNotFound {
        /// The id or username that was looked up
        user: String,
    },

    /// A role with this name already exists.
    #[error("Role already exists: {name}")]
    RoleAlreadyExists {
        /// The conflicting role name
        name: String,
    },

    /// A permission with this name already exists.
    #[error("Permission already exists: {name}")]
    PermissionAlreadyExists {
        /// The conflicting permission name
        name: String,
    },

    /// A user with this username already exists.
    #[error("Username already exists: {username}")]
    UsernameAlreadyExists {
        /// The conflicting username
        username: String,
    },

    /// A read did not complete within the configured bound.
    #[error("Store read timed out after {after:?}")]
    Timeout {
        /// The bound that elapsed
        after: Duration,
    },

    /// The store cannot be reached.
    #[error("Store unavailable: {reason}")]
    Unavailable {
        /// Description of the failure
        reason: String,
    },

    /// SQL query or connection failed.
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of the failure, including context
        reason: String,
        /// The underlying sqlx error, if any
        #[source]
        source: Option<sqlx::Error>,
    },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        /// The underlying deserialization error
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Stored data violates an invariant the store relies on.
    #[error("Store state inconsistency: {reason}")]
    StateInconsistency {
        /// Description of the inconsistency
        reason: String,
    },
}

impl StoreError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::RoleNotFound { .. }
                | StoreError::PermissionNotFound { .. }
                | StoreError::UserNotFound { .. }
        )
    }

    /// Check if this error indicates a uniqueness conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::RoleAlreadyExists { .. }
                | StoreError::PermissionAlreadyExists { .. }
                | StoreError::UsernameAlreadyExists { .. }
        )
    }

    /// Check if this error is a structural failure to reach the data.
    ///
    /// These are the failures a caller may retry; everything else is a
    /// logical outcome of the request.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Timeout { .. } | StoreError::Unavailable { .. } => true,
            #[cfg(any(feature = "sqlite", feature = "postgres"))]
            StoreError::SqlxError { .. } => true,
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, StoreError::Timeout { .. })
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            StoreError::FileIo { .. }
                | StoreError::SerializationFailed { .. }
                | StoreError::DeserializationFailed { .. }
        )
    }
}

// Conversion from StoreError to the main Error type
impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
