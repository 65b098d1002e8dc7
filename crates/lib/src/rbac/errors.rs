//! Error types for RBAC naming and validation.

use thiserror::Error as ThisError;

use crate::Error;

/// Errors raised while constructing RBAC values.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RbacError {
    /// A role name failed validation.
    #[error("Invalid role name '{value}': {reason}")]
    InvalidRoleName {
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A permission name failed validation.
    #[error("Invalid permission name '{value}': {reason}")]
    InvalidPermissionName {
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },

    /// A string did not name one of the built-in system permissions.
    #[error("Unknown system permission: {value}")]
    UnknownSystemPermission {
        /// The unrecognized value
        value: String,
    },
}

impl RbacError {
    /// Check if this error is a rejected name.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            RbacError::InvalidRoleName { .. } | RbacError::InvalidPermissionName { .. }
        )
    }

    /// The offending input, whatever the variant.
    pub fn value(&self) -> &str {
        match self {
            RbacError::InvalidRoleName { value, .. }
            | RbacError::InvalidPermissionName { value, .. }
            | RbacError::UnknownSystemPermission { value } => value,
        }
    }
}

impl From<RbacError> for Error {
    fn from(err: RbacError) -> Self {
        Error::Rbac(err)
    }
}
