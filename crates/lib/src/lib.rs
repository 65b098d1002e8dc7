//!
//! Rolegate: role-based access control for multi-tenant business services.
//!
//! ## Core Concepts
//!
//! * **Principals, roles and permissions (`rbac`)**: A principal holds roles; a role
//!   holds permissions. Permission names are either built-in `resource:action` pairs
//!   (`rbac::SystemPermission`) or arbitrary custom names.
//! * **Resolver (`rbac::PermissionResolver`)**: Answers "may this principal do this?"
//!   from a single store read. Holding the `admin` role passes every check.
//! * **Stores (`store`)**: `store::GrantReader` is the one read the resolver needs;
//!   `store::RoleStore` adds administration. `store::InMemory` and `store::SqlStore`
//!   implement both.
//! * **Gate (`gate::Gate`)**: Bearer-token authentication plus a permission check,
//!   exposed as a tower layer for axum routes.
//! * **Credentials (`auth`)**: Session tokens, password hashing and the error taxonomy
//!   that fixes the gate's HTTP responses.
//! * **API (`api`)**: An axum router administering the store behind the gate.

pub mod api;
pub mod auth;
pub mod clock;
pub mod constants;
pub mod gate;
pub mod rbac;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::Gate;
pub use rbac::{Decision, DenyReason, PermissionResolver};

/// Result type used throughout the Rolegate library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Rolegate library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Name validation errors from the rbac module
    #[error(transparent)]
    Rbac(rbac::RbacError),

    /// Structured authentication errors from the auth module
    #[error(transparent)]
    Auth(auth::AuthError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Store(_) => "store",
            Error::Rbac(_) => "rbac",
            Error::Auth(_) => "auth",
            Error::Io(_) => "io",
            Error::Serialize(_) => "serialize",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error indicates a conflict (already exists).
    pub fn is_conflict(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_conflict(),
            _ => false,
        }
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Rbac(rbac_err) => rbac_err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if the data could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_unavailable(),
            Error::Auth(auth_err) => auth_err.is_unavailable(),
            _ => false,
        }
    }

    /// Check if this error indicates a timeout.
    pub fn is_timeout_error(&self) -> bool {
        match self {
            Error::Store(store_err) => store_err.is_timeout(),
            _ => false,
        }
    }

    /// Check if this error is authentication-related.
    pub fn is_authentication_error(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_authentication_error(),
            _ => false,
        }
    }

    /// Check if this error indicates permission was denied.
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Auth(auth_err) => auth_err.is_authorization_error(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Store(store_err) => store_err.is_io_error(),
            _ => false,
        }
    }
}
