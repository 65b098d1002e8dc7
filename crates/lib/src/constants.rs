//! Constants used throughout the Rolegate library.
//!
//! This module provides central definitions for reserved role names and the
//! exact response strings that existing API clients depend on.

/// Name of the administrative role.
///
/// A principal holding a role with this exact name is authorized for every
/// permission check, whether or not the permission exists in the store.
pub const ADMIN_ROLE: &str = "admin";

/// Default manager role created by [`crate::store::seed_defaults`].
pub const MANAGER_ROLE: &str = "manager";

/// Default staff role created by [`crate::store::seed_defaults`].
pub const STAFF_ROLE: &str = "staff";

/// Authentication scheme expected in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// Response body for requests without a usable credential.
pub const NO_TOKEN_PROVIDED: &str = "Unauthorized: No token provided";

/// Response body for requests whose credential failed verification.
pub const INVALID_OR_EXPIRED_TOKEN: &str = "Unauthorized: Invalid or expired token";

/// Response body for authenticated requests lacking the required permission.
pub const INSUFFICIENT_PERMISSIONS: &str = "Unauthorized: Insufficient permissions";

/// Response body when the permission store could not be consulted.
pub const PERMISSION_CHECK_UNAVAILABLE: &str = "Service Unavailable: Unable to verify permissions";

/// Response body for a failed username/password login.
pub const INVALID_LOGIN: &str = "Unauthorized: Invalid username or password";

/// Default lifetime of a session token, in seconds.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;
