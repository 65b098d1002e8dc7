//! Role-based access control
//!
//! This module holds the RBAC vocabulary (principals, roles, permissions) and
//! the [`PermissionResolver`] that evaluates permission checks against a store.

pub mod errors;
pub mod resolver;
pub mod types;

pub use errors::RbacError;
pub use resolver::{Decision, DenyReason, EffectivePermissions, PermissionResolver, evaluate};
pub use types::*;
