//! Storage for roles, permissions, users and their assignments
//!
//! Two traits split the store surface:
//!
//! - [`GrantReader`] is the single read the [`PermissionResolver`] depends on.
//!   Test fakes only need to implement this.
//! - [`RoleStore`] adds the administrative operations used by the HTTP API and
//!   the CLI.
//!
//! Implementations:
//!
//! - [`InMemory`]: one lock over the whole state, optional JSON persistence
//! - [`SqlStore`] (features `sqlite` / `postgres`): sqlx `AnyPool`
//!
//! [`PermissionResolver`]: crate::rbac::PermissionResolver

use std::any::Any;

use async_trait::async_trait;

use crate::Result;
use crate::rbac::{Permission, PermissionName, PrincipalId, Role, RoleGrant, RoleName, User};

mod errors;
pub use errors::StoreError;

pub mod in_memory;
pub use in_memory::InMemory;

#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub mod sql;
#[cfg(any(feature = "sqlite", feature = "postgres"))]
pub use sql::{DbKind, SqlStore};

mod seed;
pub use seed::{SeedReport, default_role_permissions, seed_defaults};

/// Read access to a principal's role grants.
#[async_trait]
pub trait GrantReader: Send + Sync {
    /// All roles currently assigned to `principal`, each with its permissions.
    ///
    /// A principal unknown to the store has no roles; that is not an error.
    /// Implementations must fetch everything in one read so the result is a
    /// consistent snapshot.
    async fn role_grants(&self, principal: &PrincipalId) -> Result<Vec<RoleGrant>>;
}

/// Full administrative access to the RBAC data.
///
/// Name uniqueness for roles, permissions and usernames is enforced here.
/// Deleting a role, permission or user also removes every assignment or grant
/// that refers to it.
#[async_trait]
pub trait RoleStore: GrantReader + Any {
    /// Create a role. Fails with [`StoreError::RoleAlreadyExists`] on a duplicate name.
    async fn create_role(&self, name: &RoleName, description: &str) -> Result<Role>;

    /// Delete a role and all of its assignments and grants.
    async fn delete_role(&self, name: &RoleName) -> Result<()>;

    /// All roles ordered by name.
    async fn list_roles(&self) -> Result<Vec<Role>>;

    /// Create a permission. Fails with [`StoreError::PermissionAlreadyExists`] on a duplicate name.
    async fn create_permission(
        &self,
        name: &PermissionName,
        description: &str,
    ) -> Result<Permission>;

    /// Delete a permission and remove it from every role.
    async fn delete_permission(&self, name: &PermissionName) -> Result<()>;

    /// All permissions ordered by name.
    async fn list_permissions(&self) -> Result<Vec<Permission>>;

    /// Attach a permission to a role. Granting twice is a no-op.
    async fn grant_permission(&self, role: &RoleName, permission: &PermissionName) -> Result<()>;

    /// Detach a permission from a role. Revoking an absent grant is a no-op.
    async fn revoke_permission(&self, role: &RoleName, permission: &PermissionName)
    -> Result<()>;

    /// Permissions attached to a role, ordered by name.
    async fn role_permissions(&self, role: &RoleName) -> Result<Vec<PermissionName>>;

    /// Create a login-capable principal with a fresh id.
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;

    /// Look a user up by username.
    async fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Look a user up by principal id.
    async fn get_user(&self, id: &PrincipalId) -> Result<Option<User>>;

    /// Delete a user and all of its role assignments.
    async fn delete_user(&self, id: &PrincipalId) -> Result<()>;

    /// All users ordered by username.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Assign a role to a principal. Assigning twice is a no-op.
    ///
    /// The principal does not need a user record; ids issued by an external
    /// identity system can hold roles too.
    async fn assign_role(&self, principal: &PrincipalId, role: &RoleName) -> Result<()>;

    /// Remove a role from a principal. Removing an absent assignment is a no-op.
    async fn unassign_role(&self, principal: &PrincipalId, role: &RoleName) -> Result<()>;

    /// Returns a reference to the store as a dynamic `Any` type.
    ///
    /// This allows for downcasting to a concrete implementation if necessary,
    /// e.g. to persist an [`InMemory`] store on shutdown.
    fn as_any(&self) -> &dyn Any;
}
