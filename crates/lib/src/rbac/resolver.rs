//! Permission resolution
//!
//! [`PermissionResolver`] answers "may this principal do this?" by reading the
//! principal's role grants from a [`GrantReader`] and checking them against
//! the required permission name.
//!
//! The rules, in order:
//! 1. An empty principal id or permission name is denied without a store read.
//! 2. A principal with no roles is denied.
//! 3. A principal holding the administrative role is allowed for any permission.
//! 4. Otherwise the permission must appear in the union of all role grants.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::types::{PermissionName, PrincipalId, RoleGrant, RoleName, is_administrative};
use crate::Result;
use crate::store::{GrantReader, StoreError};

/// Why a permission check was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The principal id or permission name was empty.
    EmptyRequest,
    /// The principal holds no roles.
    NoRoles,
    /// None of the principal's roles carries the permission.
    MissingPermission,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::EmptyRequest => "insufficient permissions: empty principal or permission",
            DenyReason::NoRoles => "insufficient permissions: no roles assigned",
            DenyReason::MissingPermission => {
                "insufficient permissions: permission not granted by any role"
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub authorized: bool,
    /// Present exactly when `authorized` is false.
    pub reason: Option<DenyReason>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            authorized: true,
            reason: None,
        }
    }

    pub fn deny(reason: DenyReason) -> Self {
        Self {
            authorized: false,
            reason: Some(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.authorized
    }
}

/// Evaluate a permission against an already-fetched set of role grants.
pub fn evaluate(grants: &[RoleGrant], permission: &str) -> Decision {
    if permission.is_empty() {
        return Decision::deny(DenyReason::EmptyRequest);
    }
    if grants.is_empty() {
        return Decision::deny(DenyReason::NoRoles);
    }
    if grants.iter().any(|grant| is_administrative(&grant.role)) {
        return Decision::allow();
    }

    let granted = grants
        .iter()
        .flat_map(|grant| grant.permissions.iter())
        .any(|p| p.as_str() == permission);

    if granted {
        Decision::allow()
    } else {
        Decision::deny(DenyReason::MissingPermission)
    }
}

/// Everything a principal can do, as seen by one store read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectivePermissions {
    pub principal: PrincipalId,
    /// True when one of the roles is the administrative role.
    pub administrative: bool,
    pub roles: Vec<RoleName>,
    /// Union of explicitly granted permissions.
    pub permissions: BTreeSet<PermissionName>,
}

impl EffectivePermissions {
    fn from_grants(principal: PrincipalId, grants: Vec<RoleGrant>) -> Self {
        let mut roles = Vec::with_capacity(grants.len());
        let mut permissions = BTreeSet::new();
        for grant in grants {
            permissions.extend(grant.permissions);
            roles.push(grant.role);
        }
        roles.sort();
        roles.dedup();
        Self {
            principal,
            administrative: roles.iter().any(is_administrative),
            roles,
            permissions,
        }
    }

    /// Same answer [`PermissionResolver::resolve`] gives for this snapshot.
    pub fn allows(&self, permission: &str) -> bool {
        if permission.is_empty() || self.roles.is_empty() {
            return false;
        }
        self.administrative || self.permissions.iter().any(|p| p.as_str() == permission)
    }
}

/// Decides whether principals hold permissions.
///
/// Stateless apart from the injected store handle; clones share the store.
#[derive(Clone)]
pub struct PermissionResolver {
    reader: Arc<dyn GrantReader>,
    timeout: Option<Duration>,
}

impl PermissionResolver {
    pub fn new(reader: Arc<dyn GrantReader>) -> Self {
        Self {
            reader,
            timeout: None,
        }
    }

    /// Bound every store read. A read that takes longer fails with
    /// [`StoreError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn fetch(&self, principal: &PrincipalId) -> Result<Vec<RoleGrant>> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.reader.role_grants(principal))
                .await
                .map_err(|_| StoreError::Timeout { after: limit })?,
            None => self.reader.role_grants(principal).await,
        }
    }

    /// Check whether `principal` holds `permission`.
    ///
    /// Only structural store failures are returned as errors; every other
    /// outcome is a [`Decision`].
    pub async fn resolve(&self, principal: &str, permission: &str) -> Result<Decision> {
        if principal.is_empty() || permission.is_empty() {
            tracing::warn!(
                principal,
                permission,
                "Permission check with empty principal or permission"
            );
            return Ok(Decision::deny(DenyReason::EmptyRequest));
        }

        let principal_id = PrincipalId::new(principal);
        let grants = self.fetch(&principal_id).await.inspect_err(|e| {
            tracing::error!(principal, permission, error = %e, "Failed to read role grants");
        })?;

        let decision = evaluate(&grants, permission);
        match decision.reason {
            None => tracing::debug!(principal, permission, "Permission granted"),
            Some(reason) => tracing::info!(principal, permission, %reason, "Permission denied"),
        }
        Ok(decision)
    }

    /// Read the principal's full permission picture.
    pub async fn effective_permissions(
        &self,
        principal: &PrincipalId,
    ) -> Result<EffectivePermissions> {
        if principal.is_empty() {
            return Ok(EffectivePermissions::from_grants(principal.clone(), vec![]));
        }
        let grants = self.fetch(principal).await?;
        Ok(EffectivePermissions::from_grants(principal.clone(), grants))
    }
}

impl fmt::Debug for PermissionResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionResolver")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
