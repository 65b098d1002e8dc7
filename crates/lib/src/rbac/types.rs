//! Core RBAC data types
//!
//! Principals, roles and permissions are identified by name. Role and
//! permission names are validated newtypes; principal ids are opaque strings
//! issued by the identity collaborator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::RbacError;
use crate::constants::ADMIN_ROLE;

/// Identifier of an authenticated principal.
///
/// Opaque to this crate. An empty id is representable so that callers can
/// pass through whatever the credential layer produced; the resolver denies it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Wrap an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PrincipalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Shared validation for role and permission names.
fn check_name(value: &str) -> Result<(), &'static str> {
    if value.is_empty() {
        return Err("must not be empty");
    }
    if value.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace");
    }
    Ok(())
}

/// Name of a role. Unique within the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleName(String);

impl RoleName {
    pub fn new(name: impl Into<String>) -> Result<Self, RbacError> {
        let name = name.into();
        match check_name(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(RbacError::InvalidRoleName {
                value: name,
                reason,
            }),
        }
    }

    /// The administrative role.
    pub fn admin() -> Self {
        Self(ADMIN_ROLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// See [`is_administrative`].
    pub fn is_administrative(&self) -> bool {
        is_administrative(self)
    }
}

/// Whether holding `role` authorizes every permission check.
///
/// The bypass is keyed on the literal name [`ADMIN_ROLE`]. Renaming the role
/// in the store disables it.
pub fn is_administrative(role: &RoleName) -> bool {
    role.0 == ADMIN_ROLE
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for RoleName {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoleName {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleName> for String {
    fn from(name: RoleName) -> Self {
        name.0
    }
}

/// Business resources guarded by the built-in permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    Organization,
    Contract,
    Kpi,
    Industry,
    Role,
    Permission,
    User,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Organization,
        Resource::Contract,
        Resource::Kpi,
        Resource::Industry,
        Resource::Role,
        Resource::Permission,
        Resource::User,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Organization => "organization",
            Resource::Contract => "contract",
            Resource::Kpi => "kpi",
            Resource::Industry => "industry",
            Resource::Role => "role",
            Resource::Permission => "permission",
            Resource::User => "user",
        }
    }

    /// Resources that hold business data rather than access-control data.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Resource::Organization | Resource::Contract | Resource::Kpi | Resource::Industry
        )
    }
}

/// Actions that can be performed on a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Read, Action::Create, Action::Update, Action::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// A permission known to the system, rendered as `"<resource>:<action>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemPermission {
    pub resource: Resource,
    pub action: Action,
}

impl SystemPermission {
    pub const fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// Every built-in permission, grouped by resource.
    pub fn all() -> impl Iterator<Item = SystemPermission> {
        Resource::ALL.into_iter().flat_map(|resource| {
            Action::ALL
                .into_iter()
                .map(move |action| SystemPermission::new(resource, action))
        })
    }

    /// Human description stored alongside the seeded permission.
    pub fn description(&self) -> String {
        let verb = match self.action {
            Action::Read => "View",
            Action::Create => "Create",
            Action::Update => "Edit",
            Action::Delete => "Delete",
        };
        format!("{verb} {} records", self.resource.as_str())
    }
}

impl fmt::Display for SystemPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource.as_str(), self.action.as_str())
    }
}

impl FromStr for SystemPermission {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || RbacError::UnknownSystemPermission {
            value: s.to_string(),
        };
        let (resource, action) = s.split_once(':').ok_or_else(unknown)?;
        let resource = Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == resource)
            .ok_or_else(unknown)?;
        let action = Action::ALL
            .into_iter()
            .find(|a| a.as_str() == action)
            .ok_or_else(unknown)?;
        Ok(SystemPermission::new(resource, action))
    }
}

/// Name of a permission. Unique within the store.
///
/// Either one of the [`SystemPermission`]s or an arbitrary custom name;
/// comparison is always exact and case-sensitive on the rendered string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionName(String);

impl PermissionName {
    pub fn new(name: impl Into<String>) -> Result<Self, RbacError> {
        let name = name.into();
        match check_name(&name) {
            Ok(()) => Ok(Self(name)),
            Err(reason) => Err(RbacError::InvalidPermissionName {
                value: name,
                reason,
            }),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The built-in permission this name denotes, if any.
    pub fn system(&self) -> Option<SystemPermission> {
        self.0.parse().ok()
    }
}

impl From<SystemPermission> for PermissionName {
    fn from(permission: SystemPermission) -> Self {
        Self(permission.to_string())
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PermissionName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PermissionName {
    type Err = RbacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for PermissionName {
    type Error = RbacError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionName> for String {
    fn from(name: PermissionName) -> Self {
        name.0
    }
}

/// One role assigned to a principal, with the permissions attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: RoleName,
    pub permissions: Vec<PermissionName>,
}

impl RoleGrant {
    pub fn new(role: RoleName, permissions: impl IntoIterator<Item = PermissionName>) -> Self {
        Self {
            role,
            permissions: permissions.into_iter().collect(),
        }
    }
}

/// A role as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: RoleName,
    #[serde(default)]
    pub description: String,
}

/// A permission as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: String,
    pub name: PermissionName,
    #[serde(default)]
    pub description: String,
}

/// A login-capable principal as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: PrincipalId,
    pub username: String,
    /// Argon2 PHC string
    pub password_hash: String,
}
