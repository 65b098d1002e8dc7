//! In-memory store implementation
//!
//! This module provides an in-memory implementation of [`RoleStore`],
//! suitable for testing, development, or small single-node deployments where
//! the whole state is saved to a JSON file on shutdown.

mod persistence;

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::Result;
use crate::rbac::{Permission, PermissionName, PrincipalId, Role, RoleGrant, RoleName, User};
use crate::store::{GrantReader, RoleStore, StoreError};

/// The complete RBAC state guarded by the store's single lock.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct State {
    #[serde(default)]
    pub(crate) roles: BTreeMap<RoleName, Role>,
    #[serde(default)]
    pub(crate) permissions: BTreeMap<PermissionName, Permission>,
    /// role -> permissions attached to it
    #[serde(default)]
    pub(crate) role_permissions: BTreeMap<RoleName, BTreeSet<PermissionName>>,
    /// principal -> roles assigned to it
    #[serde(default)]
    pub(crate) assignments: BTreeMap<PrincipalId, BTreeSet<RoleName>>,
    #[serde(default)]
    pub(crate) users: BTreeMap<PrincipalId, User>,
}

impl State {
    fn require_role(&self, name: &RoleName) -> Result<()> {
        if self.roles.contains_key(name) {
            Ok(())
        } else {
            Err(StoreError::RoleNotFound {
                name: name.to_string(),
            }
            .into())
        }
    }

    fn require_permission(&self, name: &PermissionName) -> Result<()> {
        if self.permissions.contains_key(name) {
            Ok(())
        } else {
            Err(StoreError::PermissionNotFound {
                name: name.to_string(),
            }
            .into())
        }
    }

    fn grants_for(&self, principal: &PrincipalId) -> Vec<RoleGrant> {
        let Some(roles) = self.assignments.get(principal) else {
            return Vec::new();
        };

        roles
            .iter()
            .filter(|role| self.roles.contains_key(*role))
            .map(|role| {
                let permissions = self
                    .role_permissions
                    .get(role)
                    .into_iter()
                    .flatten()
                    .filter(|p| self.permissions.contains_key(*p))
                    .cloned();
                RoleGrant::new(role.clone(), permissions)
            })
            .collect()
    }
}

/// A simple in-memory store.
///
/// Every operation takes the one lock for its whole duration, so each
/// [`GrantReader::role_grants`] call sees a consistent snapshot.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) state: RwLock<State>,
}

impl InMemory {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves the entire store state to a file as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads the store state from a JSON file.
    ///
    /// If the file does not exist, a new, empty store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl GrantReader for InMemory {
    async fn role_grants(&self, principal: &PrincipalId) -> Result<Vec<RoleGrant>> {
        let state = self.state.read().await;
        Ok(state.grants_for(principal))
    }
}

#[async_trait]
impl RoleStore for InMemory {
    async fn create_role(&self, name: &RoleName, description: &str) -> Result<Role> {
        let mut state = self.state.write().await;
        if state.roles.contains_key(name) {
            return Err(StoreError::RoleAlreadyExists {
                name: name.to_string(),
            }
            .into());
        }
        let role = Role {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.clone(),
            description: description.to_string(),
        };
        state.roles.insert(name.clone(), role.clone());
        Ok(role)
    }

    async fn delete_role(&self, name: &RoleName) -> Result<()> {
        let mut state = self.state.write().await;
        if state.roles.remove(name).is_none() {
            return Err(StoreError::RoleNotFound {
                name: name.to_string(),
            }
            .into());
        }
        state.role_permissions.remove(name);
        for roles in state.assignments.values_mut() {
            roles.remove(name);
        }
        state.assignments.retain(|_, roles| !roles.is_empty());
        Ok(())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let state = self.state.read().await;
        Ok(state.roles.values().cloned().collect())
    }

    async fn create_permission(
        &self,
        name: &PermissionName,
        description: &str,
    ) -> Result<Permission> {
        let mut state = self.state.write().await;
        if state.permissions.contains_key(name) {
            return Err(StoreError::PermissionAlreadyExists {
                name: name.to_string(),
            }
            .into());
        }
        let permission = Permission {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.clone(),
            description: description.to_string(),
        };
        state.permissions.insert(name.clone(), permission.clone());
        Ok(permission)
    }

    async fn delete_permission(&self, name: &PermissionName) -> Result<()> {
        let mut state = self.state.write().await;
        if state.permissions.remove(name).is_none() {
            return Err(StoreError::PermissionNotFound {
                name: name.to_string(),
            }
            .into());
        }
        for permissions in state.role_permissions.values_mut() {
            permissions.remove(name);
        }
        Ok(())
    }

    async fn list_permissions(&self) -> Result<Vec<Permission>> {
        let state = self.state.read().await;
        Ok(state.permissions.values().cloned().collect())
    }

    async fn grant_permission(&self, role: &RoleName, permission: &PermissionName) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_role(role)?;
        state.require_permission(permission)?;
        state
            .role_permissions
            .entry(role.clone())
            .or_default()
            .insert(permission.clone());
        Ok(())
    }

    async fn revoke_permission(
        &self,
        role: &RoleName,
        permission: &PermissionName,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_role(role)?;
        if let Some(permissions) = state.role_permissions.get_mut(role) {
            permissions.remove(permission);
        }
        Ok(())
    }

    async fn role_permissions(&self, role: &RoleName) -> Result<Vec<PermissionName>> {
        let state = self.state.read().await;
        state.require_role(role)?;
        Ok(state
            .role_permissions
            .get(role)
            .map(|permissions| permissions.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::UsernameAlreadyExists {
                username: username.to_string(),
            }
            .into());
        }
        let user = User {
            id: PrincipalId::generate(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        state.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn find_user(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user(&self, id: &PrincipalId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(id).cloned())
    }

    async fn delete_user(&self, id: &PrincipalId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.remove(id).is_none() {
            return Err(StoreError::UserNotFound {
                user: id.to_string(),
            }
            .into());
        }
        state.assignments.remove(id);
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn assign_role(&self, principal: &PrincipalId, role: &RoleName) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_role(role)?;
        state
            .assignments
            .entry(principal.clone())
            .or_default()
            .insert(role.clone());
        Ok(())
    }

    async fn unassign_role(&self, principal: &PrincipalId, role: &RoleName) -> Result<()> {
        let mut state = self.state.write().await;
        state.require_role(role)?;
        if let Some(roles) = state.assignments.get_mut(principal) {
            roles.remove(role);
            if roles.is_empty() {
                state.assignments.remove(principal);
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
