//! Default roles and permissions.

use serde::Serialize;

use super::RoleStore;
use crate::Result;
use crate::constants::{ADMIN_ROLE, MANAGER_ROLE, STAFF_ROLE};
use crate::rbac::{Action, PermissionName, Resource, RoleName, SystemPermission};

/// What a [`seed_defaults`] run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: usize,
    pub grants_applied: usize,
}

impl SeedReport {
    /// True when the store already held everything.
    pub fn is_noop(&self) -> bool {
        self.permissions_created == 0 && self.roles_created == 0 && self.grants_applied == 0
    }
}

/// The default roles and the permissions each one is granted.
///
/// `admin` carries no explicit grants; it passes every check by name.
pub fn default_role_permissions() -> Vec<(&'static str, Vec<SystemPermission>)> {
    let manager = SystemPermission::all()
        .filter(|p| {
            p.action == Action::Read
                || (p.resource.is_business() && matches!(p.action, Action::Create | Action::Update))
        })
        .collect();
    let staff = Resource::ALL
        .iter()
        .filter(|r| r.is_business())
        .map(|r| SystemPermission::new(*r, Action::Read))
        .collect();

    vec![
        (ADMIN_ROLE, Vec::new()),
        (MANAGER_ROLE, manager),
        (STAFF_ROLE, staff),
    ]
}

/// Create every system permission and the default roles.
///
/// Safe to run repeatedly: existing roles and permissions are left alone.
/// Default grants are only applied to a role created by this run, so a grant
/// an operator revoked from an existing role stays revoked.
pub async fn seed_defaults(store: &dyn RoleStore) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let existing: Vec<PermissionName> = store
        .list_permissions()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    for permission in SystemPermission::all() {
        let name = PermissionName::from(permission);
        if !existing.contains(&name) {
            store
                .create_permission(&name, &permission.description())
                .await?;
            report.permissions_created += 1;
        }
    }

    let existing_roles: Vec<RoleName> = store
        .list_roles()
        .await?
        .into_iter()
        .map(|r| r.name)
        .collect();
    for (role, permissions) in default_role_permissions() {
        let role = RoleName::new(role)?;
        if existing_roles.contains(&role) {
            tracing::debug!(role = %role, "Default role already present");
            continue;
        }
        store
            .create_role(&role, &format!("Default {role} role"))
            .await?;
        report.roles_created += 1;
        for permission in permissions {
            store
                .grant_permission(&role, &PermissionName::from(permission))
                .await?;
            report.grants_applied += 1;
        }
    }

    tracing::info!(
        permissions_created = report.permissions_created,
        roles_created = report.roles_created,
        "Seeded default roles and permissions"
    );
    Ok(report)
}
