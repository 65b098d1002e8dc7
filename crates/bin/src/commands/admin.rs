//! Store administration commands.
//!
//! Each command opens the configured store, applies one change or listing,
//! and saves the store afterwards when it is the in-memory backend.

use rolegate::rbac::{PermissionName, PrincipalId, RoleName};
use rolegate::store::{GrantReader, RoleStore, seed_defaults};
use serde_json::json;

use crate::backend::{create_store, persist};
use crate::cli::BackendArgs;
use crate::output::{OutputFormat, Table, print_json};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Resolve a username to its principal id.
async fn user_id(
    store: &dyn RoleStore,
    username: &str,
) -> Result<PrincipalId, Box<dyn std::error::Error>> {
    match store.find_user(username).await? {
        Some(user) => Ok(user.id),
        None => Err(format!("No user named '{username}'").into()),
    }
}

/// Run the `seed` command
pub async fn seed(args: &BackendArgs, format: OutputFormat) -> CmdResult {
    let store = create_store(args).await?;
    let report = seed_defaults(store.as_ref()).await?;
    persist(store.as_ref(), args).await?;

    match format {
        OutputFormat::Human => {
            if report.is_noop() {
                println!("Defaults already present.");
            } else {
                println!(
                    "Created {} permissions and {} roles.",
                    report.permissions_created, report.roles_created
                );
            }
        }
        OutputFormat::Json => print_json(&report)?,
    }
    Ok(())
}

/// Run the `roles list` command
pub async fn list_roles(args: &BackendArgs, format: OutputFormat) -> CmdResult {
    let store = create_store(args).await?;
    let roles = store.list_roles().await?;

    let mut listed = Vec::with_capacity(roles.len());
    for role in roles {
        let permissions = store.role_permissions(&role.name).await?;
        listed.push((role, permissions));
    }

    match format {
        OutputFormat::Human => {
            Table::new(&["ROLE", "PERMISSIONS", "DESCRIPTION"])
                .rows(listed.iter().map(|(role, permissions)| {
                    let granted = if role.name.is_administrative() {
                        "(all)".to_string()
                    } else {
                        permissions.len().to_string()
                    };
                    vec![role.name.to_string(), granted, role.description.clone()]
                }))
                .print();
        }
        OutputFormat::Json => {
            let entries: Vec<_> = listed
                .iter()
                .map(|(role, permissions)| {
                    json!({
                        "name": role.name,
                        "description": role.description,
                        "administrative": role.name.is_administrative(),
                        "permissions": permissions,
                    })
                })
                .collect();
            print_json(&json!(entries))?;
        }
    }
    Ok(())
}

/// Run the `roles create` command
pub async fn create_role(args: &BackendArgs, name: &str, description: &str) -> CmdResult {
    let store = create_store(args).await?;
    let name = RoleName::new(name)?;
    store.create_role(&name, description).await?;
    persist(store.as_ref(), args).await?;
    println!("Created role {name}");
    Ok(())
}

/// Run the `roles delete` command
pub async fn delete_role(args: &BackendArgs, name: &str) -> CmdResult {
    let store = create_store(args).await?;
    let name = RoleName::new(name)?;
    store.delete_role(&name).await?;
    persist(store.as_ref(), args).await?;
    println!("Deleted role {name}");
    Ok(())
}

/// Run the `roles grant` command
pub async fn grant(args: &BackendArgs, role: &str, permission: &str) -> CmdResult {
    let store = create_store(args).await?;
    let role = RoleName::new(role)?;
    let permission = PermissionName::new(permission)?;
    store.grant_permission(&role, &permission).await?;
    persist(store.as_ref(), args).await?;
    println!("Granted {permission} to {role}");
    Ok(())
}

/// Run the `roles revoke` command
pub async fn revoke(args: &BackendArgs, role: &str, permission: &str) -> CmdResult {
    let store = create_store(args).await?;
    let role = RoleName::new(role)?;
    let permission = PermissionName::new(permission)?;
    store.revoke_permission(&role, &permission).await?;
    persist(store.as_ref(), args).await?;
    println!("Revoked {permission} from {role}");
    Ok(())
}

/// Run the `permissions list` command
pub async fn list_permissions(args: &BackendArgs, format: OutputFormat) -> CmdResult {
    let store = create_store(args).await?;
    let permissions = store.list_permissions().await?;

    match format {
        OutputFormat::Human => {
            Table::new(&["PERMISSION", "DESCRIPTION"])
                .rows(
                    permissions
                        .iter()
                        .map(|p| vec![p.name.to_string(), p.description.clone()]),
                )
                .print();
        }
        OutputFormat::Json => print_json(&permissions)?,
    }
    Ok(())
}

/// Run the `permissions create` command
pub async fn create_permission(args: &BackendArgs, name: &str, description: &str) -> CmdResult {
    let store = create_store(args).await?;
    let name = PermissionName::new(name)?;
    store.create_permission(&name, description).await?;
    persist(store.as_ref(), args).await?;
    println!("Created permission {name}");
    Ok(())
}

/// Run the `users list` command
pub async fn list_users(args: &BackendArgs, format: OutputFormat) -> CmdResult {
    let store = create_store(args).await?;
    let users = store.list_users().await?;

    let mut listed = Vec::with_capacity(users.len());
    for user in users {
        let roles: Vec<String> = store
            .role_grants(&user.id)
            .await?
            .into_iter()
            .map(|grant| grant.role.to_string())
            .collect();
        listed.push((user, roles));
    }

    match format {
        OutputFormat::Human => {
            Table::new(&["USERNAME", "ID", "ROLES"])
                .rows(listed.iter().map(|(user, roles)| {
                    vec![user.username.clone(), user.id.to_string(), roles.join(",")]
                }))
                .print();
        }
        OutputFormat::Json => {
            let entries: Vec<_> = listed
                .iter()
                .map(|(user, roles)| {
                    json!({
                        "id": user.id,
                        "username": user.username,
                        "roles": roles,
                    })
                })
                .collect();
            print_json(&json!(entries))?;
        }
    }
    Ok(())
}

/// Run the `users create` command
pub async fn create_user(args: &BackendArgs, username: &str, password: &str) -> CmdResult {
    let store = create_store(args).await?;
    let hash = rolegate::auth::hash_password(password)?;
    let user = store.create_user(username, &hash).await?;
    persist(store.as_ref(), args).await?;
    println!("Created user {} ({})", user.username, user.id);
    Ok(())
}

/// Run the `users assign` command
pub async fn assign(args: &BackendArgs, username: &str, role: &str) -> CmdResult {
    let store = create_store(args).await?;
    let id = user_id(store.as_ref(), username).await?;
    let role = RoleName::new(role)?;
    store.assign_role(&id, &role).await?;
    persist(store.as_ref(), args).await?;
    println!("Assigned {role} to {username}");
    Ok(())
}

/// Run the `users unassign` command
pub async fn unassign(args: &BackendArgs, username: &str, role: &str) -> CmdResult {
    let store = create_store(args).await?;
    let id = user_id(store.as_ref(), username).await?;
    let role = RoleName::new(role)?;
    store.unassign_role(&id, &role).await?;
    persist(store.as_ref(), args).await?;
    println!("Removed {role} from {username}");
    Ok(())
}
