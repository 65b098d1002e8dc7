//! Role, permission and user administration handlers.
//!
//! The gate has already authorized every request reaching these handlers.

use axum::extract::{Extension, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use super::extract::{Json, Path};
use super::{ApiError, AppState};
use crate::auth::hash_password;
use crate::rbac::{Permission, PermissionName, PrincipalId, Role, RoleName, User};

#[derive(Debug, Deserialize)]
pub(super) struct CreateNamed {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateUser {
    username: String,
    password: String,
}

/// A user without the password hash.
#[derive(Debug, Serialize)]
pub(super) struct UserView {
    id: PrincipalId,
    username: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

pub(super) async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.store.list_roles().await?))
}

pub(super) async fn create_role(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Json(body): Json<CreateNamed>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    let name = RoleName::new(body.name)?;
    let role = state.store.create_role(&name, &body.description).await?;
    tracing::info!(actor = %actor, role = %name, "Role created");
    Ok((StatusCode::CREATED, Json(role)))
}

pub(super) async fn delete_role(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path(role): Path<String>,
) -> Result<StatusCode, ApiError> {
    let role = RoleName::new(role)?;
    state.store.delete_role(&role).await?;
    tracing::info!(actor = %actor, role = %role, "Role deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn role_permissions(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<PermissionName>>, ApiError> {
    let role = RoleName::new(role)?;
    Ok(Json(state.store.role_permissions(&role).await?))
}

pub(super) async fn grant_permission(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path((role, permission)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let role = RoleName::new(role)?;
    let permission = PermissionName::new(permission)?;
    state.store.grant_permission(&role, &permission).await?;
    tracing::info!(actor = %actor, role = %role, permission = %permission, "Permission granted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn revoke_permission(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path((role, permission)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let role = RoleName::new(role)?;
    let permission = PermissionName::new(permission)?;
    state.store.revoke_permission(&role, &permission).await?;
    tracing::info!(actor = %actor, role = %role, permission = %permission, "Permission revoked");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Permission>>, ApiError> {
    Ok(Json(state.store.list_permissions().await?))
}

pub(super) async fn create_permission(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Json(body): Json<CreateNamed>,
) -> Result<(StatusCode, Json<Permission>), ApiError> {
    let name = PermissionName::new(body.name)?;
    let permission = state
        .store
        .create_permission(&name, &body.description)
        .await?;
    tracing::info!(actor = %actor, permission = %name, "Permission created");
    Ok((StatusCode::CREATED, Json(permission)))
}

pub(super) async fn delete_permission(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path(permission): Path<String>,
) -> Result<StatusCode, ApiError> {
    let permission = PermissionName::new(permission)?;
    state.store.delete_permission(&permission).await?;
    tracing::info!(actor = %actor, permission = %permission, "Permission deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

pub(super) async fn create_user(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Json(body): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let hash = hash_password(&body.password)?;
    let user = state.store.create_user(&body.username, &hash).await?;
    tracing::info!(actor = %actor, username = %user.username, "User created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = PrincipalId::new(id);
    state.store.delete_user(&id).await?;
    tracing::info!(actor = %actor, user = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn assign_role(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path((id, role)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = PrincipalId::new(id);
    let role = RoleName::new(role)?;
    state.store.assign_role(&id, &role).await?;
    tracing::info!(actor = %actor, user = %id, role = %role, "Role assigned");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn unassign_role(
    State(state): State<AppState>,
    Extension(actor): Extension<PrincipalId>,
    Path((id, role)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let id = PrincipalId::new(id);
    let role = RoleName::new(role)?;
    state.store.unassign_role(&id, &role).await?;
    tracing::info!(actor = %actor, user = %id, role = %role, "Role unassigned");
    Ok(StatusCode::NO_CONTENT)
}
