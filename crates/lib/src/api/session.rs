//! Login, logout and "who am I".

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};

use super::extract::Json;
use super::{ApiError, AppState};
use crate::auth::{AuthError, bearer_token, reject_unknown_user, verify_password};
use crate::rbac::{EffectivePermissions, PrincipalId};

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LoginResponse {
    token: String,
    principal: PrincipalId,
    expires_at: String,
}

/// POST /api/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Some(user) = state.store.find_user(&request.username).await? else {
        tracing::info!(username = %request.username, "Login for unknown user");
        return Err(reject_unknown_user(&request.password).into());
    };
    if verify_password(&request.password, &user.password_hash).is_err() {
        tracing::info!(username = %request.username, "Login with wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let session = state.sessions.create_session(user.id).await;
    tracing::info!(username = %request.username, "User logged in");
    Ok(Json(LoginResponse {
        expires_at: session.expires_at(),
        token: session.token,
        principal: session.principal,
    }))
}

/// POST /api/auth/logout
pub(super) async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    state.gate.authenticate(&headers).await?;
    let token = bearer_token(&headers)?;
    state.sessions.destroy_session(token).await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub(super) async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<EffectivePermissions>, ApiError> {
    let principal = state.gate.authenticate(&headers).await?;
    let effective = state
        .gate
        .resolver()
        .effective_permissions(&principal)
        .await?;
    Ok(Json(effective))
}
