//! Administration HTTP API
//!
//! A JSON API over a [`RoleStore`], protected by the [`Gate`]. Every route
//! except `/health` and `/api/auth/login` requires a bearer session token,
//! and the admin routes each require one system permission:
//!
//! | Route | Permission |
//! |---|---|
//! | `GET /api/roles`, `GET /api/roles/{role}/permissions` | `role:read` |
//! | `POST /api/roles` | `role:create` |
//! | `DELETE /api/roles/{role}` | `role:delete` |
//! | `PUT`/`DELETE /api/roles/{role}/permissions/{permission}` | `role:update` |
//! | `GET /api/permissions` | `permission:read` |
//! | `POST /api/permissions` | `permission:create` |
//! | `DELETE /api/permissions/{permission}` | `permission:delete` |
//! | `GET /api/users` | `user:read` |
//! | `POST /api/users` | `user:create` |
//! | `DELETE /api/users/{id}` | `user:delete` |
//! | `PUT`/`DELETE /api/users/{id}/roles/{role}` | `user:update` |

mod admin;
mod errors;
mod extract;
mod session;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::{Json, Router};
use axum::handler::Handler;
use axum::routing::{delete, get, post, put};
use serde::Serialize;

pub use errors::ApiError;

use crate::auth::SessionStore;
use crate::gate::Gate;
use crate::rbac::{Action, PermissionResolver, Resource, SystemPermission};
use crate::store::{GrantReader, InMemory, RoleStore};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoleStore>,
    pub sessions: SessionStore,
    pub gate: Gate,
}

impl AppState {
    /// Wire a resolver and gate over `store`, verifying tokens with `sessions`.
    pub fn new(
        store: Arc<dyn RoleStore>,
        sessions: SessionStore,
        store_timeout: Option<Duration>,
    ) -> Self {
        let reader: Arc<dyn GrantReader> = store.clone();
        let mut resolver = PermissionResolver::new(reader);
        if let Some(limit) = store_timeout {
            resolver = resolver.with_timeout(limit);
        }
        let gate = Gate::new(resolver, Arc::new(sessions.clone()));
        Self {
            store,
            sessions,
            gate,
        }
    }
}

/// Name of the backend serving the store, for the health endpoint.
pub fn backend_name(store: &dyn RoleStore) -> &'static str {
    let any = store.as_any();
    if any.is::<InMemory>() {
        return "inmemory";
    }
    #[cfg(any(feature = "sqlite", feature = "postgres"))]
    if let Some(sql) = any.downcast_ref::<crate::store::SqlStore>() {
        return match sql.kind() {
            crate::store::DbKind::Sqlite => "sqlite",
            crate::store::DbKind::Postgres => "postgres",
        };
    }
    "unknown"
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    backend: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        backend: backend_name(state.store.as_ref()),
    })
}

fn perm(resource: Resource, action: Action) -> String {
    SystemPermission::new(resource, action).to_string()
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let gate = state.gate.clone();
    let require = |resource, action| gate.require(perm(resource, action));

    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(session::login))
        .route("/api/auth/logout", post(session::logout))
        .route("/api/auth/me", get(session::me))
        .route(
            "/api/roles",
            get(admin::list_roles.layer(require(Resource::Role, Action::Read)))
                .post(admin::create_role.layer(require(Resource::Role, Action::Create))),
        )
        .route(
            "/api/roles/{role}",
            delete(admin::delete_role.layer(require(Resource::Role, Action::Delete))),
        )
        .route(
            "/api/roles/{role}/permissions",
            get(admin::role_permissions.layer(require(Resource::Role, Action::Read))),
        )
        .route(
            "/api/roles/{role}/permissions/{permission}",
            put(admin::grant_permission.layer(require(Resource::Role, Action::Update)))
                .delete(admin::revoke_permission.layer(require(Resource::Role, Action::Update))),
        )
        .route(
            "/api/permissions",
            get(admin::list_permissions.layer(require(Resource::Permission, Action::Read)))
                .post(admin::create_permission.layer(require(Resource::Permission, Action::Create))),
        )
        .route(
            "/api/permissions/{permission}",
            delete(admin::delete_permission.layer(require(Resource::Permission, Action::Delete))),
        )
        .route(
            "/api/users",
            get(admin::list_users.layer(require(Resource::User, Action::Read)))
                .post(admin::create_user.layer(require(Resource::User, Action::Create))),
        )
        .route(
            "/api/users/{id}",
            delete(admin::delete_user.layer(require(Resource::User, Action::Delete))),
        )
        .route(
            "/api/users/{id}/roles/{role}",
            put(admin::assign_role.layer(require(Resource::User, Action::Update)))
                .delete(admin::unassign_role.layer(require(Resource::User, Action::Update))),
        )
        .with_state(state)
}
