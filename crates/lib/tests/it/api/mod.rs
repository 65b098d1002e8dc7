//! Administration API tests, driven through the full router.

mod admin;
mod session;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use rolegate::api::{AppState, router};
use rolegate::auth::{SessionStore, hash_password};
use rolegate::rbac::RoleName;
use rolegate::store::{RoleStore, seed_defaults};
use serde_json::json;
use tower::ServiceExt;

use crate::helpers::*;

/// A seeded server with one user per default role.
///
/// Every user's password is `"{username}-pw"`.
pub struct TestServer {
    pub app: Router,
    pub store: Arc<dyn RoleStore>,
}

impl TestServer {
    pub async fn start() -> Self {
        let store = test_store().await;
        seed_defaults(store.as_ref()).await.unwrap();
        for (username, role_name) in [("root", "admin"), ("mia", "manager"), ("sam", "staff")] {
            let hash = hash_password(format!("{username}-pw")).unwrap();
            let user = store.create_user(username, &hash).await.unwrap();
            store
                .assign_role(&user.id, &RoleName::new(role_name).unwrap())
                .await
                .unwrap();
        }
        let state = AppState::new(store.clone(), SessionStore::default(), None);
        Self {
            app: router(state),
            store,
        }
    }

    pub async fn login(&self, username: &str) -> String {
        let response = self
            .app
            .clone()
            .oneshot(request(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": format!("{username}-pw") })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> axum::response::Response {
        self.app
            .clone()
            .oneshot(request(method, uri, token, body))
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn health_reports_backend() {
    let server = TestServer::start().await;
    let response = server.call("GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(
        ["inmemory", "sqlite", "postgres"].contains(&body["backend"].as_str().unwrap()),
        "unexpected backend {}",
        body["backend"]
    );
}
