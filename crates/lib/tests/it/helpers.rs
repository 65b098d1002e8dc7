use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use rolegate::Result;
use rolegate::rbac::{PermissionName, PrincipalId, RoleGrant, RoleName};
use rolegate::store::{GrantReader, InMemory, RoleStore, StoreError};

// ==========================
// CORE TEST FACTORIES
// ==========================
// Single point of change for backend matrix testing via TEST_BACKEND env var.

/// Creates a test store based on TEST_BACKEND env var.
///
/// Supported values:
/// - "inmemory" or unset: InMemory store (default)
/// - "sqlite": SQLite in-memory store (requires `sqlite` feature)
/// - "postgres": PostgreSQL store in an isolated schema (requires `postgres`
///   feature and TEST_POSTGRES_URL)
///
/// ```bash
/// TEST_BACKEND=sqlite cargo test
/// TEST_BACKEND=postgres TEST_POSTGRES_URL="postgres://localhost/rolegate_test" cargo test
/// ```
pub async fn test_store() -> Arc<dyn RoleStore> {
    match std::env::var("TEST_BACKEND").as_deref() {
        Ok("sqlite") => {
            #[cfg(feature = "sqlite")]
            {
                use rolegate::store::SqlStore;
                Arc::new(
                    SqlStore::sqlite_in_memory()
                        .await
                        .expect("Failed to create SQLite store"),
                )
            }
            #[cfg(not(feature = "sqlite"))]
            {
                panic!("TEST_BACKEND=sqlite requires the 'sqlite' feature to be enabled")
            }
        }
        Ok("postgres") => {
            #[cfg(feature = "postgres")]
            {
                use rolegate::store::SqlStore;
                let url = std::env::var("TEST_POSTGRES_URL")
                    .unwrap_or_else(|_| "postgres://localhost/rolegate_test".to_string());
                Arc::new(
                    SqlStore::connect_postgres_isolated(&url)
                        .await
                        .expect("Failed to connect to PostgreSQL"),
                )
            }
            #[cfg(not(feature = "postgres"))]
            {
                panic!("TEST_BACKEND=postgres requires the 'postgres' feature to be enabled")
            }
        }
        Ok("inmemory") | Err(_) => Arc::new(InMemory::new()),
        Ok(other) => panic!("Unknown TEST_BACKEND: {other}"),
    }
}

pub fn role(name: &str) -> RoleName {
    RoleName::new(name).expect("valid role name")
}

pub fn perm(name: &str) -> PermissionName {
    PermissionName::new(name).expect("valid permission name")
}

/// Create a role with the given permissions, creating missing permissions.
pub async fn create_role_with(store: &dyn RoleStore, name: &str, permissions: &[&str]) {
    store.create_role(&role(name), "").await.expect("create role");
    let existing: Vec<PermissionName> = store
        .list_permissions()
        .await
        .expect("list permissions")
        .into_iter()
        .map(|p| p.name)
        .collect();
    for p in permissions {
        if !existing.contains(&perm(p)) {
            store.create_permission(&perm(p), "").await.expect("create permission");
        }
        store
            .grant_permission(&role(name), &perm(p))
            .await
            .expect("grant permission");
    }
}

/// Assign roles to a principal id, returning the id.
pub async fn principal_with(store: &dyn RoleStore, id: &str, roles: &[&str]) -> PrincipalId {
    let principal = PrincipalId::new(id);
    for r in roles {
        store
            .assign_role(&principal, &role(r))
            .await
            .expect("assign role");
    }
    principal
}

// ==========================
// FAKE READERS
// ==========================

/// Serves fixed grants and counts reads.
#[derive(Default)]
pub struct CountingReader {
    grants: Vec<RoleGrant>,
    calls: AtomicUsize,
}

impl CountingReader {
    pub fn new(grants: Vec<RoleGrant>) -> Self {
        Self {
            grants,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GrantReader for CountingReader {
    async fn role_grants(&self, _principal: &PrincipalId) -> Result<Vec<RoleGrant>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.grants.clone())
    }
}

/// Fails every read as if the database were unreachable.
pub struct FailingReader;

#[async_trait]
impl GrantReader for FailingReader {
    async fn role_grants(&self, _principal: &PrincipalId) -> Result<Vec<RoleGrant>> {
        Err(StoreError::Unavailable {
            reason: "connection refused".to_string(),
        }
        .into())
    }
}

/// Answers after a delay.
pub struct SlowReader {
    pub delay: Duration,
}

#[async_trait]
impl GrantReader for SlowReader {
    async fn role_grants(&self, _principal: &PrincipalId) -> Result<Vec<RoleGrant>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![RoleGrant::new(role("admin"), [])])
    }
}

pub fn grant(role_name: &str, permissions: &[&str]) -> RoleGrant {
    RoleGrant::new(role(role_name), permissions.iter().map(|p| perm(p)))
}

// ==========================
// HTTP HELPERS
// ==========================

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request("GET", uri, token, None)
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("json body")
}
