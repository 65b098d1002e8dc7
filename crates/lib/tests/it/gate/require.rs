use std::sync::Arc;
use std::time::Duration;

use axum::extract::Extension;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{self, post};
use axum::{Json, Router};
use rolegate::auth::{AuthError, SessionStore};
use rolegate::rbac::{PermissionResolver, PrincipalId};
use rolegate::store::GrantReader;
use rolegate::{Gate, ManualClock};
use serde_json::json;
use tower::ServiceExt;

use crate::helpers::*;

async fn list_organizations() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert("x-handler", HeaderValue::from_static("organizations"));
    (
        StatusCode::IM_A_TEAPOT,
        headers,
        Json(json!({ "organizations": ["acme", "globex"] })),
    )
}

async fn create_organization() -> StatusCode {
    StatusCode::CREATED
}

async fn whoami(Extension(principal): Extension<PrincipalId>) -> String {
    principal.to_string()
}

struct Fixture {
    app: Router,
    sessions: SessionStore,
    reader: Arc<dyn GrantReader>,
}

fn fixture(reader: Arc<dyn GrantReader>) -> Fixture {
    let sessions = SessionStore::default();
    let gate = Gate::new(
        PermissionResolver::new(reader.clone()),
        Arc::new(sessions.clone()),
    );
    let app = Router::new()
        .route(
            "/organizations",
            routing::get(list_organizations).route_layer(gate.require("organization:read")),
        )
        .route(
            "/organizations/new",
            post(create_organization).route_layer(gate.require("organization:create")),
        )
        .route(
            "/whoami",
            routing::get(whoami).route_layer(gate.require("organization:read")),
        );
    Fixture {
        app,
        sessions,
        reader,
    }
}

async fn login(fixture: &Fixture, principal: &str) -> String {
    fixture
        .sessions
        .create_session(PrincipalId::new(principal))
        .await
        .token
}

async fn error_body(response: axum::response::Response) -> String {
    body_json(response).await["error"]
        .as_str()
        .expect("error field")
        .to_string()
}

#[tokio::test]
async fn allowed_request_reaches_handler_unmodified() {
    let f = fixture(Arc::new(CountingReader::new(vec![grant(
        "staff",
        &["organization:read"],
    )])));
    let token = login(&f, "staff-1").await;

    let direct = list_organizations().await.into_response();
    let direct_status = direct.status();
    let direct_body = body_bytes(direct).await;

    let response = f
        .app
        .clone()
        .oneshot(get("/organizations", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), direct_status);
    assert_eq!(response.headers()["x-handler"], "organizations");
    assert_eq!(body_bytes(response).await, direct_body);
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let f = fixture(Arc::new(CountingReader::new(vec![grant(
        "staff",
        &["organization:read"],
    )])));
    let token = login(&f, "staff-1").await;

    let response = f
        .app
        .clone()
        .oneshot(request("POST", "/organizations/new", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        error_body(response).await,
        "Unauthorized: Insufficient permissions"
    );
}

#[tokio::test]
async fn admin_passes_without_explicit_permission() {
    let f = fixture(Arc::new(CountingReader::new(vec![grant("admin", &[])])));
    let token = login(&f, "root").await;

    let response = f
        .app
        .clone()
        .oneshot(request("POST", "/organizations/new", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn missing_header_never_reaches_resolver() {
    let reader = Arc::new(CountingReader::new(vec![grant("admin", &[])]));
    let f = fixture(reader.clone());

    let response = f.app.clone().oneshot(get("/organizations", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(response).await, "Unauthorized: No token provided");
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn malformed_header_counts_as_missing() {
    let reader = Arc::new(CountingReader::new(vec![grant("admin", &[])]));
    let f = fixture(reader.clone());

    let request = axum::http::Request::builder()
        .uri("/organizations")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = f.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_body(response).await, "Unauthorized: No token provided");
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let reader = Arc::new(CountingReader::new(vec![grant("admin", &[])]));
    let f = fixture(reader.clone());

    let response = f
        .app
        .clone()
        .oneshot(get("/organizations", Some("invalid-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_body(response).await,
        "Unauthorized: Invalid or expired token"
    );
    assert_eq!(reader.calls(), 0);
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let reader: Arc<dyn GrantReader> =
        Arc::new(CountingReader::new(vec![grant("admin", &[])]));
    let clock = Arc::new(ManualClock::default());
    let sessions = SessionStore::with_clock(Duration::from_secs(60), clock.clone());
    let gate = Gate::new(PermissionResolver::new(reader), Arc::new(sessions.clone()));
    let app = Router::new().route(
        "/organizations",
        routing::get(list_organizations).route_layer(gate.require("organization:read")),
    );

    let token = sessions.create_session(PrincipalId::new("root")).await.token;
    clock.advance(60_000);

    let response = app.oneshot(get("/organizations", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        error_body(response).await,
        "Unauthorized: Invalid or expired token"
    );
}

#[tokio::test]
async fn store_failure_is_service_unavailable_not_forbidden() {
    let f = fixture(Arc::new(FailingReader));
    let token = login(&f, "staff-1").await;

    let response = f
        .app
        .clone()
        .oneshot(get("/organizations", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        error_body(response).await,
        "Service Unavailable: Unable to verify permissions"
    );
}

#[tokio::test]
async fn store_timeout_is_service_unavailable() {
    let reader: Arc<dyn GrantReader> = Arc::new(SlowReader {
        delay: Duration::from_millis(200),
    });
    let sessions = SessionStore::default();
    let resolver = PermissionResolver::new(reader).with_timeout(Duration::from_millis(20));
    let gate = Gate::new(resolver, Arc::new(sessions.clone()));
    let app = Router::new().route(
        "/organizations",
        routing::get(list_organizations).route_layer(gate.require("organization:read")),
    );
    let token = sessions.create_session(PrincipalId::new("root")).await.token;

    let response = app.oneshot(get("/organizations", Some(&token))).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn handler_sees_authenticated_principal() {
    let f = fixture(Arc::new(CountingReader::new(vec![grant(
        "staff",
        &["organization:read"],
    )])));
    let token = login(&f, "staff-1").await;

    let response = f
        .app
        .clone()
        .oneshot(get("/whoami", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"staff-1");
}

#[tokio::test]
async fn authorize_reports_typed_outcomes() {
    let f = fixture(Arc::new(CountingReader::new(vec![grant(
        "staff",
        &["organization:read"],
    )])));
    let gate = Gate::new(
        PermissionResolver::new(f.reader.clone()),
        Arc::new(f.sessions.clone()),
    );
    let token = login(&f, "staff-1").await;
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );

    let principal = gate.authorize(&headers, "organization:read").await.unwrap();
    assert_eq!(principal, PrincipalId::new("staff-1"));
    assert!(matches!(
        gate.authorize(&headers, "kpi:read").await,
        Err(AuthError::AuthorizationDenied)
    ));
    assert!(matches!(
        gate.authenticate(&HeaderMap::new()).await,
        Err(AuthError::AuthenticationMissing)
    ));
}
