use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::TestServer;
use crate::helpers::*;

#[tokio::test]
async fn login_returns_token_for_principal() {
    let server = TestServer::start().await;
    let response = server
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "sam", "password": "sam-pw" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let user = server.store.find_user("sam").await.unwrap().unwrap();
    assert_eq!(body["principal"], user.id.as_str());
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn bad_login_is_unauthorized() {
    let server = TestServer::start().await;
    for (username, password) in [("sam", "wrong"), ("nobody", "sam-pw")] {
        let response = server
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"],
            "Unauthorized: Invalid username or password"
        );
    }
}

#[tokio::test]
async fn me_lists_effective_permissions() {
    let server = TestServer::start().await;
    let token = server.login("sam").await;

    let response = server.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["roles"], json!(["staff"]));
    assert_eq!(body["administrative"], false);
    let permissions: Vec<&str> = body["permissions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p.as_str().unwrap())
        .collect();
    assert!(permissions.contains(&"organization:read"));
    assert!(!permissions.contains(&"organization:create"));
}

#[tokio::test]
async fn me_requires_a_token() {
    let server = TestServer::start().await;
    let response = server.call("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Unauthorized: No token provided"
    );
}

#[tokio::test]
async fn logout_invalidates_token() {
    let server = TestServer::start().await;
    let token = server.login("root").await;

    let response = server
        .call("POST", "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.call("GET", "/api/roles", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["error"],
        "Unauthorized: Invalid or expired token"
    );
}

#[tokio::test]
async fn malformed_login_body_gets_json_error() {
    let server = TestServer::start().await;
    let response = server
        .app
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("JSON"));
}

#[tokio::test]
async fn login_body_missing_fields_gets_json_error() {
    let server = TestServer::start().await;
    let response = server
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "username": "sam" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());
}
