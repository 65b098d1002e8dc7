use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use super::TestServer;
use crate::helpers::*;

fn names(body: &serde_json::Value) -> Vec<String> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn admin_manages_roles_end_to_end() {
    let server = TestServer::start().await;
    let token = server.login("root").await;

    let response = server
        .call(
            "POST",
            "/api/roles",
            Some(&token),
            Some(json!({ "name": "auditor", "description": "Read-only reviewer" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["name"], "auditor");

    let response = server
        .call("PUT", "/api/roles/auditor/permissions/kpi:read", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server
        .call("GET", "/api/roles/auditor/permissions", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!(["kpi:read"]));

    let response = server
        .call("DELETE", "/api/roles/auditor/permissions/kpi:read", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server
        .call("DELETE", "/api/roles/auditor", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server.call("GET", "/api/roles", Some(&token), None).await;
    assert_eq!(
        names(&body_json(response).await),
        ["admin", "manager", "staff"]
    );
}

#[tokio::test]
async fn store_errors_map_to_statuses() {
    let server = TestServer::start().await;
    let token = server.login("root").await;

    let response = server
        .call("POST", "/api/roles", Some(&token), Some(json!({ "name": "staff" })))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = server
        .call("DELETE", "/api/roles/ghost", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .call("PUT", "/api/roles/staff/permissions/ghost:read", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = server
        .call(
            "POST",
            "/api/roles",
            Some(&token),
            Some(json!({ "name": "two words" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn custom_permissions_can_be_created_and_deleted() {
    let server = TestServer::start().await;
    let token = server.login("root").await;

    let response = server
        .call(
            "POST",
            "/api/permissions",
            Some(&token),
            Some(json!({ "name": "report:export" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = server.call("GET", "/api/permissions", Some(&token), None).await;
    assert!(names(&body_json(response).await).contains(&"report:export".to_string()));

    let response = server
        .call("DELETE", "/api/permissions/report:export", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = server
        .call("DELETE", "/api/permissions/report:export", Some(&token), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_never_expose_password_hashes() {
    let server = TestServer::start().await;
    let token = server.login("root").await;

    let response = server
        .call(
            "POST",
            "/api/users",
            Some(&token),
            Some(json!({ "username": "nia", "password": "nia-pw" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["username"], "nia");
    assert!(created.get("password_hash").is_none());

    let response = server.call("GET", "/api/users", Some(&token), None).await;
    let users = body_json(response).await;
    for user in users.as_array().unwrap() {
        assert!(user.get("password_hash").is_none());
    }
    assert_eq!(users.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn role_assignment_changes_access() {
    let server = TestServer::start().await;
    let admin = server.login("root").await;
    let staff = server.login("sam").await;
    let sam = server.store.find_user("sam").await.unwrap().unwrap();

    let response = server.call("GET", "/api/users", Some(&staff), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/users/{}/roles/manager", sam.id);
    let response = server.call("PUT", &uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Permissions are read per request, so the existing token sees the change
    let response = server.call("GET", "/api/users", Some(&staff), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = server.call("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = server.call("GET", "/api/users", Some(&staff), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_admins_cannot_administer_roles() {
    let server = TestServer::start().await;
    for username in ["mia", "sam"] {
        let token = server.login(username).await;
        let response = server
            .call(
                "POST",
                "/api/roles",
                Some(&token),
                Some(json!({ "name": "sneaky" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{username}");
        assert_eq!(
            body_json(response).await["error"],
            "Unauthorized: Insufficient permissions"
        );
    }
}

#[tokio::test]
async fn deleted_user_loses_access() {
    let server = TestServer::start().await;
    let admin = server.login("root").await;
    let manager = server.login("mia").await;
    let mia = server.store.find_user("mia").await.unwrap().unwrap();

    let response = server
        .call("DELETE", &format!("/api/users/{}", mia.id), Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The session still authenticates but no roles remain
    let response = server.call("GET", "/api/users", Some(&manager), None).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_role_body_gets_json_error() {
    let server = TestServer::start().await;
    let token = server.login("root").await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/roles")
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"name\": "))
        .unwrap();
    let response = server.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    // Without a token the gate answers first
    let response = server
        .call("POST", "/api/roles", None, Some(json!({ "nom": 1 })))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
