use axum::http::{Method, StatusCode};
use serde_json::json;

use crate::{
    auth::TokenKeys,
    rest::test_support::{TestApp, SECRET},
};

const PROTECTED: [(Method, &str); 6] = [
    (Method::POST, "/categories"),
    (Method::PUT, "/categories/1"),
    (Method::DELETE, "/categories/1"),
    (Method::POST, "/recipes"),
    (Method::POST, "/reviews"),
    (Method::PUT, "/users/1/password"),
];

#[tokio::test]
async fn missing_invalid_and_expired_tokens_are_401() {
    let app = TestApp::new();
    let (id, _) = app.admin();

    let forged = TokenKeys::new("some-other-secret", 3600)
        .issue(id, "admin@example.com", "admin")
        .unwrap();
    let expired = TokenKeys::new(SECRET, -60)
        .issue(id, "admin@example.com", "admin")
        .unwrap();

    for (method, uri) in PROTECTED {
        let body = Some(json!({"name": "x"}));

        let (status, response) = app.call(method.clone(), uri, None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} without token");
        assert_eq!(response["success"], false);
        assert_eq!(response["message"], "Missing authorization token");

        let (status, _) = app
            .call(method.clone(), uri, Some("not-a-jwt"), body.clone())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} garbage token");

        let (status, response) = app
            .call(method.clone(), uri, Some(&forged), body.clone())
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} forged token");
        assert_eq!(response["message"], "Invalid token");

        let (status, response) = app.call(method.clone(), uri, Some(&expired), body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} expired token");
        assert_eq!(response["message"], "Token expired");
    }
}

#[tokio::test]
async fn non_admins_get_403_on_admin_routes() {
    let app = TestApp::new();
    let (_, member) = app.member();
    let (admin_id, _) = app.admin();

    let cases = [
        (Method::POST, "/roles".to_string(), json!({"name": "chef"})),
        (Method::PUT, "/roles/2".to_string(), json!({"name": "member"})),
        (Method::POST, "/categories".to_string(), json!({"name": "Soups"})),
        (Method::POST, "/ingredients".to_string(), json!({"name": "Salt"})),
        (
            Method::POST,
            "/users".to_string(),
            json!({"name": "Eve", "email": "eve@example.com", "password": "secret1"}),
        ),
        (Method::DELETE, format!("/users/{admin_id}"), json!({})),
    ];
    for (method, uri, body) in cases {
        let (status, response) = app
            .call(method.clone(), &uri, Some(&member), Some(body))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response["success"], false);
    }
}

#[tokio::test]
async fn reads_and_auth_routes_are_public() {
    let app = TestApp::new();
    for uri in ["/health", "/roles", "/categories", "/recipes", "/reviews/recent"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}");
        assert_eq!(body["success"], true);
    }

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"name": "Ana", "email": "ana@example.com", "password": "secret1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn login_token_unlocks_protected_routes() {
    let app = TestApp::new();
    app.call(
        Method::POST,
        "/auth/register",
        None,
        Some(json!({"name": "Ana", "email": "ana@example.com", "password": "secret1"})),
    )
    .await;
    let (_, body) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "ana@example.com", "password": "secret1"})),
        )
        .await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let id = body["data"]["user"]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/users/{id}"),
            Some(&token),
            Some(json!({"name": "Ana Maria"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ana Maria");
}

#[tokio::test]
async fn unknown_routes_are_404_envelopes() {
    let app = TestApp::new();
    let (status, body) = app.get("/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Route not found");

    let (status, _) = app.call(Method::POST, "/nope", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Known path, unsupported method
    let (_, admin) = app.admin();
    for (method, uri) in [(Method::DELETE, "/categories"), (Method::PATCH, "/categories/1")] {
        let (status, body) = app.call(method.clone(), uri, Some(&admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route not found");
    }
}
