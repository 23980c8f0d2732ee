//! Integration tests for the authentication flow.

mod helpers;

use axum::http::StatusCode;
use helpers::{Device, PASSWORD, TestApp};

#[tokio::test]
async fn test_register_and_duplicate() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({
                "username": "alice2",
                "email": "ALICE@example.com",
                "password": PASSWORD,
            })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "USER_ALREADY_EXISTS");
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({
                "username": "bob",
                "email": "not-an-email",
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");

    let response = app
        .request(
            "POST",
            "/api/auth/register",
            Some(serde_json::json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "abc",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_sets_cookies() {
    let app = TestApp::new();
    let email = app.register("carol").await;
    let mut device = Device::new();

    let response = app.login(&mut device, &email).await;

    assert_eq!(response.body["message"], "Login successful");
    assert_eq!(response.body["user"]["username"], "carol");
    assert!(response.body.get("access_token").is_none());
    assert!(device.cookie("accessToken").is_some());
    assert!(device.cookie("refreshToken").is_some());
    assert!(
        response
            .set_cookies
            .iter()
            .all(|c| c.contains("HttpOnly") && c.contains("Path=/"))
    );
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    let email = app.register("dave").await;

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": email, "password": "wrongpassword" })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "INVALID_CREDENTIALS");
    assert!(response.set_cookies.is_empty());
}

#[tokio::test]
async fn test_login_unknown_user_looks_like_wrong_password() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/login",
            Some(serde_json::json!({ "email": "nobody@example.com", "password": PASSWORD })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "INVALID_CREDENTIALS");
}

#[tokio::test]
async fn test_validate_and_me() {
    let app = TestApp::new();
    let email = app.register("erin").await;
    let mut device = Device::new();
    app.login(&mut device, &email).await;

    let response = app.validate(&mut device).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["valid"], true);
    assert_eq!(response.body["user"]["email"], "erin@example.com");

    let response = app.send(&mut device, "GET", "/api/auth/me", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["username"], "erin");
}

#[tokio::test]
async fn test_validate_without_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/auth/validate", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["valid"], false);
    assert_eq!(response.body["reason"], "no token");

    let response = app.request("GET", "/api/auth/me", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_validate_garbage_token() {
    let app = TestApp::new();
    let mut device = Device::new();
    device.set_cookie("accessToken", "not.a.jwt");

    let response = app.validate(&mut device).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["reason"], "invalid token");
}

#[tokio::test]
async fn test_refresh_rotates_cookie() {
    let app = TestApp::new();
    let email = app.register("frank").await;
    let mut device = Device::new();
    app.login(&mut device, &email).await;
    let old_refresh = device.cookie("refreshToken").unwrap().to_string();

    let response = app.send(&mut device, "POST", "/api/auth/refresh", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Token refreshed successfully");

    let new_refresh = device.cookie("refreshToken").unwrap().to_string();
    assert_ne!(old_refresh, new_refresh);

    let response = app.validate(&mut device).await;
    assert_eq!(response.status, StatusCode::OK);

    // The retired token is single-use.
    let mut replay = Device::new();
    replay.set_cookie("refreshToken", &old_refresh);
    let response = app.send(&mut replay, "POST", "/api/auth/refresh", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "SESSION_INVALIDATED");
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = TestApp::new();

    let response = app.request("POST", "/api/auth/refresh", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "TOKEN_INVALID");
    assert_eq!(response.body["message"], "Refresh token not found");
}

#[tokio::test]
async fn test_logout_clears_cookies() {
    let app = TestApp::new();
    let email = app.register("grace").await;
    let mut device = Device::new();
    app.login(&mut device, &email).await;

    let response = app.send(&mut device, "POST", "/api/auth/logout", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "Logout successful");
    assert_eq!(response.body["logged_out_connections"], 0);
    assert!(device.cookie("accessToken").is_none());
    assert!(device.cookie("refreshToken").is_none());
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let app = TestApp::new();

    let response = app.request("POST", "/api/auth/logout", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["logged_out_connections"], 0);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["ws_connections"], 0);
}
