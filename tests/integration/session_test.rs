//! Integration tests for cross-device session behavior.

mod helpers;

use axum::http::StatusCode;
use futures::future::join_all;
use helpers::{Device, TestApp};

use sso_core::types::UserId;
use sso_realtime::OutboundMessage;

fn user_id(body: &serde_json::Value) -> UserId {
    body["user"]["id"].as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_two_devices_hold_independent_sessions() {
    let app = TestApp::new();
    let email = app.register("alice").await;

    let mut laptop = Device::new();
    let mut phone = Device::new();
    let login = app.login(&mut laptop, &email).await;
    app.login(&mut phone, &email).await;

    assert_eq!(app.state.sessions().session_count(user_id(&login.body)).await, 2);

    // Rotating one device leaves the other untouched.
    let response = app.send(&mut laptop, "POST", "/api/auth/refresh", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.validate(&mut phone).await.status, StatusCode::OK);
    assert_eq!(app.validate(&mut laptop).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_ends_every_device() {
    let app = TestApp::new();
    let email = app.register("bob").await;

    let mut laptop = Device::new();
    let mut phone = Device::new();
    app.login(&mut laptop, &email).await;
    app.login(&mut phone, &email).await;

    let response = app.send(&mut laptop, "POST", "/api/auth/logout", None).await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app.validate(&mut phone).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["reason"], "session invalidated");

    let response = app.send(&mut phone, "POST", "/api/auth/refresh", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "SESSION_INVALIDATED");
    assert!(phone.cookie("refreshToken").is_none());
}

#[tokio::test]
async fn test_concurrent_refresh_has_one_winner() {
    let app = TestApp::new();
    let email = app.register("carol").await;
    let mut device = Device::new();
    app.login(&mut device, &email).await;

    let app = &app;
    let attempts = (0..6).map(|_| {
        let mut copy = device.clone();
        async move { app.send(&mut copy, "POST", "/api/auth/refresh", None).await }
    });
    let responses = join_all(attempts).await;

    let winners = responses
        .iter()
        .filter(|r| r.status == StatusCode::OK)
        .count();
    assert_eq!(winners, 1);
    assert!(
        responses
            .iter()
            .filter(|r| r.status != StatusCode::OK)
            .all(|r| r.body["error"] == "SESSION_INVALIDATED")
    );
}

#[tokio::test]
async fn test_logout_pushes_force_logout_to_every_connection() {
    let app = TestApp::new();
    let email = app.register("dave").await;
    let other_email = app.register("erin").await;

    let mut laptop = Device::new();
    let login = app.login(&mut laptop, &email).await;
    let dave = user_id(&login.body);
    let mut bystander = Device::new();
    let other = app.login(&mut bystander, &other_email).await;
    let erin = user_id(&other.body);

    let gateway = &app.state.gateway;
    let (tab_a, mut rx_a) = gateway.on_connect();
    let (tab_b, mut rx_b) = gateway.on_connect();
    let (tab_c, mut rx_c) = gateway.on_connect();
    gateway.on_authenticate_handshake(tab_a.id, dave, None).await.unwrap();
    gateway.on_authenticate_handshake(tab_b.id, dave, None).await.unwrap();
    gateway.on_authenticate_handshake(tab_c.id, erin, None).await.unwrap();

    for rx in [&mut rx_a, &mut rx_b, &mut rx_c] {
        assert!(matches!(rx.recv().await, Some(OutboundMessage::Authenticated { .. })));
    }

    let response = app.send(&mut laptop, "POST", "/api/auth/logout", None).await;
    assert_eq!(response.body["logged_out_connections"], 2);

    for rx in [&mut rx_a, &mut rx_b] {
        assert!(matches!(rx.recv().await, Some(OutboundMessage::ForceLogout { .. })));
    }
    assert!(rx_c.try_recv().is_err());

    assert_eq!(app.validate(&mut bystander).await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_access_token_still_logs_out() {
    let app = TestApp::new();
    let email = app.register("frank").await;
    let mut laptop = Device::new();
    let mut phone = Device::new();
    app.login(&mut laptop, &email).await;
    app.login(&mut phone, &email).await;

    // Only a refresh cookie left on the laptop.
    let refresh = laptop.cookie("refreshToken").unwrap().to_string();
    let mut stale = Device::new();
    stale.set_cookie("refreshToken", &refresh);

    let response = app.send(&mut stale, "POST", "/api/auth/logout", None).await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(app.validate(&mut phone).await.status, StatusCode::UNAUTHORIZED);
}
