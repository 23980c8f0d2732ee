//! Integration tests for the realtime channel over a real socket.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use helpers::{Device, TestApp, test_config};
use sso_client::{SessionClient, SessionState, SessionWatcher, ValidationState};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Serves `app` on an ephemeral loopback port; returns `host:port`.
async fn serve(app: &TestApp) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr.to_string()
}

async fn connect(addr: &str) -> Ws {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

/// Next JSON event, skipping control frames.
async fn next_event(ws: &mut Ws) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn authenticate(ws: &mut Ws, user_id: &str, token: Option<&str>) -> Value {
    let mut frame = json!({ "event": "authenticate", "user_id": user_id });
    if let Some(token) = token {
        frame["token"] = json!(token);
    }
    ws.send(Message::text(frame.to_string())).await.unwrap();
    next_event(ws).await
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn test_authenticate_ack() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let email = app.register("alice").await;
    let login = app.login(&mut Device::new(), &email).await;
    let user_id = login.body["user"]["id"].as_str().unwrap().to_string();

    let mut ws = connect(&addr).await;
    let ack = authenticate(&mut ws, &user_id, None).await;

    assert_eq!(ack["event"], "authenticated");
    assert_eq!(ack["user_id"], user_id.as_str());
    assert_eq!(app.state.gateway.online_user_count(), 1);
}

#[tokio::test]
async fn test_malformed_frame_gets_error_event() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json")).await.unwrap();
    let reply = next_event(&mut ws).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["code"], "INVALID_MESSAGE");

    ws.send(Message::text(r#"{"event":"subscribe","channel":"x"}"#))
        .await
        .unwrap();
    let reply = next_event(&mut ws).await;
    assert_eq!(reply["code"], "INVALID_MESSAGE");
}

#[tokio::test]
async fn test_logout_force_logs_out_every_socket() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let email = app.register("bob").await;
    let mut laptop = Device::new();
    let login = app.login(&mut laptop, &email).await;
    let user_id = login.body["user"]["id"].as_str().unwrap().to_string();

    let mut tab_a = connect(&addr).await;
    let mut tab_b = connect(&addr).await;
    authenticate(&mut tab_a, &user_id, None).await;
    authenticate(&mut tab_b, &user_id, None).await;

    let response = app.send(&mut laptop, "POST", "/api/auth/logout", None).await;
    assert_eq!(response.body["logged_out_connections"], 2);

    for ws in [&mut tab_a, &mut tab_b] {
        let event = next_event(ws).await;
        assert_eq!(event["event"], "force-logout");
        assert!(event["message"].as_str().unwrap().contains("another device"));
    }
}

#[tokio::test]
async fn test_disconnect_unregisters() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let email = app.register("carol").await;
    let login = app.login(&mut Device::new(), &email).await;
    let user_id = login.body["user"]["id"].as_str().unwrap().to_string();

    let mut ws = connect(&addr).await;
    authenticate(&mut ws, &user_id, None).await;
    assert_eq!(app.state.gateway.connection_count(), 1);

    ws.close(None).await.unwrap();
    drop(ws);

    let gateway = app.state.gateway.clone();
    wait_until(|| gateway.connection_count() == 0 && gateway.online_user_count() == 0).await;
}

#[tokio::test]
async fn test_hardened_handshake_requires_matching_token() {
    let mut config = test_config();
    config.realtime.require_handshake_token = true;
    let app = TestApp::with_config(config);
    let addr = serve(&app).await;

    let email = app.register("dave").await;
    let mut device = Device::new();
    let login = app.login(&mut device, &email).await;
    let user_id = login.body["user"]["id"].as_str().unwrap().to_string();
    let access = device.cookie("accessToken").unwrap().to_string();

    let mut ws = connect(&addr).await;
    let reply = authenticate(&mut ws, &user_id, None).await;
    assert_eq!(reply["event"], "error");
    assert_eq!(reply["code"], "UNAUTHORIZED");
    assert_eq!(app.state.gateway.online_user_count(), 0);

    let reply = authenticate(&mut ws, &user_id, Some(&access)).await;
    assert_eq!(reply["event"], "authenticated");
}

#[tokio::test]
async fn test_watcher_observes_logout_from_other_device() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let email = app.register("erin").await;
    let base_url = format!("http://{addr}");

    let watched = SessionClient::new(&base_url).unwrap();
    watched.login(&email, helpers::PASSWORD).await.unwrap();
    let other = SessionClient::new(&base_url).unwrap();
    other.login(&email, helpers::PASSWORD).await.unwrap();

    let watcher = SessionWatcher::new(watched, Duration::from_secs(60));
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = tokio::spawn(watcher.run(shutdown_rx));

    let gateway = app.state.gateway.clone();
    wait_until(|| gateway.online_user_count() == 1).await;

    assert_eq!(other.logout().await.unwrap(), 1);

    let state = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert!(matches!(state, SessionState::LoggedOut { ref reason, .. } if reason == "force-logout"));
}

#[tokio::test]
async fn test_watcher_renews_unreadable_access_token() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let email = app.register("frank").await;
    let base_url = format!("http://{addr}");
    let url: reqwest::Url = base_url.parse().unwrap();

    let jar = Arc::new(reqwest::cookie::Jar::default());
    let client = SessionClient::with_cookie_jar(&base_url, jar.clone()).unwrap();
    let user = client.login(&email, helpers::PASSWORD).await.unwrap();

    jar.add_cookie_str("accessToken=garbage; Path=/", &url);
    assert!(matches!(
        client.validate().await.unwrap(),
        ValidationState::Invalid { ref reason, .. } if reason == "invalid token"
    ));

    let watcher = SessionWatcher::new(client.clone(), Duration::from_secs(60)).with_realtime(false);
    let mut states = watcher.subscribe();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let run = tokio::spawn(watcher.run(shutdown_rx));

    tokio::time::timeout(
        Duration::from_secs(5),
        states.wait_for(|state| *state != SessionState::Unknown),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(*states.borrow(), SessionState::LoggedIn(user.clone()));

    shutdown_tx.send(true).unwrap();
    let state = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(state, SessionState::LoggedIn(user));
    assert!(matches!(client.validate().await.unwrap(), ValidationState::Valid(_)));
}

#[tokio::test]
async fn test_watcher_reports_revoked_session_after_failed_renewal() {
    let app = TestApp::new();
    let addr = serve(&app).await;
    let email = app.register("grace").await;
    let base_url = format!("http://{addr}");
    let url: reqwest::Url = base_url.parse().unwrap();

    let jar = Arc::new(reqwest::cookie::Jar::default());
    let client = SessionClient::with_cookie_jar(&base_url, jar.clone()).unwrap();
    client.login(&email, helpers::PASSWORD).await.unwrap();
    let other = SessionClient::new(&base_url).unwrap();
    other.login(&email, helpers::PASSWORD).await.unwrap();
    other.logout().await.unwrap();

    jar.add_cookie_str("accessToken=garbage; Path=/", &url);

    let watcher = SessionWatcher::new(client, Duration::from_secs(60)).with_realtime(false);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = tokio::time::timeout(Duration::from_secs(5), watcher.run(shutdown_rx))
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(
        state,
        SessionState::LoggedOut { ref reason, .. } if reason == "session invalidated"
    ));
}
