//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use sso_api::{AppState, build_app};
use sso_auth::user::InMemoryUserStore;
use sso_core::config::AppConfig;

/// Password used for every test account.
pub const PASSWORD: &str = "password123";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching the gateway and session store directly
    pub state: AppState,
}

/// A parsed response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub set_cookies: Vec<String>,
}

/// One browser: a cookie jar replayed on every request it sends.
#[derive(Debug, Default, Clone)]
pub struct Device {
    cookies: BTreeMap<String, String>,
}

impl Device {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    fn header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    fn absorb(&mut self, set_cookies: &[String]) {
        for raw in set_cookies {
            let pair = raw.split(';').next().unwrap_or_default();
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let expired = raw
                .split(';')
                .any(|attr| attr.trim().eq_ignore_ascii_case("max-age=0"));
            if expired || value.is_empty() {
                self.cookies.remove(name.trim());
            } else {
                self.cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
    }
}

impl TestApp {
    /// Create a new test application backed by an empty in-memory user store
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(config, Arc::new(InMemoryUserStore::new()));
        let router = build_app(state.clone());
        Self { router, state }
    }

    /// Make a request without cookies
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        self.send(&mut Device::new(), method, path, body).await
    }

    /// Make a request as `device`, updating its cookie jar from the response
    pub async fn send(
        &self,
        device: &mut Device,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(cookie) = device.header() {
            builder = builder.header(header::COOKIE, cookie);
        }

        let req = if let Some(json) = body {
            builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap()
        } else {
            builder.body(Body::empty()).unwrap()
        };

        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        device.absorb(&set_cookies);

        TestResponse {
            status,
            body,
            set_cookies,
        }
    }

    /// Register an account named `username` with [`PASSWORD`]; returns its email
    pub async fn register(&self, username: &str) -> String {
        let email = format!("{username}@example.com");
        let response = self
            .request(
                "POST",
                "/api/auth/register",
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        email
    }

    /// Log `device` in as `email`
    pub async fn login(&self, device: &mut Device, email: &str) -> TestResponse {
        let response = self
            .send(
                device,
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response
    }

    pub async fn validate(&self, device: &mut Device) -> TestResponse {
        self.send(device, "GET", "/api/auth/validate", None).await
    }
}

/// Default config with a fixed secret
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config
}
