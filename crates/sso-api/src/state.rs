//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sso_auth::jwt::TokenCodec;
use sso_auth::session::{SessionAuthority, SessionStore};
use sso_core::config::AppConfig;
use sso_core::traits::{ForceLogoutBroadcaster, UserStore};
use sso_realtime::RealtimeGateway;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Login, validate, refresh, logout
    pub authority: Arc<SessionAuthority>,
    /// Realtime connections and force-logout delivery
    pub gateway: Arc<RealtimeGateway>,
}

impl AppState {
    /// Wires the codec, session store, gateway, and authority around the
    /// given user store.
    pub fn new(config: AppConfig, users: Arc<dyn UserStore>) -> Self {
        let codec = Arc::new(TokenCodec::new(&config.auth));
        let sessions = Arc::new(SessionStore::new(codec.refresh_ttl()));
        let gateway = Arc::new(RealtimeGateway::new(
            config.realtime.clone(),
            Arc::clone(&codec),
        ));

        let authority = Arc::new(SessionAuthority::new(
            &config,
            codec,
            sessions,
            users,
            Arc::clone(&gateway) as Arc<dyn ForceLogoutBroadcaster>,
        ));

        Self {
            config: Arc::new(config),
            authority,
            gateway,
        }
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &Arc<SessionStore> {
        self.authority.sessions()
    }
}
