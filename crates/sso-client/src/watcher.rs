//! Session watcher.
//!
//! Validates once on start, then keeps two signals alive until the session
//! ends: a realtime connection that receives `force-logout` pushes, and a
//! periodic `/auth/validate` poll that catches revocations the push missed.
//! A forced logout is therefore observed within the poll interval at worst.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use sso_core::types::{UserId, UserInfo};

use crate::client::{SessionClient, ValidationState};
use crate::error::{ClientError, ClientResult};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const INVALID_TOKEN_REASON: &str = "invalid token";
const SESSION_INVALIDATED_REASON: &str = "session invalidated";

/// What the watcher currently believes about the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Not yet validated.
    Unknown,
    /// The session is live.
    LoggedIn(UserInfo),
    /// The session ended; local credentials should be discarded.
    LoggedOut {
        /// Why the session ended.
        reason: String,
        /// Human-readable message.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum ServerEvent {
    Authenticated {
        user_id: UserId,
    },
    ForceLogout {
        message: String,
    },
    Error {
        code: String,
        message: String,
    },
    #[serde(other)]
    Unknown,
}

enum Wake {
    Poll,
    Frame(Option<Result<Message, tokio_tungstenite::tungstenite::Error>>),
    Shutdown,
}

/// Watches one user agent's session.
#[derive(Debug)]
pub struct SessionWatcher {
    client: SessionClient,
    poll_interval: Duration,
    realtime: bool,
    state_tx: watch::Sender<SessionState>,
}

impl SessionWatcher {
    /// Creates a watcher that polls every `poll_interval` and listens on the
    /// realtime channel.
    pub fn new(client: SessionClient, poll_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unknown);
        Self {
            client,
            poll_interval,
            realtime: true,
            state_tx,
        }
    }

    /// Enables or disables the realtime listener. Polling always runs.
    pub fn with_realtime(mut self, enabled: bool) -> Self {
        self.realtime = enabled;
        self
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Runs until the session ends or `shutdown` flips to `true`. Returns the
    /// final state.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> ClientResult<SessionState> {
        let user = match self.check().await? {
            ValidationState::Valid(user) => user,
            ValidationState::Invalid { reason, message } => {
                return Ok(self.finish(SessionState::LoggedOut { reason, message }));
            }
        };
        self.state_tx.send_replace(SessionState::LoggedIn(user.clone()));
        info!(user_id = %user.id, "Session live");

        let mut ws = if self.realtime {
            match self.connect(user.id).await {
                Ok(ws) => Some(ws),
                Err(e) => {
                    warn!(error = %e, "Realtime channel unavailable, polling only");
                    None
                }
            }
        } else {
            None
        };

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.tick().await;

        loop {
            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Poll,
                frame = next_frame(&mut ws) => Wake::Frame(frame),
                _ = shutdown.changed() => Wake::Shutdown,
            };

            match wake {
                Wake::Poll => match self.check().await {
                    Ok(ValidationState::Valid(_)) => debug!("Session still valid"),
                    Ok(ValidationState::Invalid { reason, message }) => {
                        info!(reason = %reason, "Session ended (poll)");
                        return Ok(self.finish(SessionState::LoggedOut { reason, message }));
                    }
                    Err(e) => warn!(error = %e, "Validation poll failed"),
                },
                Wake::Frame(Some(Ok(Message::Text(text)))) => {
                    match serde_json::from_str::<ServerEvent>(text.as_str()) {
                        Ok(ServerEvent::ForceLogout { message }) => {
                            info!("Session ended (force-logout)");
                            return Ok(self.finish(SessionState::LoggedOut {
                                reason: "force-logout".to_string(),
                                message,
                            }));
                        }
                        Ok(ServerEvent::Authenticated { user_id }) => {
                            debug!(user_id = %user_id, "Realtime handshake acknowledged");
                        }
                        Ok(ServerEvent::Error { code, message }) => {
                            warn!(code = %code, message = %message, "Realtime error");
                        }
                        Ok(ServerEvent::Unknown) => {}
                        Err(e) => debug!(error = %e, "Ignoring malformed realtime frame"),
                    }
                }
                Wake::Frame(Some(Ok(Message::Close(_)))) | Wake::Frame(None) => {
                    warn!("Realtime channel closed, polling only");
                    ws = None;
                }
                Wake::Frame(Some(Ok(_))) => {}
                Wake::Frame(Some(Err(e))) => {
                    warn!(error = %e, "Realtime channel failed, polling only");
                    ws = None;
                }
                Wake::Shutdown => {
                    if shutdown.has_changed().is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        Ok(self.state_tx.borrow().clone())
    }

    /// Validates the session. An expired or unreadable access token gets one
    /// refresh attempt before the session counts as ended.
    async fn check(&self) -> ClientResult<ValidationState> {
        let state = self.client.validate().await?;
        let ValidationState::Invalid { reason, .. } = &state else {
            return Ok(state);
        };
        if reason != INVALID_TOKEN_REASON {
            return Ok(state);
        }

        match self.client.refresh().await {
            Ok(()) => {
                debug!("Access token renewed");
                self.client.validate().await
            }
            Err(e) if e.is_session_invalidated() => {
                let ClientError::Api { message, .. } = e else {
                    return Err(e);
                };
                Ok(ValidationState::Invalid {
                    reason: SESSION_INVALIDATED_REASON.to_string(),
                    message,
                })
            }
            Err(ClientError::Api { .. }) => Ok(state),
            Err(e) => Err(e),
        }
    }

    async fn connect(&self, user_id: UserId) -> ClientResult<WsStream> {
        let url = self.client.ws_url()?;
        let (mut ws, _) = connect_async(url.as_str()).await?;

        let handshake = serde_json::json!({ "event": "authenticate", "user_id": user_id });
        ws.send(Message::text(handshake.to_string())).await?;

        debug!(url = %url, "Realtime channel connected");
        Ok(ws)
    }

    fn finish(&self, state: SessionState) -> SessionState {
        self.state_tx.send_replace(state.clone());
        state
    }
}

async fn next_frame(
    ws: &mut Option<WsStream>,
) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match ws.as_mut() {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
