//! Watch a session from the client side.

use std::time::Duration;

use clap::Args;
use tokio::sync::watch;

use sso_client::{SessionClient, SessionState, SessionWatcher};

use crate::output::{self, OutputFormat};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Base URL of the SSO server
    #[arg(long, default_value = "http://localhost:4000")]
    pub server: String,

    /// Log in with this email before watching
    #[arg(long, requires = "password")]
    pub email: Option<String>,

    /// Password for `--email`
    #[arg(long)]
    pub password: Option<String>,

    /// Seconds between validation polls
    #[arg(long, default_value_t = 5)]
    pub poll_seconds: u64,

    /// Poll only; skip the realtime channel
    #[arg(long)]
    pub no_realtime: bool,
}

/// Execute the watch command
pub async fn execute(args: &WatchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let client = SessionClient::new(&args.server)?;

    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        let user = client.login(email, password).await?;
        output::print_success(&format!("Logged in as {} ({})", user.username, user.email));
    }

    let watcher = SessionWatcher::new(client, Duration::from_secs(args.poll_seconds.max(1)))
        .with_realtime(!args.no_realtime);

    let mut states = watcher.subscribe();
    let printer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            if let SessionState::LoggedIn(user) = &*states.borrow() {
                output::print_success(&format!("Session live for {}", user.username));
            }
        }
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let final_state = watcher.run(shutdown_rx).await?;
    printer.abort();

    match &final_state {
        SessionState::LoggedOut { reason, message } => {
            output::print_warning(&format!("Logged out ({reason}): {message}"));
        }
        SessionState::LoggedIn(user) => {
            output::print_success(&format!("Stopped watching {}", user.username));
        }
        SessionState::Unknown => {}
    }

    if format == OutputFormat::Json {
        let value = match &final_state {
            SessionState::LoggedOut { reason, message } => {
                serde_json::json!({ "state": "logged_out", "reason": reason, "message": message })
            }
            SessionState::LoggedIn(user) => serde_json::json!({ "state": "logged_in", "user": user }),
            SessionState::Unknown => serde_json::json!({ "state": "unknown" }),
        };
        output::print_item(&value, format);
    }

    Ok(())
}
