//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration (secret masked)
    Show,
    /// Validate configuration file
    Validate,
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config_path: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommand::Show => {
            let mut config = super::load_config(config_path)?;
            config.auth.jwt_secret = mask_secret(&config.auth.jwt_secret);
            output::print_item(&config, format);
        }
        ConfigCommand::Validate => {
            let config = super::load_config(config_path)?;
            if let Err(e) = config.validate() {
                output::print_error(&format!("Configuration invalid: {e}"));
                return Err(e.into());
            }
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            println!("  Server: {}", config.server.bind_address());
            println!(
                "  Tokens: access {}m, refresh {}h",
                config.auth.jwt_access_ttl_minutes, config.auth.jwt_refresh_ttl_hours
            );
            if config.auth.jwt_secret == sso_core::config::auth::DEFAULT_JWT_SECRET {
                output::print_warning("auth.jwt_secret is still the built-in default");
            }
            if !config.realtime.require_handshake_token {
                output::print_warning(
                    "realtime handshake trusts the claimed user id (require_handshake_token = false)",
                );
            }
        }
    }

    Ok(())
}

/// Mask a secret for display
fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        let prefix: String = secret.chars().take(2).collect();
        format!("{prefix}****")
    }
}
