//! CLI command definitions and dispatch.

pub mod config;
pub mod serve;
pub mod watch;

use anyhow::Context;
use clap::{Parser, Subcommand};

use sso_core::config::AppConfig;

use crate::output::OutputFormat;

/// SSO session authority
#[derive(Debug, Parser)]
#[command(name = "sso", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the SSO server
    Serve(serve::ServeArgs),
    /// Watch a session the way a client application does
    Watch(watch::WatchArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> anyhow::Result<()> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, &self.config).await,
            Commands::Watch(args) => watch::execute(args, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub fn load_config(config_path: &str) -> anyhow::Result<AppConfig> {
    AppConfig::load_from(config_path)
        .with_context(|| format!("Failed to load config from '{config_path}'"))
}
