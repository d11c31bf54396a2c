//! AuthKit login server
//!
//! Serves `/auth`, `/callback`, `/user` and `/`. Configuration comes from the
//! environment; a missing credential stops the process before it binds.

use std::net::SocketAddr;

use anyhow::Context;
use authkit_core::logging::{self, LoggingConfig};
use authkit_core::AuthKitConfig;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "authkit-server", version, about = "AuthKit delegated login server")]
struct Args {
    /// Address to listen on (overrides BIND_ADDRESS)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Include source file and line in log lines
    #[arg(long)]
    file_info: bool,
}

impl Args {
    fn logging_config(&self) -> anyhow::Result<LoggingConfig> {
        let mut config =
            LoggingConfig::new(logging::parse_log_level(&self.log_level)?, "authkit-server");
        if self.json_logs {
            config = config.with_json();
        }
        if self.file_info {
            config = config.with_file_info();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let logging_config = args.logging_config()?;
    logging::setup_logging(&logging_config)?;
    logging::log_welcome(&logging_config.app_name, env!("CARGO_PKG_VERSION"));

    let mut config = AuthKitConfig::from_env().context("invalid configuration")?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    tracing::info!(
        client_id = %config.provider.client_id,
        redirect_uri = %config.provider.redirect_uri,
        "Configuration loaded"
    );

    let state = authkit_core::init(&config)?;
    let app = authkit_core::create_router(state);

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_logging_flags() {
        let args = Args::try_parse_from(["authkit-server"]).unwrap();
        let config = args.logging_config().unwrap();

        assert_eq!(config.app_name, "authkit-server");
        assert!(!config.json);
        assert!(!config.file_info);
    }

    #[test]
    fn test_logging_flags_reach_config() {
        let args = Args::try_parse_from([
            "authkit-server",
            "--log-level",
            "debug",
            "--json-logs",
            "--file-info",
        ])
        .unwrap();
        let config = args.logging_config().unwrap();

        assert_eq!(config.level, tracing::Level::DEBUG);
        assert!(config.json);
        assert!(config.file_info);
    }

    #[test]
    fn test_bad_log_level_is_rejected() {
        let args = Args::try_parse_from(["authkit-server", "--log-level", "chatty"]).unwrap();
        assert!(args.logging_config().is_err());
    }
}
