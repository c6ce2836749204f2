//! tamara-server: WebSocket front end for the Tamara voice assistant.
//!
//! Each connection gets its own conversation. User messages are answered by
//! a local Ollama model that may call database tools first; the reply is
//! streamed back as tokens, with synthesized audio for every finished
//! sentence when a speech server is available.

mod app;
mod connection;
mod manager;
mod protocol;
mod session;

#[cfg(test)]
mod tests_support;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tamara_common::TamaraError;
use tamara_config::{config_to_json, load_config, toml_loader, TamaraConfig};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing_subscriber::EnvFilter;

use crate::app::AppContext;
use crate::connection::handle_connection;
use crate::protocol::ServerEvent;

/// Time given to connection writers to flush the shutdown notice.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

#[derive(Parser)]
#[command(name = "tamara-server", about = "Streaming voice assistant server")]
struct Args {
    /// Config file. Defaults to ./config.toml, then the platform config dir.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, overriding the config file.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding the config file.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level, overridden by RUST_LOG.
    #[arg(long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// Write a documented default config file and exit.
    #[arg(long)]
    init_config: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.init_config {
        init_tracing("info");
        return match write_default_config(args.config.clone()) {
            Ok(path) => {
                println!("{}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("tamara-server: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let config = match load_config(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("tamara-server: {e}");
            return ExitCode::FAILURE;
        }
    };
    let config = apply_cli_overrides(config, &args);

    let level = args
        .log_level
        .as_deref()
        .unwrap_or(config.server.log_level.as_directive());
    init_tracing(level);
    tracing::debug!(config = %config_to_json(&config), "effective config");

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| format!("tamara={level}").into()),
        )
        .init();
}

fn write_default_config(explicit: Option<PathBuf>) -> Result<PathBuf, TamaraError> {
    let path = match explicit {
        Some(p) => p,
        None => toml_loader::default_config_path()?,
    };
    toml_loader::create_default_config(&path)?;
    Ok(path)
}

fn apply_cli_overrides(mut config: TamaraConfig, args: &Args) -> TamaraConfig {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config
}

async fn run(config: TamaraConfig) -> Result<(), TamaraError> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let ctx = AppContext::build(config).await?;

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("tamara-server listening on ws://{}", addr);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Accept loop.
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let ctx = ctx.clone();
                    tokio::spawn(async move {
                        match accept_async(stream).await {
                            Ok(ws) => handle_connection(ws, peer, ctx).await,
                            Err(e) => {
                                tracing::warn!(peer = %peer, error = %e, "WS handshake failed");
                            }
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept error");
                }
            },
            _ = &mut shutdown => break,
        }
    }

    let open = ctx.connections.count().await;
    let notified = ctx
        .connections
        .broadcast(ServerEvent::system("Server shutting down"))
        .await;
    tracing::info!(clients = open, notified, "shutting down");
    tokio::time::sleep(SHUTDOWN_GRACE).await;
    ctx.close().await;
    Ok(())
}
