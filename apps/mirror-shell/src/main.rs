//! Mirror Shell - platform shim for the screen sharing service
//!
//! Speaks newline-delimited JSON on stdin/stdout: method calls and platform
//! callbacks come in, replies and platform requests go out. Logs go to stderr.

mod commands;
mod config;
mod host;
mod state;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use shared_protocol::{InboundMessage, SERVICE_CHANNEL};

use config::ShellConfig;
use state::{AppState, Outbound};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mirror_shell=debug".parse()?),
        )
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ShellConfig::load(config_path.as_deref())?;

    info!(
        "Starting mirror shell on {} (API level {})",
        SERVICE_CHANNEL, config.api_level
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(AppState::new(&config, tx)?);
    let writer = tokio::spawn(write_outbound(rx));

    let mut tasks = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Reap finished calls
        while tasks.try_join_next().is_some() {}

        match InboundMessage::from_json(line) {
            Ok(message) => commands::dispatch(&state, &mut tasks, message),
            Err(e) => warn!("Skipping malformed message: {}", e),
        }
    }

    info!("Input closed, tearing down");
    commands::shutdown(&state, &mut tasks).await;

    drop(state);
    writer.await??;
    Ok(())
}

async fn write_outbound(mut rx: mpsc::UnboundedReceiver<Outbound>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
