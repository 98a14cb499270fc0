//! groupwarden - group chat moderation engine
//!
//! Reads platform events as JSON lines on stdin, runs them through the
//! permission gate, word filter, join screening and operator commands, and
//! drives a simulated platform that reports every outbound action as a JSON
//! line on stdout.

mod access;
mod commands;
mod config;
mod db;
mod error;
mod http;
mod metrics;
mod moderation;
mod platform;
mod scheduler;
mod warden;

use crate::config::Config;
use crate::db::Database;
use crate::platform::SimulatedPlatform;
use crate::warden::Warden;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use warden_proto::Event;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries intents, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "groupwarden.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = crate::config::validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("refusing to start with {} configuration error(s)", errors.len());
    }

    info!(
        self_id = %config.bot.self_id,
        prefix = %config.bot.command_prefix,
        "Starting groupwarden"
    );

    metrics::init();

    let db = Database::new(&config.database.path).await?;

    let platform = Arc::new(
        SimulatedPlatform::new(config.bot.self_id, config.server.simulated_bot_role)
            .with_echo(config.server.echo_intents),
    );

    let http_shutdown = CancellationToken::new();
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics endpoint disabled");
    } else {
        let token = http_shutdown.clone();
        tokio::spawn(async move {
            http::serve_metrics(metrics_port, token).await;
        });
    }

    let warden = Warden::new(config, platform.clone(), db).await?;

    let mut lines = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
            line = lines.next() => line,
        };

        let line = match line {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                warn!(error = %e, "Failed to read event line");
                continue;
            }
            None => {
                info!("Event stream closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: Event = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "Skipping malformed event");
                continue;
            }
        };

        debug!(kind = event.kind(), group = %event.group_id(), "Event received");
        platform.observe(&event);
        warden.handle_event(&event).await;
    }

    warden.shutdown().await;
    http_shutdown.cancel();
    info!("groupwarden stopped");
    Ok(())
}
