//! # tubescribe
//!
//! Service binary: loads settings, sets up logging and metrics, wires the
//! adapters into the orchestrator, then either serves HTTP or runs a single
//! transcription from the command line.

#![deny(unsafe_code)]

mod wiring;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tubescribe_core::{Status, TranscriptionRequest};
use tubescribe_server::dto::TranscribeResponse;
use tubescribe_server::{ApiToken, AppState, ServerConfig};
use tubescribe_settings::{Settings, load_settings};
use tubescribe_telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};

/// YouTube transcription service.
#[derive(Parser, Debug)]
#[command(name = "tubescribe", version, about)]
struct Cli {
    /// JSON settings file.
    #[arg(long, global = true, env = "TUBESCRIBE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,
        /// Port to bind, 0 for auto-assign (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Transcribe one video and print the result as JSON.
    Transcribe {
        /// Video URL or 11-character id.
        reference: String,
        /// Model variant; the configured default when omitted.
        #[arg(long)]
        model: Option<String>,
        /// Limit for download plus inference, in seconds; 0 keeps the default.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref()).context("failed to load settings")?;

    let telemetry = init_telemetry(&TelemetryConfig::from_level_name(
        &settings.logging.level,
        settings.logging.json,
    ));

    match cli.command.unwrap_or(Command::Serve {
        host: None,
        port: None,
    }) {
        Command::Serve { host, port } => serve(settings, &telemetry, host, port).await,
        Command::Transcribe {
            reference,
            model,
            timeout_secs,
        } => transcribe_once(&settings, reference, model, timeout_secs).await,
    }
}

async fn serve(
    settings: Settings,
    telemetry: &TelemetryGuard,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let orchestrator = Arc::new(wiring::build_orchestrator(&settings)?);
    let state = AppState::new(
        orchestrator,
        ApiToken::new(settings.server.api_token.clone()),
        telemetry.metrics().cloned(),
    );
    let config = ServerConfig {
        host: host.unwrap_or(settings.server.host),
        port: port.unwrap_or(settings.server.port),
        max_body_bytes: settings.server.max_body_bytes,
    };

    let shutdown = CancellationToken::new();
    let handle = tubescribe_server::start(config, state, shutdown.clone())
        .await
        .context("failed to start server")?;
    info!(port = handle.port, "tubescribe ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl+c")?;
    info!("shutting down");
    shutdown.cancel();
    handle.wait().await;
    Ok(())
}

async fn transcribe_once(
    settings: &Settings,
    reference: String,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let orchestrator = wiring::build_orchestrator(settings)?;
    let request = cli_request(reference, model, timeout_secs);

    let result = orchestrator.transcribe(request).await?;
    let body = serde_json::to_string_pretty(&TranscribeResponse::from(&result))?;
    println!("{body}");

    if result.status == Status::Failed {
        bail!(
            "transcription failed: {}",
            result.error_detail.unwrap_or_default()
        );
    }
    Ok(())
}

/// A zero timeout keeps the configured deadline, as on the HTTP API.
fn cli_request(
    reference: String,
    model: Option<String>,
    timeout_secs: Option<u64>,
) -> TranscriptionRequest {
    let mut request = TranscriptionRequest::new(reference);
    if let Some(model) = model {
        request = request.with_model(model);
    }
    if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
        request = request.with_deadline(Duration::from_secs(secs));
    }
    request
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_keeps_default_deadline() {
        let request = cli_request("dQw4w9WgXcQ".into(), None, Some(0));
        assert!(request.deadline.is_none());
    }

    #[test]
    fn timeout_and_model_are_applied() {
        let request = cli_request("dQw4w9WgXcQ".into(), Some("base".into()), Some(45));
        assert_eq!(request.deadline, Some(Duration::from_secs(45)));
        assert_eq!(request.model(), Some("base"));
    }

    #[test]
    fn transcribe_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "tubescribe",
            "transcribe",
            "dQw4w9WgXcQ",
            "--timeout-secs",
            "0",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Transcribe { timeout_secs: Some(0), .. })
        ));
    }
}
