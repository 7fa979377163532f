//! truecheck-verify - media verification client
//!
//! Selects an image or video, sends it to an AI-content analysis endpoint
//! and prints the verdict card.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use truecheck_common::config::{load_or_default, resolve_config_path, CONFIG_ENV_VAR};
use truecheck_common::events::FlowEvent;

use truecheck_verify::config::{resolve_settings, CliOverrides};
use truecheck_verify::present::{render_text, VerdictView, PROGRESS_TEXT};
use truecheck_verify::{FlowMode, HttpDispatcher, MediaFile, Session, VerifyError, VerifyFlow};

/// Command-line arguments for truecheck-verify
#[derive(Parser, Debug)]
#[command(name = "truecheck-verify")]
#[command(about = "Detect deepfakes and AI-generated images and videos")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/truecheck/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze an image or video (max 4MB)
    Analyze {
        /// Media file to analyze
        file: PathBuf,

        /// Upload mode
        #[arg(short, long, value_enum)]
        mode: Option<FlowMode>,

        /// Site base URL hosting the analysis function (multipart/data-uri)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Hugging Face model id (direct mode)
        #[arg(long)]
        model: Option<String>,

        /// Hugging Face API token (direct mode)
        #[arg(long)]
        token: Option<String>,

        /// Inference API base URL replacing the Hugging Face host (direct mode)
        #[arg(long)]
        hf_base_url: Option<String>,

        /// Request timeout in seconds, 0 waits indefinitely
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a file for upload without sending it
    Check {
        /// Media file to check
        file: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), CONFIG_ENV_VAR);
    let toml_config = load_or_default(config_path.as_deref()).context("Failed to load config")?;

    // Initialize tracing
    let default_filter = format!(
        "truecheck_verify={level},truecheck_common={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(version = env!("CARGO_PKG_VERSION"), "Starting truecheck-verify");
    if let Some(path) = &config_path {
        debug!("Config file: {}", path.display());
    }

    match args.command {
        Command::Analyze {
            file,
            mode,
            endpoint,
            model,
            token,
            hf_base_url,
            timeout_secs,
            json,
        } => {
            let cli = CliOverrides {
                mode,
                endpoint,
                model,
                token,
                hf_base_url,
                timeout_secs,
            };
            let settings = resolve_settings(&cli, &toml_config).context("Invalid settings")?;
            info!(
                mode = settings.mode.as_str(),
                endpoint = %settings.profile.endpoint.url(),
                "Flow profile selected"
            );

            let dispatcher = HttpDispatcher::new(settings.timeout)
                .context("Failed to create HTTP client")?;
            let flow = VerifyFlow::new(settings.profile, dispatcher);
            analyze(&flow, &file, json).await
        }
        Command::Check { file, json } => check(&file, json).await,
    }
}

async fn analyze(
    flow: &VerifyFlow<HttpDispatcher>,
    file: &std::path::Path,
    json: bool,
) -> Result<ExitCode> {
    let mut events = flow.subscribe();
    let progress = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let FlowEvent::AnalysisStarted { .. } = event {
                eprintln!("{}", PROGRESS_TEXT);
            }
        }
    });

    let outcome = match flow.select_path(file).await {
        Ok(_) => flow.analyze().await,
        Err(e) => Err(e),
    };
    progress.abort();

    match outcome {
        Ok(Some(result)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", render_text(&VerdictView::from_result(&result)));
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => Ok(ExitCode::FAILURE),
        Err(e) => Ok(alert(&e)),
    }
}

async fn check(file: &std::path::Path, json: bool) -> Result<ExitCode> {
    let media = match MediaFile::open(file).await {
        Ok(media) => media,
        Err(e) => return Ok(alert(&e)),
    };

    let mut session = Session::new();
    let preview = match session.select_file(media) {
        Ok(preview) => preview,
        Err(e) => return Ok(alert(&e)),
    };
    let Some(media) = session.file() else {
        return Ok(ExitCode::FAILURE);
    };

    if json {
        let summary = serde_json::json!({
            "name": media.name(),
            "kind": media.kind(),
            "mime": media.mime(),
            "size_bytes": media.size(),
            "sha256": media.digest(),
            "preview": preview.uri(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{} ({}, {})", media.name(), media.kind(), media.mime());
        println!("Size: {} bytes", media.size());
        println!("SHA-256: {}", media.digest());
        println!("Preview: {}", preview.uri());
    }

    Ok(ExitCode::SUCCESS)
}

/// Print the user-facing alert and map it to a failing exit code
fn alert(err: &VerifyError) -> ExitCode {
    debug!("Alert for error: {}", err);
    eprintln!("{}", err.alert());
    ExitCode::FAILURE
}
