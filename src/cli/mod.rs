//! # Command Line Interface
//!
//! One invocation performs one full run: load the configuration, publish every
//! project, print the transcript and optionally deliver it to the webhook.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};

use crate::config::{default_config_path, Settings};
use crate::errors::Error;
use crate::observability::{init_logging, Transcript};
use crate::providers::LiveProviders;
use crate::services::{run_projects, WebhookNotifier};

#[derive(Debug, Parser)]
#[command(name = "certpush")]
#[command(about = "Publish renewed TLS certificates to CDN, object storage, gateway and cluster targets")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (defaults to config.yml next to the executable)
    #[arg(short, long, env = "CERTPUSH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn config_path(&self) -> crate::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => default_config_path(),
        }
    }
}

pub async fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let mut transcript = Transcript::stdout();

    let settings = match cli.config_path().and_then(|path| Settings::load(&path)) {
        Ok(settings) => settings,
        Err(e) => {
            report_config_error(&e, &mut transcript);
            return Ok(ExitCode::FAILURE);
        }
    };

    let providers = LiveProviders::new(settings.kubeconfig.clone())?;
    let http = providers.http_client().clone();

    let summary = run_projects(&settings, providers, transcript).await;
    info!(
        total = summary.total(),
        succeeded = summary.success_count(),
        failed = summary.failure_count(),
        "Run finished"
    );

    match settings.webhook_url() {
        Some(url) => {
            WebhookNotifier::new(http, url).notify_best_effort(&summary.transcript).await;
        }
        None => info!("No webhook configured; skipping notification"),
    }

    Ok(ExitCode::from(summary.exit_code()))
}

fn report_config_error(error: &Error, transcript: &mut Transcript) {
    warn!(error = %error, "Configuration unavailable");
    match error {
        Error::Io { .. } => transcript.error(format_args!("Failed to read config file: {}", error)),
        _ => transcript.error(format_args!("Failed to parse config file: {}", error)),
    }
}
