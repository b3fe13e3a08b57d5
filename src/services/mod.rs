//! Business logic services
//!
//! Dispatching one certificate to its target, running every configured
//! project, and delivering the run report.

pub mod dispatcher;
pub mod notifier;
pub mod orchestrator;

pub use dispatcher::{gateway_ssl_url, oss_cert_id, CertificateDispatcher};
pub use notifier::{MarkdownMessage, NotifyError, WebhookNotifier};
pub use orchestrator::RunOrchestrator;

use crate::config::Settings;
use crate::domain::RunSummary;
use crate::observability::Transcript;
use crate::providers::ProviderFactory;
use crate::utils::CertificateNamer;

/// Run every project in `settings` against the given providers.
pub async fn run_projects<F: ProviderFactory>(
    settings: &Settings,
    providers: F,
    transcript: Transcript,
) -> RunSummary {
    let namer = CertificateNamer::new(settings.cert_name_prefix.clone());
    let orchestrator = RunOrchestrator::new(CertificateDispatcher::new(providers, namer));
    orchestrator.run(settings.resolve_projects(), transcript).await
}
