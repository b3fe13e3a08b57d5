//! Run orchestration
//!
//! Processes projects one at a time in configuration order, records one
//! outcome per project and writes the run transcript. A failing project never
//! stops the run.

use tracing::{error, info, Instrument};

use super::dispatcher::CertificateDispatcher;
use crate::config::{ConfiguredProject, Project};
use crate::domain::{RunSummary, UpdateOutcome};
use crate::errors::UpdateError;
use crate::observability::Transcript;
use crate::project_span;
use crate::providers::ProviderFactory;
use crate::utils::load_artifact;

pub struct RunOrchestrator<F> {
    dispatcher: CertificateDispatcher<F>,
}

impl<F: ProviderFactory> RunOrchestrator<F> {
    pub fn new(dispatcher: CertificateDispatcher<F>) -> Self {
        Self { dispatcher }
    }

    /// Attempt every project exactly once and build the summary.
    ///
    /// Projects that failed to resolve at load time are recorded as failures
    /// in their configured position without any provider call.
    pub async fn run(
        &self,
        projects: Vec<ConfiguredProject>,
        mut transcript: Transcript,
    ) -> RunSummary {
        let mut summary = RunSummary::default();

        transcript.line("========== Starting Certificate Update ==========");
        transcript.line(format_args!("Total Projects: {}", projects.len()));

        for ConfiguredProject { spec, resolved } in projects {
            transcript.blank();
            transcript.info(format_args!(
                "Processing project: {} (Domain: {}, Mode: {})",
                spec.name, spec.domain, spec.mode
            ));

            let result = match resolved {
                Ok(project) => {
                    let span = project_span!(project.name, project.mode());
                    self.process(&project, &mut transcript).instrument(span).await
                }
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => {
                    info!(project = %spec.name, "Certificate updated");
                    transcript.success(format_args!(
                        "Certificate updated successfully for project '{}'",
                        spec.name
                    ));
                    summary.record(spec.name, UpdateOutcome::Succeeded);
                }
                Err(e) => {
                    error!(project = %spec.name, error = %e, "Certificate update failed");
                    transcript.error(format_args!(
                        "Failed to update certificate for project '{}': {}",
                        spec.name, e
                    ));
                    summary.record(spec.name, UpdateOutcome::failed(e.to_string()));
                }
            }
        }

        write_summary(&summary, &mut transcript);
        summary.transcript = transcript.into_string();
        summary
    }

    async fn process(
        &self,
        project: &Project,
        transcript: &mut Transcript,
    ) -> Result<(), UpdateError> {
        let artifact = load_artifact(&project.cert_path, &project.key_path)?;
        self.dispatcher.update_certificate(project, &artifact, transcript).await
    }
}

fn write_summary(summary: &RunSummary, transcript: &mut Transcript) {
    transcript.blank();
    transcript.line("========== Summary ==========");
    transcript.line(format_args!("Total Projects: {}", summary.total()));
    transcript.line(format_args!("Successful: {}", summary.success_count()));
    transcript.line(format_args!("Failed: {}", summary.failure_count()));

    let failed = summary.failed_projects();
    if !failed.is_empty() {
        transcript.blank();
        transcript.line("Failed Projects:");
        for name in failed {
            transcript.line(format_args!("- {}", name));
        }
    }

    transcript.blank();
    transcript.line("========== Process Completed ==========");
}
