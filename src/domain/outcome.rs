use serde::Serialize;

/// Result of publishing one project. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UpdateOutcome {
    Succeeded,
    Failed { cause: String },
}

impl UpdateOutcome {
    pub fn failed(cause: impl Into<String>) -> Self {
        Self::Failed { cause: cause.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UpdateOutcome::Succeeded)
    }
}

/// Outcome of one named project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectOutcome {
    pub name: String,
    pub outcome: UpdateOutcome,
}

/// Aggregate over every project attempted in a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<ProjectOutcome>,
    pub transcript: String,
}

impl RunSummary {
    pub fn record(&mut self, name: impl Into<String>, outcome: UpdateOutcome) {
        self.outcomes.push(ProjectOutcome { name: name.into(), outcome });
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.total() - self.success_count()
    }

    /// Names of failed projects, in processing order
    pub fn failed_projects(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.outcome.is_success())
            .map(|o| o.name.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failure_count() == 0
    }

    /// Process exit status: 0 only when every project succeeded
    pub fn exit_code(&self) -> u8 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }
}
