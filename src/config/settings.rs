//! # Configuration Settings
//!
//! Top-level settings document: the ordered project list plus global options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::project::{Project, ProjectSpec};
use crate::errors::{Error, Result, UpdateError};

/// Default certificate name prefix
pub const DEFAULT_CERT_NAME_PREFIX: &str = "cert";

/// Settings loaded from the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Projects in processing order
    pub projects: Vec<ProjectSpec>,

    /// WeCom (qiyewechat) robot webhook; empty disables notification
    pub qiyewechat_webhook_url: Option<String>,

    /// Kubeconfig used by `k8s-secret` projects instead of the standard lookup
    pub kubeconfig: Option<PathBuf>,

    /// Prefix for generated certificate names
    pub cert_name_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            qiyewechat_webhook_url: None,
            kubeconfig: None,
            cert_name_prefix: DEFAULT_CERT_NAME_PREFIX.to_string(),
        }
    }
}

/// A configured project together with the result of resolving it.
#[derive(Debug)]
pub struct ConfiguredProject {
    pub spec: ProjectSpec,
    pub resolved: std::result::Result<Project, UpdateError>,
}

impl Settings {
    /// Load settings from a YAML file.
    ///
    /// A read failure is reported as [`Error::Io`], a decode failure as [`Error::Config`].
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, format!("reading {}", path.display())))?;

        let settings = Self::from_yaml(&contents)?;
        debug!(path = %path.display(), projects = settings.projects.len(), "Loaded configuration");
        Ok(settings)
    }

    /// Decode settings from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| Error::config_with_source(format!("invalid YAML: {}", e), e))
    }

    /// Webhook target, if one is configured
    pub fn webhook_url(&self) -> Option<&str> {
        self.qiyewechat_webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Resolve every project up front, keeping configuration order.
    ///
    /// Projects that fail to resolve are kept so the run can report them in place.
    pub fn resolve_projects(&self) -> Vec<ConfiguredProject> {
        self.projects
            .iter()
            .map(|spec| {
                let resolved = spec.resolve();
                if let Err(e) = &resolved {
                    warn!(project = %spec.name, mode = %spec.mode, error = %e, "Invalid project configuration");
                }
                ConfiguredProject { spec: spec.clone(), resolved }
            })
            .collect()
    }
}

/// `config.yml` next to the running executable
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()
        .map_err(|e| Error::io(e, "locating the running executable"))?;
    let dir = exe
        .parent()
        .ok_or_else(|| Error::config(format!("executable {} has no parent", exe.display())))?;
    Ok(dir.join("config.yml"))
}
