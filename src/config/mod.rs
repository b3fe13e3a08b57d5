//! # Configuration Management
//!
//! Loads the YAML settings document and resolves each project record into a
//! mode-specific [`Target`] before any project is processed.

pub mod project;
pub mod settings;

pub use project::{
    AccessKey, AliCdnTarget, AliOssTarget, ApisixTarget, K8sSecretTarget, Mode, Project,
    ProjectSpec, Target,
};
pub use settings::{default_config_path, ConfiguredProject, Settings, DEFAULT_CERT_NAME_PREFIX};
