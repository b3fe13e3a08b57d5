use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which half of the certificate/key pair an artifact error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Certificate,
    PrivateKey,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Certificate => write!(f, "certificate"),
            ArtifactKind::PrivateKey => write!(f, "key"),
        }
    }
}

/// Per-project failure. Recorded as the project's outcome; never aborts the run.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The certificate or key file could not be read.
    #[error("failed to read {artifact} file {path}: {source}")]
    FileRead {
        artifact: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The certificate PEM envelope or its DER contents were malformed.
    #[error("failed to parse certificate: {reason}")]
    CertificateParse { reason: String },

    /// A field the project's mode depends on is empty or absent.
    #[error("{mode} mode requires {}", .fields.join(", "))]
    MissingConfig { mode: String, fields: Vec<String> },

    /// An external client or API call failed, including non-success HTTP statuses.
    #[error("{provider}: {message}")]
    Provider { provider: &'static str, message: String },

    /// The mode tag is not one of the recognised targets.
    #[error("unsupported mode: {mode}")]
    UnsupportedMode { mode: String },
}

impl UpdateError {
    pub fn certificate_parse(reason: impl Into<String>) -> Self {
        Self::CertificateParse { reason: reason.into() }
    }

    pub fn missing_config(mode: impl Into<String>, fields: Vec<String>) -> Self {
        Self::MissingConfig { mode: mode.into(), fields }
    }

    pub fn provider(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Provider { provider, message: message.into() }
    }

    pub fn unsupported_mode(mode: impl Into<String>) -> Self {
        Self::UnsupportedMode { mode: mode.into() }
    }
}
