//! Utility functions and helpers

pub mod certificates;

pub use certificates::{extract_dns_names, load_artifact, CertificateArtifact};

use chrono::{DateTime, Local, TimeZone};

/// Timestamp layout appended to the certificate name prefix, e.g. `20240115103000.123`
pub const CERT_NAME_TIME_FORMAT: &str = "%Y%m%d%H%M%S%.3f";

/// Generates provider-side certificate names such as `cert20240115103000.123`.
///
/// Names are unique per millisecond, which is enough within one provider
/// namespace during a sequential run.
#[derive(Debug, Clone)]
pub struct CertificateNamer {
    prefix: String,
}

impl CertificateNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// Name for the current local time
    pub fn generate(&self) -> String {
        self.generate_at(&Local::now())
    }

    /// Name for a given instant
    pub fn generate_at<Tz: TimeZone>(&self, at: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        format!("{}{}", self.prefix, at.format(CERT_NAME_TIME_FORMAT))
    }
}

impl Default for CertificateNamer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CERT_NAME_PREFIX)
    }
}
