//! # certpush
//!
//! Distributes renewed TLS certificates to the places that serve them: an
//! Aliyun CDN domain, an OSS bucket custom domain (via the certificate
//! service), an APISIX gateway SSL object, or a Kubernetes TLS secret.
//!
//! ## Architecture
//!
//! ```text
//! config.yml → Settings → RunOrchestrator → CertificateDispatcher → providers
//!                              ↓
//!                          Transcript → stdout / webhook
//! ```
//!
//! Every configured project is attempted exactly once, in order. A failing
//! project is recorded and the run moves on; the process exit status reports
//! whether all of them succeeded.

pub mod cli;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod providers;
pub mod services;
pub mod utils;

// Re-export commonly used types and traits
pub use config::{Mode, Project, Settings, Target};
pub use domain::{RunSummary, UpdateOutcome};
pub use errors::{Error, Result, UpdateError};
pub use observability::{init_logging, Transcript};
pub use services::{run_projects, CertificateDispatcher, RunOrchestrator, WebhookNotifier};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
