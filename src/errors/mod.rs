//! # Error Handling
//!
//! Error types for certpush. [`Error`] covers failures that abort the whole
//! run (configuration loading); [`UpdateError`] covers everything that can go
//! wrong while publishing a single project and is recorded as that project's
//! outcome instead of propagating.

pub mod update;

pub use update::{ArtifactKind, UpdateError};

/// Custom result type for run-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Run-level error type; any of these stops the process before a project is touched
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors with additional context
    #[error("I/O error: {context}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error that wraps its cause
    pub fn config_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config { message: message.into(), source: Some(Box::new(source)) }
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }
}
