//! # Observability Infrastructure
//!
//! Two channels: structured diagnostics via `tracing` on stderr, and the
//! user-facing [`Transcript`] on stdout that doubles as the notification body.

pub mod logging;
pub mod transcript;

pub use logging::init_logging;
pub use transcript::Transcript;
