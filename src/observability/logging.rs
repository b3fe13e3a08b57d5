//! # Structured Logging
//!
//! Diagnostic logging goes through `tracing` to stderr so that stdout carries
//! only the run transcript. `RUST_LOG` takes precedence over `--verbose`.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Create a tracing span for one project's update.
///
/// ```rust,ignore
/// let span = project_span!("www", "alicdn");
/// ```
#[macro_export]
macro_rules! project_span {
    ($project:expr, $mode:expr) => {
        tracing::info_span!(
            "project_update",
            project = %$project,
            mode = %$mode,
            update_id = %uuid::Uuid::new_v4()
        )
    };
    ($project:expr, $mode:expr, $($field:tt)*) => {
        tracing::info_span!(
            "project_update",
            project = %$project,
            mode = %$mode,
            update_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Default filter directive when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Install the global stderr subscriber.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        // Subscriber already set elsewhere (e.g. integration tests); ignore.
    }
}
