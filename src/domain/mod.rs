//! Domain layer
//!
//! Run results with zero infrastructure dependencies: the per-project
//! [`UpdateOutcome`] and the aggregate [`RunSummary`].

pub mod outcome;

pub use outcome::{ProjectOutcome, RunSummary, UpdateOutcome};
