//! # Pipeline Errors
//!
//! Every variant here is fatal to the run. Recoverable per-line conditions
//! (a reference the resolver does not know) never become errors; they are
//! `LineOutcome::Recovered` values handled inside the producer.

use thiserror::Error;

use crate::core::sink::SinkError;

/// # Pipeline Error
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Pre-run failure: missing input file, resolver or broker initialization.
    #[error("Setup failed: {0}")]
    Setup(String),

    /// A line that cannot be parsed. Aborts the run.
    #[error("Line {line_number}: {reason}")]
    Parse {
        /// One-based line number.
        line_number: u64,
        /// Parser message.
        reason: String,
    },

    /// The resolver answered with something that is neither a record nor a
    /// recognised not-found condition.
    #[error("Line {line_number}: resolution failed for {reference}: {reason}")]
    Resolution {
        /// One-based line number.
        line_number: u64,
        /// The reference being resolved.
        reference: String,
        /// Resolver or document failure.
        reason: String,
    },

    /// The broker rejected a publish.
    #[error("Publish failed: {0}")]
    Publish(#[source] SinkError),

    /// Reading the input file failed mid-run.
    #[error("Failed to read input file: {0}")]
    Io(#[from] std::io::Error),

    /// A notification could not be rendered.
    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),

    /// The relay stopped consuming while the producer still had messages.
    #[error("Queue relay stopped before the producer finished")]
    RelayClosed,

    /// The producer task panicked or was cancelled.
    #[error("Producer task failed: {0}")]
    ProducerTask(String),
}
