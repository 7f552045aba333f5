//! Error types for banwatch
//!
//! Two granularities matter here and they never mix:
//! - Run-level failures (`RateLimited`, `EmptyInput`, configuration problems)
//!   abort before any account is touched and surface as [`Error`].
//! - Per-account failures are data, not errors: they are recorded in that
//!   account's [`crate::CheckOutcome`] and never abort a sweep.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for banwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for banwatch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "solver.client_key")
        key: Option<String>,
    },

    /// Actor denied by the cooldown gate; retry once the window has elapsed
    #[error("rate limited: retry in {retry_after:?}")]
    RateLimited {
        /// Time remaining until the actor may run again
        retry_after: Duration,
    },

    /// A sweep was requested with no accounts to check
    #[error("no accounts to check")]
    EmptyInput,

    /// Task-solver failure
    #[error("solver error: {0}")]
    Solve(#[from] SolveError),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Status check against the remote page failed
    #[error("status check failed: {0}")]
    Check(String),

    /// Persistence collaborator failed to record a result
    #[error("failed to persist result: {0}")]
    Store(String),

    /// Output sink failed to accept a result batch
    #[error("failed to deliver batch: {0}")]
    Sink(String),
}

/// Failures of one solve call against the task service
///
/// Every variant is terminal for the call: the client never retries on its
/// own, and no partial solution is ever surfaced.
#[derive(Debug, Error)]
pub enum SolveError {
    /// Non-zero error envelope from the task service
    #[error("task service error {error_id} ({code}): {description}")]
    Remote {
        /// The `errorId` reported by the service
        error_id: i64,
        /// Machine-readable error code (e.g., "ERROR_KEY_DOES_NOT_EXIST")
        code: String,
        /// Human-readable description from the service
        description: String,
    },

    /// The caller's deadline expired before the task reached a terminal state
    #[error("solve timeout")]
    Timeout,

    /// The caller cancelled the solve while it was waiting to poll
    #[error("solve cancelled")]
    Cancelled,

    /// The solution arrived without a field the task kind requires
    #[error("solution missing required field `{field}`")]
    MissingField {
        /// Name of the absent or malformed field
        field: String,
    },

    /// The service reply did not follow the protocol
    #[error("malformed task service response: {0}")]
    Malformed(String),

    /// Network error talking to the task service
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}
