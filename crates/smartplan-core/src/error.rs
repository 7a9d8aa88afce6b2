//! Core error types for smartplan-core.
//!
//! This module defines the error hierarchy using thiserror. Estimation
//! failures (oracle timeouts) are deliberately *not* part of this hierarchy:
//! they are absorbed at the call site with documented defaults and never
//! propagate as errors.

use thiserror::Error;

/// Core error type for smartplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Validation errors on task input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Job dispatcher errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Task store errors (external collaborator)
    #[error("Task store error: {0}")]
    Store(String),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Validation errors on task input.
///
/// These are per-task: one invalid task is reported and skipped, the rest
/// of the batch is still processed.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be greater than start ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },

    /// Non-positive duration after estimation
    #[error("Non-positive duration for task {task_id}: {minutes} minutes")]
    NonPositiveDuration { task_id: String, minutes: i64 },
}

/// Job dispatcher errors.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A live job already exists for the key. Callers that may be
    /// re-registering a task must go through `reschedule` instead.
    #[error("Job already scheduled for task {task_id} ({kind})")]
    AlreadyScheduled { task_id: String, kind: String },

    /// The task carries no schedulable times
    #[error("Task {0} has no scheduled start time")]
    NotSchedulable(String),

    /// The dispatcher has been shut down
    #[error("Dispatcher is not running")]
    NotRunning,
}

/// Oracle errors.
///
/// Only ever observed inside the timeout wrapper in the `oracle` module;
/// scoring and optimization see the substituted default, never the error.
#[derive(Error, Debug)]
pub enum OracleError {
    /// The oracle did not answer within the configured bound
    #[error("Oracle timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// The oracle answered with a failure
    #[error("Oracle failed: {0}")]
    Failed(String),

    /// The oracle is not configured/available
    #[error("Oracle unavailable")]
    Unavailable,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
