//! Runtime error types

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Error returned by a deferred job body.
pub type JobError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Scheduler still busy after {ticks} ticks")]
    Stalled { ticks: usize },
}

/// A deferred job whose body returned an error.
#[derive(Debug, Clone, Serialize)]
pub struct TaskFailure {
    /// Name the job was deferred under
    pub task: String,
    pub message: String,
    pub failed_at: DateTime<Utc>,
}
