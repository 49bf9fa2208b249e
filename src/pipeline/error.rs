//! Error types and reporting for pipeline stages.

use crate::pipeline::queue::QueueClosed;
use std::fmt;

/// Errors that can occur while a stage processes one unit.
#[derive(Debug, Clone)]
pub enum StageError {
    /// The current unit is abandoned; the stage keeps running.
    Recoverable(String),
    /// The stage cannot continue; the whole pipeline drains.
    Fatal(String),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StageError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StageError {}

impl From<QueueClosed> for StageError {
    fn from(_: QueueClosed) -> Self {
        // A vanished consumer means the pipeline is coming down
        StageError::Fatal("output queue closed".to_string())
    }
}

/// Trait for reporting stage errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a stage.
    fn report(&self, stage: &str, error: &StageError);
}

/// Simple error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, stage: &str, error: &StageError) {
        eprintln!("voxloop [{}] {}", stage, error);
    }
}
