//! Error types shared by every task operation.

use std::io;
use std::path::PathBuf;

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;

/// Everything that can go wrong while validating, resolving, looking up or
/// persisting tasks.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Title was empty or whitespace-only after trimming.
    #[error("title cannot be empty")]
    InvalidTitle,

    /// Priority text was not one of low, medium, high.
    #[error("invalid priority '{0}': must be one of low, medium, high")]
    InvalidPriority(String),

    /// Status text was not one of the four lifecycle stages.
    #[error("invalid status '{0}': must be one of pending, in_progress, completed, cancelled")]
    InvalidStatus(String),

    /// Due-date input matched none of the supported forms.
    #[error("unrecognised due date '{0}': use YYYY-MM-DD, today, tomorrow, +Nd, +Nw, next week or next month")]
    UnrecognizedDateExpression(String),

    /// The N in `+Nd` / `+Nw` was not a usable non-negative integer.
    #[error("invalid relative amount in '{0}': expected a non-negative whole number")]
    InvalidRelativeAmount(String),

    /// The highest stored id leaves no room for another task.
    #[error("no task id left after {0}")]
    IdsExhausted(u64),

    /// No task carries the requested id.
    #[error("task {0} not found")]
    TaskNotFound(u64),

    /// The store exists but could not be read or parsed.
    #[error("could not read task store {}: {reason}", path.display())]
    PersistenceReadFailure { path: PathBuf, reason: String },

    /// The store could not be written; the triggering mutation was rolled back.
    #[error("could not save task store {}: {source}", path.display())]
    PersistenceWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
