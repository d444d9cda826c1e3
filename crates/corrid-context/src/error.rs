//! Error types for task-context operations.

use thiserror::Error;

/// Result alias for task-context operations.
pub type ContextResult<T> = Result<T, ContextError>;

/// Errors raised when mutating a task context.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    /// The entry was pinned when the scope opened and cannot change.
    #[error("context entry is pinned")]
    PinnedKey {
        /// Key of the pinned entry.
        key: String,
    },
}
