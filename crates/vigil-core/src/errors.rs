//! Cross-cutting error types for Vigil.
//!
//! Domain-specific errors (`StoreError`, `VcsError`, ...) live in their own
//! crates. Illegal transitions and unknown ids are not errors: the queue
//! reports them as `false` / `None`.

use thiserror::Error;

/// Errors that can be raised while building or parsing core values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A task id string did not match the `Q-<number>` format.
    #[error("Invalid task id '{0}', expected Q-<number>")]
    InvalidTaskId(String),

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: task {id} cannot {action} from {from}")]
    InvalidTransition {
        id: String,
        from: String,
        action: String,
    },

    /// Data failed validation (format, range, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}
