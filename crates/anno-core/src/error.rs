//! Error types for the task orchestrator
//!
//! Provides error handling for:
//! - Form validation before submission
//! - Missing task preconditions (word orders)
//! - Pool, window and API failures
//! - Duplicate submissions and session misuse

use crate::api::ApiError;
use crate::session::SessionPhase;
use anno_model::{Action, BoundaryId, ModelError, TaskCategory, TokenId, UnitId};
use anno_pool::PoolError;
use anno_window::WindowError;

/// Main orchestrator error type
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Required form input is missing; nothing was sent
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Offending field or row
        field: String,
        /// What is missing
        reason: String,
    },

    /// Unit data does not satisfy the task (e.g. a sentence without word order)
    #[error("unit data: {0}")]
    Model(#[from] ModelError),

    /// Pool edit failed
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    /// Window could not be built
    #[error("window error: {0}")]
    Window(#[from] WindowError),

    /// Server call failed
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Payload could not be encoded
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    /// Server answered `success: false` to an out-of-task action
    #[error("rejected: {message}")]
    Rejected {
        /// Server message
        message: String,
        /// Notification style
        style: String,
    },

    /// Same action on the same unit is still waiting for its response
    #[error("{action} for unit {unit} is already in flight")]
    SubmissionInFlight {
        /// Unit
        unit: UnitId,
        /// Pending action
        action: Action,
    },

    /// No unit is open
    #[error("no unit is open")]
    NoOpenUnit,

    /// No task is set up
    #[error("no task is active")]
    NoActiveTask,

    /// Active task is of another category
    #[error("active task is {actual}, not {expected}")]
    WrongCategory {
        /// Requested category
        expected: TaskCategory,
        /// Active category
        actual: TaskCategory,
    },

    /// Category has no configured task id
    #[error("no task id configured for {0}")]
    UnboundCategory(TaskCategory),

    /// Grid has no row at this index
    #[error("grid index {0} is out of range")]
    IndexOutOfRange(usize),

    /// Boundary is not part of the task
    #[error("boundary {0} is not part of the task")]
    UnknownBoundary(BoundaryId),

    /// Token is not offered by the task
    #[error("token {0} is not part of the task")]
    UnknownToken(TokenId),

    /// Row index does not exist
    #[error("no row {0}")]
    UnknownRow(usize),

    /// Pick was refused
    #[error("selection refused: {0}")]
    Selection(&'static str),

    /// Row belongs to another unit and is read-only here
    #[error("row {0} belongs to another unit")]
    ContextRow(usize),

    /// Session cannot move between these phases
    #[error("invalid session transition: {from:?} -> {to:?}")]
    InvalidPhase {
        /// Current phase
        from: SessionPhase,
        /// Requested phase
        to: SessionPhase,
    },

    /// Successful response lacks expected data
    #[error("response is missing {0}")]
    MissingResponseData(&'static str),
}

impl TaskError {
    /// Check if the failure was caught before anything was sent
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Model(ModelError::MissingWordOrder { .. })
        )
    }

    /// Check if retrying the same request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(error) => error.is_retryable(),
            Self::SubmissionInFlight { .. } | Self::Rejected { .. } => true,
            _ => false,
        }
    }

    /// Validation error for a field
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_word_order_counts_as_validation() {
        let error = TaskError::from(ModelError::MissingWordOrder {
            unit: UnitId(1),
            boundary: BoundaryId(2),
        });
        assert!(error.is_validation());
        assert!(!error.is_retryable());
        assert!(TaskError::validation("label", "required").is_validation());
    }

    #[test]
    fn transport_failures_are_retryable() {
        assert!(TaskError::from(ApiError::Transport("reset".into())).is_retryable());
        assert!(TaskError::from(ApiError::Status(503)).is_retryable());
        assert!(!TaskError::from(ApiError::Status(400)).is_retryable());
        assert!(TaskError::SubmissionInFlight {
            unit: UnitId(1),
            action: Action::AddToken,
        }
        .is_retryable());
    }
}
