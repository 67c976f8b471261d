//! Per-unit session state machine
//!
//! ```text
//! Idle --setup--> TaskActive(c) --submit--> Submitting(c) --success--> TaskActive(next)
//!                      ^                         |
//!                      |                         +--rejected/failed--> TaskFailed(c)
//!                      +-------------setup---------------------------------+
//! ```
//!
//! A failed task stays editable and can be submitted again.

use crate::error::TaskError;
use anno_model::TaskCategory;

/// Phase of the open unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// No task set up
    #[default]
    Idle,
    /// Task is set up and editable
    TaskActive(TaskCategory),
    /// Task payload was posted; waiting for the response
    Submitting(TaskCategory),
    /// Last submission failed; the task is still editable
    TaskFailed(TaskCategory),
}

impl SessionPhase {
    /// Category of the task in this phase
    #[inline]
    #[must_use]
    pub const fn category(self) -> Option<TaskCategory> {
        match self {
            Self::Idle => None,
            Self::TaskActive(c) | Self::Submitting(c) | Self::TaskFailed(c) => Some(c),
        }
    }

    /// Whether the task can be edited and submitted
    #[inline]
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::TaskActive(_) | Self::TaskFailed(_))
    }

    /// Whether a submission is outstanding
    #[inline]
    #[must_use]
    pub const fn is_submitting(self) -> bool {
        matches!(self, Self::Submitting(_))
    }
}

/// Whether `to` is reachable from `from` in one step
#[must_use]
pub fn can_transition(from: SessionPhase, to: SessionPhase) -> bool {
    use SessionPhase::{Idle, Submitting, TaskActive, TaskFailed};
    match (from, to) {
        (_, Idle | TaskActive(_)) => true,
        (TaskActive(a) | TaskFailed(a), Submitting(b)) | (Submitting(a), TaskFailed(b)) => a == b,
        _ => false,
    }
}

/// Validate a phase change
///
/// # Errors
/// Returns [`TaskError::InvalidPhase`] when `to` is not reachable from `from`.
pub fn validate_transition(from: SessionPhase, to: SessionPhase) -> Result<(), TaskError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(TaskError::InvalidPhase { from, to })
    }
}
