//! Window errors

use anno_model::UnitId;

/// Errors from window assembly
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// Focus unit is not part of the loaded page
    #[error("unit {0} is not on the loaded page")]
    FocusNotLoaded(UnitId),
}
