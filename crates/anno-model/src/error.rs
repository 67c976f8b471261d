//! Model errors

use crate::ids::{BoundaryId, UnitId};

/// Errors raised while interpreting corpus data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Identifier text could not be parsed
    #[error("invalid identifier: {0:?}")]
    InvalidId(String),

    /// Unknown task category name
    #[error("unknown task category: {0:?}")]
    UnknownCategory(String),

    /// Relation type outside 0..=3
    #[error("invalid relation type: {0}")]
    InvalidRelationType(u8),

    /// A sentence-scoped task needs an ordering that does not exist yet
    #[error("boundary {boundary} of unit {unit} has no word order")]
    MissingWordOrder {
        /// Unit owning the boundary
        unit: UnitId,
        /// Boundary lacking the order
        boundary: BoundaryId,
    },
}
