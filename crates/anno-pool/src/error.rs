//! Pool errors

use crate::state::BoundaryState;
use anno_model::{BoundaryId, TokenId};

/// Errors from pool operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Boundary is not part of the layout
    #[error("unknown boundary: {0}")]
    UnknownBoundary(BoundaryId),

    /// Token is neither included nor excluded in the boundary
    #[error("token {token} is not in boundary {boundary}")]
    TokenNotInBoundary {
        /// Token
        token: TokenId,
        /// Boundary
        boundary: BoundaryId,
    },

    /// Token is not a manually added token
    #[error("token {0} is not a manual token")]
    NotManual(TokenId),

    /// Token is not included in any boundary
    #[error("token {0} is not included in any boundary")]
    NotIncluded(TokenId),

    /// Substitution without tokens to replace
    #[error("no tokens to replace")]
    NothingToReplace,

    /// Boundary has no heuristic order to apply
    #[error("boundary {0} has no heuristic order")]
    NoHeuristic(BoundaryId),

    /// State change not allowed
    #[error("invalid boundary state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// Current state
        from: Option<BoundaryState>,
        /// Requested state
        to: BoundaryState,
    },
}
