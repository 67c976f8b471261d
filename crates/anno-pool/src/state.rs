//! Boundary state machine
//!
//! ```text
//! (none) --heuristic present--> TokenDecision --apply heuristic--> Heuristic
//!    |                               |                                  |
//!    +-------------------------------+------ reorder / toggle ----------+--> Sort
//! ```
//!
//! `Sort` only leaves through an explicit reset, which clears the state.

use crate::error::PoolError;
use serde::{Deserialize, Serialize};

/// Derived per-boundary ordering state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryState {
    /// A heuristic order exists and awaits confirmation
    TokenDecision,
    /// The heuristic order is applied and unmodified
    Heuristic,
    /// The annotator reordered or toggled tokens
    Sort,
}

impl BoundaryState {
    /// Stored representation
    #[must_use]
    pub const fn as_stored(self) -> &'static str {
        match self {
            Self::TokenDecision => "boundary_status_token_decision",
            Self::Heuristic => "boundary_status_heuristic",
            Self::Sort => "boundary_status_sort",
        }
    }

    /// Parse a stored value; bare names are accepted too
    #[must_use]
    pub fn from_stored(value: &str) -> Option<Self> {
        match value.trim().trim_start_matches("boundary_status_") {
            "token_decision" => Some(Self::TokenDecision),
            "heuristic" => Some(Self::Heuristic),
            "sort" => Some(Self::Sort),
            _ => None,
        }
    }

    /// Badge caption
    #[must_use]
    pub const fn badge_text(self) -> &'static str {
        match self {
            Self::TokenDecision => "Confirm Tokens?",
            Self::Heuristic => "Heuristic",
            Self::Sort => "Pending",
        }
    }

    /// Badge style
    #[must_use]
    pub const fn badge_style(self) -> &'static str {
        match self {
            Self::TokenDecision => "primary",
            Self::Heuristic => "info",
            Self::Sort => "warning",
        }
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: Option<BoundaryState>) -> Vec<BoundaryState> {
    use BoundaryState::{Heuristic, Sort, TokenDecision};
    match from {
        None => vec![TokenDecision, Sort],
        Some(TokenDecision) => vec![Heuristic, Sort],
        Some(Heuristic | Sort) => vec![Sort],
    }
}

/// Validate a state change
///
/// # Errors
/// Returns [`PoolError::InvalidTransition`] when `to` is not reachable from `from`.
pub fn validate_transition(
    from: Option<BoundaryState>,
    to: BoundaryState,
) -> Result<(), PoolError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(PoolError::InvalidTransition { from, to })
    }
}
