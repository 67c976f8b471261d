//! Key scheme for per-boundary state
//!
//! Keys are `<prefix><boundary element id>`, e.g. `boundary_word_order_boundary-7`.
//! Orders are stored as comma-joined token ids.

use anno_model::{boundary_element_id, parse_token_element_id, BoundaryId, TokenId};
use serde::{Deserialize, Serialize};

/// Prefixes of the per-boundary keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreKeys {
    /// Prefix of the boundary state key
    pub state_prefix: String,
    /// Prefix of the stored word order key
    pub word_order_prefix: String,
    /// Prefix of the stored heuristic order key
    pub heuristic_prefix: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            state_prefix: "boundary_state_".to_string(),
            word_order_prefix: "boundary_word_order_".to_string(),
            heuristic_prefix: "boundary_heuristic_word_order_".to_string(),
        }
    }
}

impl StoreKeys {
    /// Boundary state key
    #[must_use]
    pub fn state(&self, boundary: BoundaryId) -> String {
        format!("{}{}", self.state_prefix, boundary_element_id(boundary))
    }

    /// Stored word order key
    #[must_use]
    pub fn word_order(&self, boundary: BoundaryId) -> String {
        format!("{}{}", self.word_order_prefix, boundary_element_id(boundary))
    }

    /// Stored heuristic order key
    #[must_use]
    pub fn heuristic(&self, boundary: BoundaryId) -> String {
        format!("{}{}", self.heuristic_prefix, boundary_element_id(boundary))
    }

    /// Every key owned by a boundary
    #[must_use]
    pub fn all(&self, boundary: BoundaryId) -> [String; 3] {
        [
            self.word_order(boundary),
            self.heuristic(boundary),
            self.state(boundary),
        ]
    }

    /// Encode an order for storage
    #[must_use]
    pub fn encode_order(order: &[TokenId]) -> String {
        order
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Decode a stored order
    ///
    /// Accepts bare ids and `token-button-<id>` references; anything else is dropped.
    #[must_use]
    pub fn decode_order(stored: &str) -> Vec<TokenId> {
        stored
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .filter_map(|part| {
                let id = parse_token_element_id(part);
                if id.is_none() {
                    tracing::debug!(part, "dropping unreadable stored token reference");
                }
                id
            })
            .collect()
    }
}
