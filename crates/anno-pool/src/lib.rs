//! Token pool manager
//!
//! Partitions the tokens of a unit into per-boundary working pools and tracks
//! their ordering:
//! - *included*: the ordered tokens of a sentence
//! - *excluded*: sentence tokens toggled out of the order
//! - *extra*: manually added tokens not assigned to any sentence
//!
//! Every boundary carries a [`BoundaryState`] recording whether its order came
//! from the server heuristic or from the annotator. Pool state is written through
//! a [`anno_store::StateStore`] so a reload rebuilds the same layout.

#![warn(unreachable_pub)]

mod error;
mod heuristic;
mod manager;
mod pools;
mod state;

pub use error::PoolError;
pub use heuristic::suggest_word_order;
pub use manager::TokenPoolManager;
pub use pools::{BoundaryPool, Inclusion, UnitPools};
pub use state::{allowed_transitions, validate_transition, BoundaryState};
