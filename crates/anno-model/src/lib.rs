//! Corpus data model for the annotation workflow engine
//!
//! Everything the engine reads from or writes to the annotation server.
//!
//! # Core Concepts
//!
//! - [`Token`]: a lexical unit inside a corpus unit, with its morphological [`Analysis`]
//! - [`UnitRecord`]: one corpus row (verse/line) as served by the unit-data endpoint
//! - [`PoolKey`]: a sentence grouping, either a real boundary or the synthetic `extra` pool
//! - [`TaskCategory`]: the eight annotation task kinds in canonical order
//! - [`TokenButton`]: rendered label, style class and hover title of a token
//! - [`SubmitForm`] / [`SubmitResponse`]: the write-side wire shapes
//!
//! # Example
//!
//! ```rust,ignore
//! use anno_model::{TokenButton, UnitRecord};
//!
//! let unit: UnitRecord = serde_json::from_value(row)?;
//! for token in unit.line_tokens() {
//!     println!("{}", TokenButton::render(token).text());
//! }
//! ```

#![warn(unreachable_pub)]

mod error;
mod ids;
mod label;
mod record;
mod render;
mod task;
mod token;
mod unit;
mod wire;

pub use error::ModelError;
pub use ids::{AnnotatorId, BoundaryId, LabelId, PoolKey, TaskId, TokenId, UnitId};
pub use label::{LabelCatalog, RelationLabel};
pub use record::{
    Boundary, RelationType, SentenceClassification, SentenceRelation, TaskScoped,
    TokenClassification, TokenConnection, TokenRelation, TokenTextAnnotation,
};
pub use render::{TokenButton, TokenKind, MANUAL_MARKER};
pub use task::TaskCategory;
pub use token::{Analysis, Misc, Token};
pub use unit::{Heuristics, UnitRecord};
pub use wire::{
    boundary_element_id, parse_token_element_id, token_element_id, Action, NewToken, SubmitForm,
    SubmitResponse,
};
