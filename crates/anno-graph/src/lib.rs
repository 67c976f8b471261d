//! Relation graph builder
//!
//! Turns annotator-entered `(source, label, target)` triplets into graph models
//! for visualization:
//! - [`RelationGraphBuilder::build`]: token graphs with nodes deduplicated by
//!   rendered label (or by id, see [`NodeIdentity`])
//! - [`RelationGraphBuilder::build_sentence_graph`]: graphs whose endpoints may be
//!   whole sentences, classified by [`anno_model::RelationType`]
//! - [`RelationGraphBuilder::build_arcs`]: arc diagrams over an ordered sentence
//!
//! Incomplete triplets are skipped, never reported as errors.

#![warn(unreachable_pub)]

mod arcs;
mod builder;
mod model;
mod sentence;

pub use arcs::{ArcDiagram, ArcDirection, ArcWord, DependencyArc};
pub use builder::{NodeIdentity, NodeLabel, RelationGraphBuilder, Triplet};
pub use model::{ArrowEnd, Arrows, GraphEdge, GraphNode, GraphSummary, RelationGraph};
pub use sentence::{SentenceEndpoint, SentenceGraph, SentenceTriplet};
