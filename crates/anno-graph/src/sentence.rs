//! Sentence-level relation graphs
//!
//! Endpoints are either tokens or whole sentences. A sentence endpoint is
//! addressed by its marker token and shown as `S-<boundary>`.

use crate::builder::{next_node_id, NodeIdentity, RelationGraphBuilder, Triplet};
use crate::model::{Arrows, GraphEdge, GraphNode, RelationGraph, DEFAULT_VALUE};
use anno_model::{BoundaryId, RelationType, TokenId};
use indexmap::IndexMap;
use std::fmt::{self, Display};
use tracing::trace;

/// Token or sentence endpoint of a sentence-level relation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SentenceEndpoint {
    /// Sentence the endpoint belongs to
    pub boundary_id: BoundaryId,
    /// Token, or the sentence's marker token
    pub token_id: TokenId,
    /// Whether the endpoint stands for the whole sentence
    pub is_sentence: bool,
    /// Displayed text
    pub label: String,
}

impl SentenceEndpoint {
    /// A token endpoint
    pub fn token(boundary_id: BoundaryId, token_id: TokenId, label: impl Into<String>) -> Self {
        Self {
            boundary_id,
            token_id,
            is_sentence: false,
            label: label.into(),
        }
    }

    /// A whole-sentence endpoint addressed by its marker token
    #[must_use]
    pub fn sentence(boundary_id: BoundaryId, marker_token: TokenId) -> Self {
        Self {
            boundary_id,
            token_id: marker_token,
            is_sentence: true,
            label: format!("S-{boundary_id}"),
        }
    }
}

impl Display for SentenceEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentence {
            write!(f, "S-{}", self.boundary_id)
        } else {
            write!(f, "{}:{}", self.boundary_id, self.token_id)
        }
    }
}

/// Triplet over sentence endpoints
pub type SentenceTriplet<L> = Triplet<SentenceEndpoint, L>;

/// Sentence graph plus the relation type of each edge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SentenceGraph {
    /// Graph model
    pub graph: RelationGraph,
    /// Relation type of `graph.edges[i]`
    pub relation_types: Vec<RelationType>,
}

impl RelationGraphBuilder {
    /// Build a sentence-level graph
    ///
    /// Each complete triplet is classified by which endpoints are sentences.
    /// Sentence endpoints get group 1. Node order is first-seen order.
    pub fn build_sentence_graph<L: Display>(
        &self,
        triplets: &[SentenceTriplet<L>],
        render_relation: impl Fn(&L) -> String,
    ) -> SentenceGraph {
        let mut nodes: IndexMap<String, GraphNode> = IndexMap::new();
        let mut out = SentenceGraph::default();

        for triplet in triplets {
            let Some((source, label, target)) = triplet.parts() else {
                trace!("skipping incomplete sentence triplet");
                continue;
            };
            let relation_type = RelationType::classify(source.is_sentence, target.is_sentence);
            let from = self.intern_endpoint(&mut nodes, source, relation_type);
            let to = self.intern_endpoint(&mut nodes, target, relation_type);

            out.graph.edges.push(GraphEdge {
                from,
                to,
                label: render_relation(label),
                title: format!("Label ID: {label}\nRelation Type: {}", u8::from(relation_type)),
                arrows: Arrows::to_target(),
                value: DEFAULT_VALUE,
            });
            out.relation_types.push(relation_type);
        }

        out.graph.nodes = nodes.into_values().collect();
        out
    }

    fn intern_endpoint(
        &self,
        nodes: &mut IndexMap<String, GraphNode>,
        endpoint: &SentenceEndpoint,
        relation_type: RelationType,
    ) -> u32 {
        let key = match self.identity() {
            NodeIdentity::RenderedLabel => endpoint.label.clone(),
            NodeIdentity::SourceId => endpoint.to_string(),
        };
        let next_id = next_node_id(nodes.len());
        nodes
            .entry(key)
            .or_insert_with(|| GraphNode {
                id: next_id,
                label: endpoint.label.clone(),
                title: format!(
                    "Sentence ID: {}\nToken ID: {}\nRelation Type: {}",
                    endpoint.boundary_id,
                    endpoint.token_id,
                    u8::from(relation_type)
                ),
                value: DEFAULT_VALUE,
                group: u8::from(endpoint.is_sentence),
            })
            .id
    }
}
