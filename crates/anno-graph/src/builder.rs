//! Token relation graph builder

use crate::model::{Arrows, GraphEdge, GraphNode, RelationGraph, DEFAULT_VALUE};
use anno_model::{TokenButton, MANUAL_MARKER};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::trace;

/// How graph nodes are deduplicated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentity {
    /// One node per rendered label text; distinct tokens with equal text share a node
    #[default]
    RenderedLabel,
    /// One node per source id
    SourceId,
}

/// A `(source, label, target)` triplet as entered by an annotator
///
/// Any part may still be unset while the annotator is editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triplet<K, L> {
    /// Source endpoint
    pub source: Option<K>,
    /// Relation label
    pub label: Option<L>,
    /// Target endpoint
    pub target: Option<K>,
}

impl<K, L> Triplet<K, L> {
    /// A fully specified triplet
    pub fn new(source: K, label: L, target: K) -> Self {
        Self {
            source: Some(source),
            label: Some(label),
            target: Some(target),
        }
    }

    /// All three parts, if set
    #[must_use]
    pub fn parts(&self) -> Option<(&K, &L, &K)> {
        match (&self.source, &self.label, &self.target) {
            (Some(source), Some(label), Some(target)) => Some((source, label, target)),
            _ => None,
        }
    }
}

/// Rendered text and class markup of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLabel {
    /// Displayed text
    pub text: String,
    /// Class markup
    pub markup: String,
}

impl NodeLabel {
    /// Whether the markup marks a user-added token
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.markup.contains(MANUAL_MARKER)
    }
}

impl From<&TokenButton> for NodeLabel {
    fn from(button: &TokenButton) -> Self {
        Self {
            text: button.text().to_string(),
            markup: button.markup(),
        }
    }
}

/// Builds visualization graphs from relation triplets
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationGraphBuilder {
    identity: NodeIdentity,
}

impl RelationGraphBuilder {
    /// Create a builder
    #[must_use]
    pub const fn new(identity: NodeIdentity) -> Self {
        Self { identity }
    }

    /// Node identity policy
    #[inline]
    #[must_use]
    pub const fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Build a token graph
    ///
    /// - triplets missing any part, or whose endpoints do not render, are skipped
    /// - node ids start at 1 in first-seen order
    /// - nodes whose markup carries the manual marker get group 1
    /// - nodes end stable-sorted by group
    pub fn build<K, L>(
        &self,
        triplets: &[Triplet<K, L>],
        render_node: impl Fn(&K) -> Option<NodeLabel>,
        render_relation: impl Fn(&L) -> String,
    ) -> RelationGraph
    where
        K: Display,
        L: Display,
    {
        let mut nodes: IndexMap<String, GraphNode> = IndexMap::new();
        let mut edges = Vec::new();

        for triplet in triplets {
            let Some((source, label, target)) = triplet.parts() else {
                trace!("skipping incomplete triplet");
                continue;
            };
            let (Some(source_label), Some(target_label)) = (render_node(source), render_node(target))
            else {
                trace!(%source, %target, "skipping triplet with unrendered endpoint");
                continue;
            };

            let from = self.intern(&mut nodes, source, source_label);
            let to = self.intern(&mut nodes, target, target_label);
            edges.push(GraphEdge {
                from,
                to,
                label: render_relation(label),
                title: format!("Label ID: {label}"),
                arrows: Arrows::to_target(),
                value: DEFAULT_VALUE,
            });
        }

        let mut nodes: Vec<GraphNode> = nodes.into_values().collect();
        nodes.sort_by_key(|node| node.group);
        RelationGraph { nodes, edges }
    }

    fn intern<K: Display>(
        &self,
        nodes: &mut IndexMap<String, GraphNode>,
        source: &K,
        label: NodeLabel,
    ) -> u32 {
        let key = match self.identity {
            NodeIdentity::RenderedLabel => label.text.clone(),
            NodeIdentity::SourceId => source.to_string(),
        };
        let next_id = next_node_id(nodes.len());
        nodes
            .entry(key)
            .or_insert_with(|| GraphNode {
                id: next_id,
                group: u8::from(label.is_manual()),
                title: format!("Token ID: {source}"),
                label: label.text,
                value: DEFAULT_VALUE,
            })
            .id
    }
}

pub(crate) fn next_node_id(len: usize) -> u32 {
    u32::try_from(len).map_or(u32::MAX, |len| len.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_model::{LabelCatalog, LabelId, Token, TokenId};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn tokens() -> BTreeMap<TokenId, Token> {
        [
            Token::new(10, "rāmaḥ"),
            Token::new(11, "vanam"),
            Token::new(12, "gacchati"),
            Token::new(13, "vanam"),
            Token::new(90, "ca").with_annotator(7),
        ]
        .into_iter()
        .map(|t| (t.id, t))
        .collect()
    }

    fn render(tokens: &BTreeMap<TokenId, Token>) -> impl Fn(&TokenId) -> Option<NodeLabel> + '_ {
        |id| tokens.get(id).map(|t| NodeLabel::from(&TokenButton::render(t)))
    }

    fn triplet(src: u64, label: u64, dst: u64) -> Triplet<TokenId, LabelId> {
        Triplet::new(TokenId(src), LabelId(label), TokenId(dst))
    }

    #[test]
    fn builds_nodes_and_edges_in_first_seen_order() {
        let tokens = tokens();
        let labels = LabelCatalog::new().with_label(LabelId(2), "karma");
        let graph = RelationGraphBuilder::default().build(
            &[triplet(12, 2, 11), triplet(12, 3, 10)],
            render(&tokens),
            |l| labels.caption(*l),
        );

        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.nodes[0].label, "gacchati");
        assert_eq!(graph.nodes[0].id, 1);
        assert_eq!(graph.nodes[0].title, "Token ID: 12");
        assert_eq!(graph.nodes[1].id, 2);
        assert_eq!(graph.edges[0].label, "karma");
        assert_eq!(graph.edges[0].title, "Label ID: 2");
        assert_eq!(graph.edges[1].label, "3");
        assert_eq!((graph.edges[1].from, graph.edges[1].to), (1, 3));
        assert!(graph.edges.iter().all(|e| e.arrows.to.enabled && e.value == 3));
    }

    #[test]
    fn incomplete_triplets_are_skipped() {
        let tokens = tokens();
        let partial = [
            Triplet {
                source: Some(TokenId(10)),
                label: Some(LabelId(2)),
                target: None,
            },
            Triplet {
                source: None,
                label: Some(LabelId(2)),
                target: Some(TokenId(11)),
            },
            Triplet {
                source: Some(TokenId(10)),
                label: None,
                target: Some(TokenId(11)),
            },
            triplet(10, 2, 404),
        ];
        let graph = RelationGraphBuilder::default().build(&partial, render(&tokens), |l| {
            l.to_string()
        });
        assert!(graph.is_empty());
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn equal_labels_share_a_node_by_default() {
        let tokens = tokens();
        let triplets = [triplet(12, 2, 11), triplet(10, 2, 13)];

        let graph =
            RelationGraphBuilder::default().build(&triplets, render(&tokens), |l| l.to_string());
        assert_eq!(graph.nodes.len(), 3);
        let vanam = graph.node_by_label("vanam").unwrap();
        assert_eq!(graph.edges[1].to, vanam.id);

        let graph = RelationGraphBuilder::new(NodeIdentity::SourceId).build(
            &triplets,
            render(&tokens),
            |l| l.to_string(),
        );
        assert_eq!(graph.nodes.len(), 4);
    }

    #[test]
    fn manual_nodes_sort_after_corpus_nodes() {
        let tokens = tokens();
        let graph = RelationGraphBuilder::default().build(
            &[triplet(90, 2, 10), triplet(11, 2, 90)],
            render(&tokens),
            |l| l.to_string(),
        );

        let groups: Vec<u8> = graph.nodes.iter().map(|n| n.group).collect();
        assert_eq!(groups, vec![0, 0, 1]);
        let manual = graph.node_by_label("ca").unwrap();
        assert_eq!(manual.id, 1);
        assert_eq!(graph.edges[0].from, 1);
    }

    proptest::proptest! {
        #[test]
        fn edges_only_join_known_nodes(
            parts in proptest::collection::vec(
                (
                    proptest::option::of(proptest::sample::select(vec![10u64, 11, 12, 13, 90, 404])),
                    proptest::option::of(1u64..4),
                    proptest::option::of(proptest::sample::select(vec![10u64, 11, 12, 13, 90, 404])),
                ),
                0..12,
            )
        ) {
            let tokens = tokens();
            let triplets: Vec<Triplet<TokenId, LabelId>> = parts
                .iter()
                .map(|(source, label, target)| Triplet {
                    source: source.map(TokenId),
                    label: label.map(LabelId),
                    target: target.map(TokenId),
                })
                .collect();
            let complete = parts
                .iter()
                .filter(|(s, l, t)| {
                    l.is_some()
                        && s.is_some_and(|s| s != 404)
                        && t.is_some_and(|t| t != 404)
                })
                .count();

            let graph = RelationGraphBuilder::default().build(&triplets, render(&tokens), |l| {
                l.to_string()
            });
            proptest::prop_assert_eq!(graph.edges.len(), complete);
            proptest::prop_assert!(graph.nodes.len() <= 2 * complete);
            for edge in &graph.edges {
                proptest::prop_assert!(graph.nodes.iter().any(|n| n.id == edge.from));
                proptest::prop_assert!(graph.nodes.iter().any(|n| n.id == edge.to));
            }
        }
    }
}
