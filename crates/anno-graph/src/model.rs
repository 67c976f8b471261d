//! Graph model in the node/edge shape the network view consumes

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

/// Node size used for every node and edge
pub(crate) const DEFAULT_VALUE: u8 = 3;

/// A graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node id, starting at 1 in first-seen order
    pub id: u32,
    /// Displayed label
    pub label: String,
    /// Hover title
    pub title: String,
    /// Node size
    pub value: u8,
    /// Color group: 0 for corpus tokens, 1 for manual tokens or sentence markers
    pub group: u8,
}

/// Arrow-head settings of an edge end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrowEnd {
    /// Whether the arrow head is drawn
    pub enabled: bool,
}

/// Arrow-head settings of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrows {
    /// Head at the target end
    pub to: ArrowEnd,
}

impl Arrows {
    /// An arrow pointing at the target
    #[must_use]
    pub const fn to_target() -> Self {
        Self {
            to: ArrowEnd { enabled: true },
        }
    }
}

/// A directed, labelled edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Source node id
    pub from: u32,
    /// Target node id
    pub to: u32,
    /// Relation caption
    pub label: String,
    /// Hover title
    pub title: String,
    /// Arrow heads
    pub arrows: Arrows,
    /// Edge width
    pub value: u8,
}

/// Nodes and edges of a relation graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationGraph {
    /// Nodes
    pub nodes: Vec<GraphNode>,
    /// Edges
    pub edges: Vec<GraphEdge>,
}

/// Structural facts about a relation graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    /// Number of nodes
    pub node_count: usize,
    /// Number of edges
    pub edge_count: usize,
    /// Nodes without incoming edges, ascending
    pub roots: Vec<u32>,
    /// Whether some relation chain leads back to where it started
    pub is_cyclic: bool,
}

impl RelationGraph {
    /// Whether the graph has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node with the given label
    #[must_use]
    pub fn node_by_label(&self, label: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.label == label)
    }

    /// Directed view of the graph keyed by node id
    #[must_use]
    pub fn to_digraph(&self) -> DiGraphMap<u32, ()> {
        let mut graph = DiGraphMap::new();
        for node in &self.nodes {
            graph.add_node(node.id);
        }
        for edge in &self.edges {
            graph.add_edge(edge.from, edge.to, ());
        }
        graph
    }

    /// Roots and cycle check
    #[must_use]
    pub fn summary(&self) -> GraphSummary {
        let graph = self.to_digraph();
        let mut roots: Vec<u32> = graph
            .nodes()
            .filter(|node| {
                graph
                    .neighbors_directed(*node, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        roots.sort_unstable();
        GraphSummary {
            node_count: graph.node_count(),
            edge_count: self.edges.len(),
            roots,
            is_cyclic: petgraph::algo::is_cyclic_directed(&graph),
        }
    }
}
