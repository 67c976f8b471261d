//! Arc diagrams over an ordered sentence

use crate::builder::{RelationGraphBuilder, Triplet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A word of the diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcWord {
    /// Displayed text
    pub text: String,
}

/// Direction of an arc relative to reading order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcDirection {
    /// Source precedes target
    Right,
    /// Target precedes source
    Left,
}

/// A labelled arc between two word positions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyArc {
    /// Leftmost position
    pub start: usize,
    /// Rightmost position
    pub end: usize,
    /// Arrow direction
    pub dir: ArcDirection,
    /// Relation caption
    pub label: String,
}

/// Words and arcs of an arc diagram
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArcDiagram {
    /// Words in reading order
    pub words: Vec<ArcWord>,
    /// Arcs
    pub arcs: Vec<DependencyArc>,
}

impl RelationGraphBuilder {
    /// Build an arc diagram
    ///
    /// `words` gives every token of the sentence in order with its text. Arcs
    /// whose triplet is incomplete or names a token outside `words` are skipped.
    pub fn build_arcs<K, L>(
        &self,
        words: &[(K, String)],
        triplets: &[Triplet<K, L>],
        render_relation: impl Fn(&L) -> String,
    ) -> ArcDiagram
    where
        K: Eq + Hash,
    {
        let positions: HashMap<&K, usize> = words
            .iter()
            .enumerate()
            .map(|(position, (key, _))| (key, position))
            .collect();

        let arcs = triplets
            .iter()
            .filter_map(|triplet| {
                let (source, label, target) = triplet.parts()?;
                let from = *positions.get(source)?;
                let to = *positions.get(target)?;
                Some(DependencyArc {
                    start: from.min(to),
                    end: from.max(to),
                    dir: if from < to {
                        ArcDirection::Right
                    } else {
                        ArcDirection::Left
                    },
                    label: render_relation(label),
                })
            })
            .collect();

        ArcDiagram {
            words: words
                .iter()
                .map(|(_, text)| ArcWord { text: text.clone() })
                .collect(),
            arcs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_model::{LabelId, TokenId};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn words() -> Vec<(TokenId, String)> {
        vec![
            (TokenId(10), "rāmaḥ".to_string()),
            (TokenId(11), "vanam".to_string()),
            (TokenId(12), "gacchati".to_string()),
        ]
    }

    #[test]
    fn arcs_point_along_reading_order() {
        let triplets = [
            Triplet::new(TokenId(12), LabelId(1), TokenId(10)),
            Triplet::new(TokenId(10), LabelId(2), TokenId(11)),
        ];
        let diagram = RelationGraphBuilder::default().build_arcs(&words(), &triplets, |l| {
            format!("L{l}")
        });

        assert_eq!(diagram.words.len(), 3);
        assert_eq!(
            diagram.arcs,
            vec![
                DependencyArc {
                    start: 0,
                    end: 2,
                    dir: ArcDirection::Left,
                    label: "L1".to_string(),
                },
                DependencyArc {
                    start: 0,
                    end: 1,
                    dir: ArcDirection::Right,
                    label: "L2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn unknown_endpoints_are_skipped() {
        let triplets = [
            Triplet::new(TokenId(12), LabelId(1), TokenId(99)),
            Triplet {
                source: Some(TokenId(10)),
                label: None,
                target: Some(TokenId(11)),
            },
        ];
        let diagram =
            RelationGraphBuilder::default().build_arcs(&words(), &triplets, |l| l.to_string());
        assert!(diagram.arcs.is_empty());
    }

    #[test]
    fn serializes_lowercase_directions() {
        let triplets = [Triplet::new(TokenId(10), LabelId(1), TokenId(12))];
        let diagram =
            RelationGraphBuilder::default().build_arcs(&words(), &triplets, |l| l.to_string());
        let value = serde_json::to_value(&diagram).unwrap();
        assert_eq!(
            value["arcs"][0],
            json!({"start": 0, "end": 2, "dir": "right", "label": "1"})
        );
        assert_eq!(value["words"][1], json!({"text": "vanam"}));
    }
}
