//! Relation label catalog

use crate::ids::LabelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One label as listed in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationLabel {
    /// Label id
    pub id: LabelId,
    /// Caption shown on edges
    pub text: String,
}

/// Captions of relation labels, looked up by id
///
/// Serialized as a list of `{id, text}` entries so it can live in TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<RelationLabel>", into = "Vec<RelationLabel>")]
pub struct LabelCatalog {
    labels: BTreeMap<LabelId, String>,
}

impl LabelCatalog {
    /// Empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a caption
    #[must_use]
    pub fn with_label(mut self, id: impl Into<LabelId>, text: impl Into<String>) -> Self {
        self.labels.insert(id.into(), text.into());
        self
    }

    /// Caption of a label, if known
    #[must_use]
    pub fn get(&self, id: LabelId) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Caption of a label, falling back to its id
    #[must_use]
    pub fn caption(&self, id: LabelId) -> String {
        self.get(id).map_or_else(|| id.to_string(), str::to_string)
    }

    /// Number of labels
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the catalog is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl From<Vec<RelationLabel>> for LabelCatalog {
    fn from(entries: Vec<RelationLabel>) -> Self {
        Self {
            labels: entries.into_iter().map(|l| (l.id, l.text)).collect(),
        }
    }
}

impl From<LabelCatalog> for Vec<RelationLabel> {
    fn from(catalog: LabelCatalog) -> Self {
        catalog
            .labels
            .into_iter()
            .map(|(id, text)| RelationLabel { id, text })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_falls_back_to_id() {
        let catalog = LabelCatalog::new().with_label(1, "agent");
        assert_eq!(catalog.caption(LabelId(1)), "agent");
        assert_eq!(catalog.caption(LabelId(2)), "2");
    }

    #[test]
    fn deserializes_from_entry_list() {
        let catalog: LabelCatalog =
            serde_json::from_str(r#"[{"id": 3, "text": "object"}]"#).unwrap();
        assert_eq!(catalog.get(LabelId(3)), Some("object"));
        assert_eq!(catalog.len(), 1);
    }
}
