//! Annotation task categories

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of annotation task, in canonical sequence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    /// Marking sentence-ending tokens
    SentenceBoundary,
    /// Ordering the tokens of each sentence
    WordOrder,
    /// Free text per token
    TokenTextAnnotation,
    /// Label per token
    TokenClassification,
    /// Labelled relations within a sentence
    TokenGraph,
    /// Links between tokens across units
    TokenConnection,
    /// Label per sentence
    SentenceClassification,
    /// Labelled relations between tokens and sentences across units
    SentenceGraph,
}

impl TaskCategory {
    /// All categories in canonical order
    pub const ALL: [Self; 8] = [
        Self::SentenceBoundary,
        Self::WordOrder,
        Self::TokenTextAnnotation,
        Self::TokenClassification,
        Self::TokenGraph,
        Self::TokenConnection,
        Self::SentenceClassification,
        Self::SentenceGraph,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SentenceBoundary => "sentence_boundary",
            Self::WordOrder => "word_order",
            Self::TokenTextAnnotation => "token_text_annotation",
            Self::TokenClassification => "token_classification",
            Self::TokenGraph => "token_graph",
            Self::TokenConnection => "token_connection",
            Self::SentenceClassification => "sentence_classification",
            Self::SentenceGraph => "sentence_graph",
        }
    }

    /// Form action submitting this category
    #[must_use]
    pub fn update_action(self) -> String {
        format!("update_{}", self.as_str())
    }

    /// Whether the task works on ordered sentences and needs every sentence's word order
    #[must_use]
    pub const fn requires_word_order(self) -> bool {
        !matches!(self, Self::SentenceBoundary | Self::WordOrder)
    }

    /// Whether the task spans neighbouring units
    #[must_use]
    pub const fn is_cross_unit(self) -> bool {
        matches!(
            self,
            Self::SentenceBoundary | Self::TokenConnection | Self::SentenceGraph
        )
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| ModelError::UnknownCategory(s.to_string()))
    }
}
