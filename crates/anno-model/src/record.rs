//! Annotation records as served inside a unit row
//!
//! Every record carries the task it belongs to and a soft-delete flag. Deleted
//! records stay in the payload and must be ignored by every consumer.

use crate::error::ModelError;
use crate::ids::{AnnotatorId, BoundaryId, LabelId, TaskId, TokenId, UnitId};
use serde::{Deserialize, Serialize};

/// Shared accessors of task-owned records
pub trait TaskScoped {
    /// Owning task
    fn task_id(&self) -> Option<TaskId>;

    /// Soft-delete flag
    fn is_deleted(&self) -> bool;

    /// Whether the record is live and belongs to `task`
    fn is_live_for(&self, task: TaskId) -> bool {
        !self.is_deleted() && self.task_id() == Some(task)
    }
}

macro_rules! task_scoped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TaskScoped for $ty {
                #[inline]
                fn task_id(&self) -> Option<TaskId> {
                    self.task_id
                }

                #[inline]
                fn is_deleted(&self) -> bool {
                    self.is_deleted
                }
            }
        )*
    };
}

/// Sentence-ending marker within a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Boundary {
    /// Boundary id
    pub id: BoundaryId,
    /// Sentence-boundary task that produced it
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Last token of the sentence
    pub token_id: TokenId,
    /// Owning unit
    #[serde(default)]
    pub verse_id: Option<UnitId>,
    /// Annotator
    #[serde(default)]
    pub annotator_id: Option<AnnotatorId>,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Free-text annotation of a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTextAnnotation {
    /// Owning task
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Sentence of the token
    pub boundary_id: BoundaryId,
    /// Annotated token
    pub token_id: TokenId,
    /// Annotation text
    #[serde(default)]
    pub text: String,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Label attached to a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClassification {
    /// Owning task
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Sentence of the token
    pub boundary_id: BoundaryId,
    /// Classified token
    pub token_id: TokenId,
    /// Assigned label
    pub label_id: LabelId,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Labelled relation between two tokens of one sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRelation {
    /// Owning task; heuristic relations have none
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Sentence the relation lives in
    pub boundary_id: BoundaryId,
    /// Source token
    pub src_id: TokenId,
    /// Relation label
    pub label_id: LabelId,
    /// Target token
    pub dst_id: TokenId,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Unlabelled link between two tokens, possibly across units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConnection {
    /// Owning task
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Unit the connection was entered from
    pub verse_id: UnitId,
    /// Sentence of the source token
    pub boundary_id: BoundaryId,
    /// Source token
    pub src_id: TokenId,
    /// Target token
    pub dst_id: TokenId,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Label attached to a whole sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceClassification {
    /// Owning task
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Classified sentence
    pub boundary_id: BoundaryId,
    /// Assigned label
    pub label_id: LabelId,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

/// Labelled relation whose endpoints are tokens or whole sentences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceRelation {
    /// Owning task
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Unit of the source sentence
    pub src_verse_id: UnitId,
    /// Source sentence
    pub src_boundary_id: BoundaryId,
    /// Source token, or the sentence marker token
    pub src_token_id: TokenId,
    /// Unit of the target sentence
    pub dst_verse_id: UnitId,
    /// Target sentence
    pub dst_boundary_id: BoundaryId,
    /// Target token, or the sentence marker token
    pub dst_token_id: TokenId,
    /// Relation label
    pub label_id: LabelId,
    /// Which endpoints are sentence markers
    pub relation_type: RelationType,
    /// Soft-delete flag
    #[serde(default)]
    pub is_deleted: bool,
}

task_scoped!(
    Boundary,
    TokenTextAnnotation,
    TokenClassification,
    TokenRelation,
    TokenConnection,
    SentenceClassification,
    SentenceRelation,
);

/// Endpoint kinds of a sentence-level relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RelationType {
    /// Token to token
    TokenToken = 0,
    /// Token to sentence
    TokenToSentence = 1,
    /// Sentence to token
    SentenceToToken = 2,
    /// Sentence to sentence
    SentenceToSentence = 3,
}

impl RelationType {
    /// Classify by which endpoints are sentence markers
    #[must_use]
    pub const fn classify(source_is_sentence: bool, target_is_sentence: bool) -> Self {
        match (source_is_sentence, target_is_sentence) {
            (false, false) => Self::TokenToken,
            (false, true) => Self::TokenToSentence,
            (true, false) => Self::SentenceToToken,
            (true, true) => Self::SentenceToSentence,
        }
    }

    /// Whether the source endpoint is a sentence marker
    #[inline]
    #[must_use]
    pub const fn source_is_sentence(self) -> bool {
        matches!(self, Self::SentenceToToken | Self::SentenceToSentence)
    }

    /// Whether the target endpoint is a sentence marker
    #[inline]
    #[must_use]
    pub const fn target_is_sentence(self) -> bool {
        matches!(self, Self::TokenToSentence | Self::SentenceToSentence)
    }
}

impl TryFrom<u8> for RelationType {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::TokenToken),
            1 => Ok(Self::TokenToSentence),
            2 => Ok(Self::SentenceToToken),
            3 => Ok(Self::SentenceToSentence),
            other => Err(ModelError::InvalidRelationType(other)),
        }
    }
}

impl From<RelationType> for u8 {
    fn from(value: RelationType) -> Self {
        value as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn relation_type_classification_matches_wire_codes() {
        assert_eq!(u8::from(RelationType::classify(false, false)), 0);
        assert_eq!(u8::from(RelationType::classify(false, true)), 1);
        assert_eq!(u8::from(RelationType::classify(true, false)), 2);
        assert_eq!(u8::from(RelationType::classify(true, true)), 3);
        assert!(RelationType::SentenceToToken.source_is_sentence());
        assert!(!RelationType::SentenceToToken.target_is_sentence());
    }

    #[test]
    fn relation_type_rejects_unknown_codes() {
        let parsed: Result<RelationType, _> = serde_json::from_value(json!(4));
        assert!(parsed.is_err());
    }

    #[test]
    fn live_filter_checks_task_and_delete_flag() {
        let relation = TokenRelation {
            task_id: Some(TaskId(5)),
            boundary_id: BoundaryId(1),
            src_id: TokenId(10),
            label_id: LabelId(2),
            dst_id: TokenId(11),
            is_deleted: false,
        };
        assert!(relation.is_live_for(TaskId(5)));
        assert!(!relation.is_live_for(TaskId(6)));

        let deleted = TokenRelation {
            is_deleted: true,
            ..relation
        };
        assert!(!deleted.is_live_for(TaskId(5)));
    }
}
