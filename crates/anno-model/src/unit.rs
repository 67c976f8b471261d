//! Corpus unit rows

use crate::error::ModelError;
use crate::ids::{BoundaryId, PoolKey, TokenId, UnitId};
use crate::record::{
    Boundary, SentenceClassification, SentenceRelation, TokenClassification, TokenConnection,
    TokenRelation, TokenTextAnnotation,
};
use crate::token::{null_as_default, Token};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Server-suggested defaults, used until explicit annotation exists
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Heuristics {
    /// Suggested word order per boundary
    #[serde(default, deserialize_with = "null_as_default")]
    pub word_order: BTreeMap<BoundaryId, Vec<TokenId>>,
    /// Suggested token relations
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_graph: Vec<TokenRelation>,
}

/// One corpus row (verse) with its tokens and annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitRecord {
    /// Unit id
    pub verse_id: UnitId,
    /// Raw text per line
    #[serde(default)]
    pub text: Vec<String>,
    /// Tokens per line
    #[serde(default)]
    pub tokens: Vec<Vec<Token>>,
    /// Sentence boundaries by id
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentence_boundary: BTreeMap<BoundaryId, Boundary>,
    /// Tokens of each sentence, plus the `extra` pool of manual tokens
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentences: BTreeMap<PoolKey, BTreeMap<TokenId, Token>>,
    /// Canonical token order per boundary
    #[serde(default, deserialize_with = "null_as_default")]
    pub word_order: BTreeMap<BoundaryId, Vec<TokenId>>,
    /// Server heuristics
    #[serde(default, deserialize_with = "null_as_default")]
    pub heuristics: Heuristics,
    /// Token text annotations
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_text_annotation: Vec<TokenTextAnnotation>,
    /// Token classifications
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_classification: Vec<TokenClassification>,
    /// Token relations
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_graph: Vec<TokenRelation>,
    /// Token connections
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_connection: Vec<TokenConnection>,
    /// Sentence classifications
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentence_classification: Vec<SentenceClassification>,
    /// Sentence relations
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentence_graph: Vec<SentenceRelation>,
}

impl UnitRecord {
    /// Empty unit
    #[must_use]
    pub fn new(id: impl Into<UnitId>) -> Self {
        Self {
            verse_id: id.into(),
            text: Vec::new(),
            tokens: Vec::new(),
            sentence_boundary: BTreeMap::new(),
            sentences: BTreeMap::new(),
            word_order: BTreeMap::new(),
            heuristics: Heuristics::default(),
            token_text_annotation: Vec::new(),
            token_classification: Vec::new(),
            token_graph: Vec::new(),
            token_connection: Vec::new(),
            sentence_classification: Vec::new(),
            sentence_graph: Vec::new(),
        }
    }

    /// Unit id
    #[inline]
    #[must_use]
    pub fn id(&self) -> UnitId {
        self.verse_id
    }

    /// All line tokens in reading order
    pub fn line_tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().flatten()
    }

    /// Boundaries that are not soft-deleted
    pub fn active_boundaries(&self) -> impl Iterator<Item = &Boundary> {
        self.sentence_boundary.values().filter(|b| !b.is_deleted)
    }

    /// Whether a boundary exists here and is not deleted
    ///
    /// Sentences whose boundary record is absent are treated as live.
    #[must_use]
    pub fn is_live_boundary(&self, id: BoundaryId) -> bool {
        self.sentence_boundary.get(&id).map_or(true, |b| !b.is_deleted)
    }

    /// Ids of tokens that end a sentence
    #[must_use]
    pub fn boundary_token_ids(&self) -> BTreeSet<TokenId> {
        self.active_boundaries().map(|b| b.token_id).collect()
    }

    /// Marker token of a boundary
    #[must_use]
    pub fn marker_token(&self, id: BoundaryId) -> Option<TokenId> {
        self.sentence_boundary.get(&id).map(|b| b.token_id)
    }

    /// Live sentence boundaries that have a token grouping, ascending
    pub fn sentence_ids(&self) -> impl Iterator<Item = BoundaryId> + '_ {
        self.sentences
            .keys()
            .filter_map(|key| key.boundary())
            .filter(|id| self.is_live_boundary(*id))
    }

    /// Tokens of one sentence, by id
    #[must_use]
    pub fn sentence(&self, id: BoundaryId) -> Option<&BTreeMap<TokenId, Token>> {
        self.sentences.get(&PoolKey::Boundary(id))
    }

    /// Token ids of one sentence, ascending
    #[must_use]
    pub fn sentence_token_ids(&self, id: BoundaryId) -> Vec<TokenId> {
        self.sentence(id)
            .map(|tokens| tokens.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Manually added tokens not tied to a sentence grouping
    #[must_use]
    pub fn extra_tokens(&self) -> Option<&BTreeMap<TokenId, Token>> {
        self.sentences.get(&PoolKey::Extra)
    }

    /// Ids of the extra tokens, ascending
    #[must_use]
    pub fn extra_token_ids(&self) -> Vec<TokenId> {
        self.extra_tokens()
            .map(|tokens| tokens.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Look a token up in the sentence groupings, then in the lines
    #[must_use]
    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.sentences
            .values()
            .find_map(|tokens| tokens.get(&id))
            .or_else(|| self.line_tokens().find(|t| t.id == id))
    }

    /// Stored word order of a boundary, if present and non-empty
    #[must_use]
    pub fn word_order(&self, id: BoundaryId) -> Option<&[TokenId]> {
        self.word_order
            .get(&id)
            .map(Vec::as_slice)
            .filter(|order| !order.is_empty())
    }

    /// Word order of a boundary, or an error naming the missing ordering
    ///
    /// # Errors
    /// Returns [`ModelError::MissingWordOrder`] when the boundary has none.
    pub fn require_word_order(&self, id: BoundaryId) -> Result<&[TokenId], ModelError> {
        self.word_order(id).ok_or(ModelError::MissingWordOrder {
            unit: self.verse_id,
            boundary: id,
        })
    }

    /// Heuristic word order of a boundary, if present and non-empty
    #[must_use]
    pub fn heuristic_word_order(&self, id: BoundaryId) -> Option<&[TokenId]> {
        self.heuristics
            .word_order
            .get(&id)
            .map(Vec::as_slice)
            .filter(|order| !order.is_empty())
    }
}
