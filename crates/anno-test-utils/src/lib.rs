//! Testing utilities for the annotation workspace
//!
//! Shared fixtures: token constructors, a unit builder and sample pages.

#![allow(missing_docs)]

use anno_model::{
    Boundary, BoundaryId, LabelId, PoolKey, RelationType, SentenceClassification,
    SentenceRelation, TaskId, Token, TokenClassification, TokenConnection, TokenId,
    TokenRelation, TokenTextAnnotation, UnitId, UnitRecord,
};
use anno_store::MemoryStore;
use std::sync::Arc;

pub const TEST_ANNOTATOR: u64 = 7;

pub fn token(id: u64, text: &str) -> Token {
    Token::new(id, text)
}

pub fn manual_token(id: u64, text: &str) -> Token {
    Token::new(id, text).with_annotator(TEST_ANNOTATOR)
}

pub fn setup_test_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

/// Builds unit rows shaped like the unit-data endpoint's output
#[derive(Debug, Clone)]
pub struct UnitBuilder {
    unit: UnitRecord,
}

impl UnitBuilder {
    pub fn new(id: u64) -> Self {
        let mut unit = UnitRecord::new(id);
        unit.tokens.push(Vec::new());
        Self { unit }
    }

    /// Continue building from an existing row
    pub fn from_record(unit: UnitRecord) -> Self {
        Self { unit }
    }

    /// Start a new line; later tokens go there
    pub fn new_line(mut self) -> Self {
        self.unit.tokens.push(Vec::new());
        self
    }

    /// Append tokens to the current line without creating a sentence
    pub fn line_tokens(mut self, tokens: Vec<Token>) -> Self {
        let unit_id = self.unit.verse_id;
        if let Some(line) = self.unit.tokens.last_mut() {
            line.extend(tokens.into_iter().map(|mut t| {
                t.verse_id = Some(unit_id);
                t
            }));
        }
        self
    }

    /// Append a sentence: its tokens go to the current line, its boundary marks the last one
    pub fn sentence(self, boundary: u64, tokens: &[(u64, &str)]) -> Self {
        let tokens: Vec<Token> = tokens.iter().map(|(id, text)| token(*id, text)).collect();
        self.sentence_of(boundary, tokens)
    }

    /// Like [`UnitBuilder::sentence`] with prepared tokens
    pub fn sentence_of(mut self, boundary: u64, tokens: Vec<Token>) -> Self {
        let unit_id = self.unit.verse_id;
        if let Some(last) = tokens.last() {
            self.unit.sentence_boundary.insert(
                BoundaryId(boundary),
                Boundary {
                    id: BoundaryId(boundary),
                    task_id: Some(TaskId(1)),
                    token_id: last.id,
                    verse_id: Some(unit_id),
                    annotator_id: None,
                    is_deleted: false,
                },
            );
        }
        self.unit.sentences.insert(
            PoolKey::Boundary(BoundaryId(boundary)),
            tokens.iter().map(|t| (t.id, t.clone())).collect(),
        );
        self.line_tokens(tokens)
    }

    pub fn delete_boundary(mut self, boundary: u64) -> Self {
        if let Some(b) = self.unit.sentence_boundary.get_mut(&BoundaryId(boundary)) {
            b.is_deleted = true;
        }
        self
    }

    pub fn word_order(mut self, boundary: u64, order: &[u64]) -> Self {
        self.unit
            .word_order
            .insert(BoundaryId(boundary), order.iter().copied().map(TokenId).collect());
        self
    }

    pub fn heuristic(mut self, boundary: u64, order: &[u64]) -> Self {
        self.unit
            .heuristics
            .word_order
            .insert(BoundaryId(boundary), order.iter().copied().map(TokenId).collect());
        self
    }

    /// Add a manual token to the `extra` pool (and to the first line)
    pub fn extra(mut self, token: Token) -> Self {
        let mut token = token;
        token.verse_id = Some(self.unit.verse_id);
        self.unit
            .sentences
            .entry(PoolKey::Extra)
            .or_default()
            .insert(token.id, token.clone());
        if let Some(line) = self.unit.tokens.first_mut() {
            line.push(token);
        }
        self
    }

    pub fn text_annotation(mut self, task: u64, boundary: u64, token: u64, text: &str) -> Self {
        self.unit.token_text_annotation.push(TokenTextAnnotation {
            task_id: Some(TaskId(task)),
            boundary_id: BoundaryId(boundary),
            token_id: TokenId(token),
            text: text.to_string(),
            is_deleted: false,
        });
        self
    }

    pub fn token_class(mut self, task: u64, boundary: u64, token: u64, label: u64) -> Self {
        self.unit.token_classification.push(TokenClassification {
            task_id: Some(TaskId(task)),
            boundary_id: BoundaryId(boundary),
            token_id: TokenId(token),
            label_id: LabelId(label),
            is_deleted: false,
        });
        self
    }

    pub fn token_relation(mut self, task: u64, boundary: u64, src: u64, label: u64, dst: u64) -> Self {
        self.unit.token_graph.push(relation(Some(task), boundary, src, label, dst));
        self
    }

    pub fn heuristic_relation(mut self, boundary: u64, src: u64, label: u64, dst: u64) -> Self {
        self.unit
            .heuristics
            .token_graph
            .push(relation(None, boundary, src, label, dst));
        self
    }

    pub fn connection(mut self, task: u64, from_unit: u64, boundary: u64, src: u64, dst: u64) -> Self {
        self.unit.token_connection.push(TokenConnection {
            task_id: Some(TaskId(task)),
            verse_id: UnitId(from_unit),
            boundary_id: BoundaryId(boundary),
            src_id: TokenId(src),
            dst_id: TokenId(dst),
            is_deleted: false,
        });
        self
    }

    pub fn sentence_class(mut self, task: u64, boundary: u64, label: u64) -> Self {
        self.unit.sentence_classification.push(SentenceClassification {
            task_id: Some(TaskId(task)),
            boundary_id: BoundaryId(boundary),
            label_id: LabelId(label),
            is_deleted: false,
        });
        self
    }

    pub fn sentence_relation(mut self, relation: SentenceRelation) -> Self {
        self.unit.sentence_graph.push(relation);
        self
    }

    pub fn build(self) -> UnitRecord {
        self.unit
    }
}

fn relation(task: Option<u64>, boundary: u64, src: u64, label: u64, dst: u64) -> TokenRelation {
    TokenRelation {
        task_id: task.map(TaskId),
        boundary_id: BoundaryId(boundary),
        src_id: TokenId(src),
        label_id: LabelId(label),
        dst_id: TokenId(dst),
        is_deleted: false,
    }
}

/// A sentence relation between `(unit, boundary, token)` endpoints
pub fn create_sentence_relation(
    task: u64,
    src: (u64, u64, u64),
    label: u64,
    dst: (u64, u64, u64),
    relation_type: RelationType,
) -> SentenceRelation {
    SentenceRelation {
        task_id: Some(TaskId(task)),
        src_verse_id: UnitId(src.0),
        src_boundary_id: BoundaryId(src.1),
        src_token_id: TokenId(src.2),
        dst_verse_id: UnitId(dst.0),
        dst_boundary_id: BoundaryId(dst.1),
        dst_token_id: TokenId(dst.2),
        label_id: LabelId(label),
        relation_type,
        is_deleted: false,
    }
}

/// Unit used by the basic pool tests: boundary 1 ordered `[10, 11, 12]`
pub fn create_test_unit() -> UnitRecord {
    UnitBuilder::new(3)
        .sentence(1, &[(10, "rāmaḥ"), (11, "vanam"), (12, "gacchati")])
        .word_order(1, &[10, 11, 12])
        .build()
}

/// A page of `len` units with ids `1..=len`
///
/// Unit `u` has one sentence, boundary `u`, with tokens `10u`, `10u + 1`,
/// `10u + 2` ordered ascending.
pub fn create_test_page(len: u64) -> Vec<UnitRecord> {
    (1..=len)
        .map(|u| {
            let base = u * 10;
            let texts = [format!("w{u}a"), format!("w{u}b"), format!("w{u}c")];
            UnitBuilder::new(u)
                .sentence(
                    u,
                    &[
                        (base, texts[0].as_str()),
                        (base + 1, texts[1].as_str()),
                        (base + 2, texts[2].as_str()),
                    ],
                )
                .word_order(u, &[base, base + 1, base + 2])
                .build()
        })
        .collect()
}
