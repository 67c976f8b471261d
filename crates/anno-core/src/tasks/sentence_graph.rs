//! Sentence graph task
//!
//! Labelled relations between tokens and whole sentences across the window.
//! Each window sentence offers its tokens plus one sentence endpoint shown as
//! `S-<boundary>` and addressed by the sentence's marker token. Both ends of
//! a relation must come from different sentences.

use super::connection::{context_boundaries, ConnectionPick, ContextBoundary};
use super::{AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_graph::{RelationGraphBuilder, SentenceEndpoint, SentenceGraph, Triplet};
use anno_model::{
    BoundaryId, LabelCatalog, LabelId, RelationType, SentenceRelation, SubmitForm, TaskCategory,
    TaskId, TokenId, UnitId,
};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// What the annotator clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentenceEndpointChoice {
    /// A token of a window sentence
    Token(TokenId),
    /// A whole window sentence
    Sentence(BoundaryId),
}

/// One relation row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceGraphRow {
    /// Source endpoint
    pub source: SentenceEndpoint,
    /// Target endpoint
    pub target: SentenceEndpoint,
    /// Relation label
    pub label: Option<LabelId>,
    /// Neither endpoint is in the focus unit; read-only here
    pub is_context: bool,
}

impl SentenceGraphRow {
    /// Relation type implied by the endpoints
    #[inline]
    #[must_use]
    pub fn relation_type(&self) -> RelationType {
        RelationType::classify(self.source.is_sentence, self.target.is_sentence)
    }
}

#[derive(Debug, Serialize)]
struct SentenceRelationEntry {
    src_boundary_id: BoundaryId,
    src_token_id: TokenId,
    label_id: LabelId,
    dst_boundary_id: BoundaryId,
    dst_token_id: TokenId,
    relation_type: RelationType,
}

/// Cross-sentence relation editor
#[derive(Debug, Clone)]
pub struct SentenceGraphTask {
    task_id: TaskId,
    unit_id: UnitId,
    builder: RelationGraphBuilder,
    labels: LabelCatalog,
    boundaries: Vec<ContextBoundary>,
    owners: HashMap<TokenId, BoundaryId>,
    rows: Vec<SentenceGraphRow>,
    pick: ConnectionPick<SentenceEndpoint>,
    pending_label: Option<LabelId>,
}

impl SentenceGraphTask {
    /// Offered sentences in window order
    #[inline]
    #[must_use]
    pub fn boundaries(&self) -> &[ContextBoundary] {
        &self.boundaries
    }

    /// Relation rows, newest first
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[SentenceGraphRow] {
        &self.rows
    }

    /// Current pick
    #[inline]
    #[must_use]
    pub fn pick(&self) -> &ConnectionPick<SentenceEndpoint> {
        &self.pick
    }

    /// Label the next confirmed row will carry
    #[inline]
    #[must_use]
    pub fn pending_label(&self) -> Option<LabelId> {
        self.pending_label
    }

    /// Pick a source, or a target once a source is set
    ///
    /// # Errors
    /// Fails for endpoints outside the window, for a target in the source's
    /// sentence and while a complete pick awaits confirmation.
    pub fn select(&mut self, choice: SentenceEndpointChoice) -> Result<(), TaskError> {
        let endpoint = self.resolve(choice)?;
        if let (Some(source), None) = (self.pick.source(), self.pick.target()) {
            if source.boundary_id == endpoint.boundary_id {
                return Err(TaskError::Selection(
                    "source and target must come from different sentences",
                ));
            }
        }
        self.pick.push(endpoint)
    }

    /// Choose the label of the next confirmed row
    pub fn set_pending_label(&mut self, label: Option<LabelId>) {
        self.pending_label = label;
    }

    /// Turn the pick into a new first row
    ///
    /// # Errors
    /// Fails unless both ends are picked.
    pub fn confirm(&mut self) -> Result<&SentenceGraphRow, TaskError> {
        let (source, target) = self.pick.take()?;
        let label = self.pending_label.take();
        debug!(%source, %target, ?label, "sentence relation added");
        self.rows.insert(
            0,
            SentenceGraphRow {
                source,
                target,
                label,
                is_context: false,
            },
        );
        Ok(&self.rows[0])
    }

    /// Drop the pick
    pub fn reset_selection(&mut self) {
        self.pick.clear();
    }

    /// Set or clear the label of a row
    ///
    /// # Errors
    /// Fails for unknown rows.
    pub fn set_row_label(&mut self, row: usize, label: Option<LabelId>) -> Result<(), TaskError> {
        let row = self.rows.get_mut(row).ok_or(TaskError::UnknownRow(row))?;
        row.label = label;
        Ok(())
    }

    /// Delete a row touching the focus unit
    ///
    /// # Errors
    /// Fails for unknown rows and for context rows.
    pub fn remove_row(&mut self, row: usize) -> Result<SentenceGraphRow, TaskError> {
        match self.rows.get(row) {
            None => Err(TaskError::UnknownRow(row)),
            Some(existing) if existing.is_context => Err(TaskError::ContextRow(row)),
            Some(_) => Ok(self.rows.remove(row)),
        }
    }

    /// Graph preview of every labelled row
    #[must_use]
    pub fn graph(&self) -> SentenceGraph {
        let triplets: Vec<Triplet<SentenceEndpoint, LabelId>> = self
            .rows
            .iter()
            .map(|row| Triplet {
                source: Some(row.source.clone()),
                label: row.label,
                target: Some(row.target.clone()),
            })
            .collect();
        self.builder
            .build_sentence_graph(&triplets, |label| self.labels.caption(*label))
    }

    fn resolve(&self, choice: SentenceEndpointChoice) -> Result<SentenceEndpoint, TaskError> {
        match choice {
            SentenceEndpointChoice::Token(token) => {
                let boundary = self
                    .owners
                    .get(&token)
                    .copied()
                    .ok_or(TaskError::UnknownToken(token))?;
                Ok(token_endpoint(&self.boundaries, boundary, token))
            }
            SentenceEndpointChoice::Sentence(boundary) => self
                .boundaries
                .iter()
                .find(|b| b.boundary_id == boundary)
                .and_then(|b| b.marker_token)
                .map(|marker| SentenceEndpoint::sentence(boundary, marker))
                .ok_or(TaskError::UnknownBoundary(boundary)),
        }
    }
}

fn token_endpoint(boundaries: &[ContextBoundary], boundary: BoundaryId, token: TokenId) -> SentenceEndpoint {
    let text = boundaries
        .iter()
        .find(|b| b.boundary_id == boundary)
        .and_then(|b| b.token_text(token))
        .map_or_else(|| token.to_string(), ToString::to_string);
    SentenceEndpoint::token(boundary, token, text)
}

fn existing_row(
    boundaries: &[ContextBoundary],
    record: &SentenceRelation,
    focus: UnitId,
) -> SentenceGraphRow {
    let kind = record.relation_type;
    let endpoint = |boundary, token, is_sentence| {
        if is_sentence {
            SentenceEndpoint::sentence(boundary, token)
        } else {
            token_endpoint(boundaries, boundary, token)
        }
    };
    SentenceGraphRow {
        source: endpoint(record.src_boundary_id, record.src_token_id, kind.source_is_sentence()),
        target: endpoint(record.dst_boundary_id, record.dst_token_id, kind.target_is_sentence()),
        label: Some(record.label_id),
        is_context: record.src_verse_id != focus && record.dst_verse_id != focus,
    }
}

impl AnnotationTask for SentenceGraphTask {
    const CATEGORY: TaskCategory = TaskCategory::SentenceGraph;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let window = ctx.window(ctx.config.sentence_graph_window)?;
        let focus = window.focus().id();
        let boundaries = context_boundaries(&window);

        let mut rows = Vec::new();
        for unit in window.units() {
            for record in window.visible_sentence_relations(&unit.sentence_graph, ctx.task_id) {
                rows.insert(0, existing_row(&boundaries, record, focus));
            }
        }
        debug!(unit = %focus, rows = rows.len(), "sentence graph rows");

        Ok(Self {
            task_id: ctx.task_id,
            unit_id: focus,
            builder: RelationGraphBuilder::new(ctx.config.node_identity),
            labels: ctx.config.relation_labels.clone(),
            owners: window.token_owners(),
            boundaries,
            rows,
            pick: ConnectionPick::default(),
            pending_label: None,
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn validate(&self) -> Result<(), TaskError> {
        match self.rows.iter().position(|row| row.label.is_none()) {
            Some(index) => Err(TaskError::validation(
                format!("sentence graph row {index}"),
                "a relation label is required",
            )),
            None => Ok(()),
        }
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let context: Vec<BoundaryId> = self.boundaries.iter().map(|b| b.boundary_id).collect();
        let data: Vec<SentenceRelationEntry> = self
            .rows
            .iter()
            .filter_map(|row| {
                Some(SentenceRelationEntry {
                    src_boundary_id: row.source.boundary_id,
                    src_token_id: row.source.token_id,
                    label_id: row.label?,
                    dst_boundary_id: row.target.boundary_id,
                    dst_token_id: row.target.token_id,
                    relation_type: row.relation_type(),
                })
            })
            .collect();
        Ok(form
            .with_json_field("context_data", &context)?
            .with_json_field("sentence_graph_data", &data)?)
    }
}
