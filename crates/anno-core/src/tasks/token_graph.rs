//! Token graph task
//!
//! One triplet editor per sentence. Existing relations of the task fill the
//! rows; a sentence without any is seeded from the server heuristic.

use super::{header_text, ordered_sentences, AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_graph::{ArcDiagram, NodeLabel, RelationGraph, RelationGraphBuilder, Triplet};
use anno_model::{
    BoundaryId, LabelCatalog, LabelId, SubmitForm, TaskCategory, TaskId, TaskScoped, TokenButton,
    TokenId, TokenRelation, UnitId,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One triplet row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationRow {
    /// Entered triplet
    pub triplet: Triplet<TokenId, LabelId>,
    /// Seeded from the heuristic and not edited since
    pub is_heuristic: bool,
}

impl RelationRow {
    fn from_record(record: &TokenRelation, is_heuristic: bool) -> Self {
        Self {
            triplet: Triplet::new(record.src_id, record.label_id, record.dst_id),
            is_heuristic,
        }
    }

    fn empty() -> Self {
        Self {
            triplet: Triplet {
                source: None,
                label: None,
                target: None,
            },
            is_heuristic: false,
        }
    }
}

/// Triplet editor of one sentence
#[derive(Debug, Clone)]
pub struct BoundaryGraph {
    /// Sentence
    pub boundary_id: BoundaryId,
    /// Rendered tokens joined by a space
    pub header_text: String,
    /// Candidate endpoints in word order
    pub tokens: Vec<TokenButton>,
    /// Triplet rows
    pub rows: Vec<RelationRow>,
}

impl BoundaryGraph {
    fn offers(&self, token: TokenId) -> bool {
        self.tokens.iter().any(|button| button.token_id() == token)
    }

    fn render(&self, token: TokenId) -> Option<NodeLabel> {
        self.tokens
            .iter()
            .find(|button| button.token_id() == token)
            .map(NodeLabel::from)
    }

    fn triplets(&self) -> Vec<Triplet<TokenId, LabelId>> {
        self.rows.iter().map(|row| row.triplet.clone()).collect()
    }
}

#[derive(Debug, Serialize)]
struct RelationEntry {
    boundary_id: BoundaryId,
    src_id: TokenId,
    label_id: LabelId,
    dst_id: TokenId,
}

/// Labelled relations within each sentence
#[derive(Debug, Clone)]
pub struct TokenGraphTask {
    task_id: TaskId,
    unit_id: UnitId,
    builder: RelationGraphBuilder,
    labels: LabelCatalog,
    boundaries: Vec<BoundaryGraph>,
}

impl TokenGraphTask {
    /// Editors in boundary order
    #[inline]
    #[must_use]
    pub fn boundaries(&self) -> &[BoundaryGraph] {
        &self.boundaries
    }

    /// Editor of one sentence
    #[must_use]
    pub fn boundary(&self, id: BoundaryId) -> Option<&BoundaryGraph> {
        self.boundaries.iter().find(|graph| graph.boundary_id == id)
    }

    /// Append an empty row; returns its index
    ///
    /// # Errors
    /// Fails for unknown boundaries.
    pub fn add_row(&mut self, boundary: BoundaryId) -> Result<usize, TaskError> {
        let graph = self.boundary_mut(boundary)?;
        graph.rows.push(RelationRow::empty());
        Ok(graph.rows.len() - 1)
    }

    /// Set or clear the source of a row
    ///
    /// # Errors
    /// Fails for unknown boundaries, rows and tokens.
    pub fn set_source(
        &mut self,
        boundary: BoundaryId,
        row: usize,
        token: Option<TokenId>,
    ) -> Result<(), TaskError> {
        self.edit_endpoint(boundary, row, token, |triplet, token| triplet.source = token)
    }

    /// Set or clear the target of a row
    ///
    /// # Errors
    /// Fails for unknown boundaries, rows and tokens.
    pub fn set_target(
        &mut self,
        boundary: BoundaryId,
        row: usize,
        token: Option<TokenId>,
    ) -> Result<(), TaskError> {
        self.edit_endpoint(boundary, row, token, |triplet, token| triplet.target = token)
    }

    /// Set or clear the label of a row
    ///
    /// # Errors
    /// Fails for unknown boundaries and rows.
    pub fn set_label(
        &mut self,
        boundary: BoundaryId,
        row: usize,
        label: Option<LabelId>,
    ) -> Result<(), TaskError> {
        let row = Self::row_mut(self.boundary_mut(boundary)?, row)?;
        row.triplet.label = label;
        row.is_heuristic = false;
        Ok(())
    }

    /// Delete a row
    ///
    /// # Errors
    /// Fails for unknown boundaries and rows.
    pub fn remove_row(&mut self, boundary: BoundaryId, row: usize) -> Result<RelationRow, TaskError> {
        let graph = self.boundary_mut(boundary)?;
        if row >= graph.rows.len() {
            return Err(TaskError::UnknownRow(row));
        }
        Ok(graph.rows.remove(row))
    }

    /// Graph preview of a sentence
    #[must_use]
    pub fn graph(&self, boundary: BoundaryId) -> Option<RelationGraph> {
        let graph = self.boundary(boundary)?;
        Some(self.builder.build(
            &graph.triplets(),
            |token| graph.render(*token),
            |label| self.labels.caption(*label),
        ))
    }

    /// Arc diagram preview of a sentence
    #[must_use]
    pub fn arcs(&self, boundary: BoundaryId) -> Option<ArcDiagram> {
        let graph = self.boundary(boundary)?;
        let words: Vec<(TokenId, String)> = graph
            .tokens
            .iter()
            .map(|button| (button.token_id(), button.text().to_string()))
            .collect();
        Some(
            self.builder
                .build_arcs(&words, &graph.triplets(), |label| self.labels.caption(*label)),
        )
    }

    fn boundary_mut(&mut self, id: BoundaryId) -> Result<&mut BoundaryGraph, TaskError> {
        self.boundaries
            .iter_mut()
            .find(|graph| graph.boundary_id == id)
            .ok_or(TaskError::UnknownBoundary(id))
    }

    fn row_mut(graph: &mut BoundaryGraph, row: usize) -> Result<&mut RelationRow, TaskError> {
        graph.rows.get_mut(row).ok_or(TaskError::UnknownRow(row))
    }

    fn edit_endpoint(
        &mut self,
        boundary: BoundaryId,
        row: usize,
        token: Option<TokenId>,
        apply: impl FnOnce(&mut Triplet<TokenId, LabelId>, Option<TokenId>),
    ) -> Result<(), TaskError> {
        let graph = self.boundary_mut(boundary)?;
        if let Some(token) = token {
            if !graph.offers(token) {
                return Err(TaskError::UnknownToken(token));
            }
        }
        let row = Self::row_mut(graph, row)?;
        apply(&mut row.triplet, token);
        row.is_heuristic = false;
        Ok(())
    }
}

impl AnnotationTask for TokenGraphTask {
    const CATEGORY: TaskCategory = TaskCategory::TokenGraph;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let unit = ctx.unit;
        let mut existing: BTreeMap<BoundaryId, Vec<RelationRow>> = BTreeMap::new();
        for record in unit.token_graph.iter().filter(|r| r.is_live_for(ctx.task_id)) {
            existing
                .entry(record.boundary_id)
                .or_default()
                .push(RelationRow::from_record(record, false));
        }
        let mut heuristic: BTreeMap<BoundaryId, Vec<RelationRow>> = BTreeMap::new();
        for record in unit.heuristics.token_graph.iter().filter(|r| !r.is_deleted) {
            if !existing.contains_key(&record.boundary_id) {
                heuristic
                    .entry(record.boundary_id)
                    .or_default()
                    .push(RelationRow::from_record(record, true));
            }
        }

        let boundaries = ordered_sentences(unit)?
            .into_iter()
            .map(|sentence| {
                let rows = existing
                    .remove(&sentence.boundary_id)
                    .or_else(|| heuristic.remove(&sentence.boundary_id))
                    .unwrap_or_default();
                debug!(boundary = %sentence.boundary_id, rows = rows.len(), "token graph rows");
                BoundaryGraph {
                    boundary_id: sentence.boundary_id,
                    header_text: header_text(sentence.tokens.iter().copied()),
                    tokens: sentence.tokens.iter().map(|t| TokenButton::render(t)).collect(),
                    rows,
                }
            })
            .collect();

        Ok(Self {
            task_id: ctx.task_id,
            unit_id: unit.id(),
            builder: RelationGraphBuilder::new(ctx.config.node_identity),
            labels: ctx.config.relation_labels.clone(),
            boundaries,
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let data: Vec<RelationEntry> = self
            .boundaries
            .iter()
            .flat_map(|graph| {
                graph.rows.iter().filter_map(move |row| {
                    let (src_id, label_id, dst_id) = row.triplet.parts()?;
                    Some(RelationEntry {
                        boundary_id: graph.boundary_id,
                        src_id: *src_id,
                        label_id: *label_id,
                        dst_id: *dst_id,
                    })
                })
            })
            .collect();
        Ok(form.with_json_field("token_graph_data", &data)?)
    }
}
