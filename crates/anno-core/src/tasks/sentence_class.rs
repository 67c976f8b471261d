//! Sentence classification task

use super::{header_text, ordered_sentences, AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_model::{BoundaryId, LabelId, SubmitForm, TaskCategory, TaskId, TaskScoped, UnitId};
use serde::Serialize;
use std::collections::BTreeMap;

/// One sentence and its label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceClassRow {
    /// Sentence
    pub boundary_id: BoundaryId,
    /// Rendered tokens joined by a space
    pub header_text: String,
    /// Chosen label
    pub label: Option<LabelId>,
}

#[derive(Debug, Serialize)]
struct SentenceClassEntry {
    boundary_id: BoundaryId,
    label_id: LabelId,
}

/// One label per sentence of the unit
#[derive(Debug, Clone)]
pub struct SentenceClassificationTask {
    task_id: TaskId,
    unit_id: UnitId,
    rows: Vec<SentenceClassRow>,
}

impl SentenceClassificationTask {
    /// Rows in boundary order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[SentenceClassRow] {
        &self.rows
    }

    /// Set or clear the label of a sentence
    ///
    /// # Errors
    /// Fails for boundaries that are not rows of the task.
    pub fn set_label(&mut self, boundary: BoundaryId, label: Option<LabelId>) -> Result<(), TaskError> {
        let row = self
            .rows
            .iter_mut()
            .find(|row| row.boundary_id == boundary)
            .ok_or(TaskError::UnknownBoundary(boundary))?;
        row.label = label;
        Ok(())
    }

    fn element_id(&self, boundary: BoundaryId) -> String {
        format!("sentence-classification-select-{}-{boundary}", self.task_id)
    }
}

impl AnnotationTask for SentenceClassificationTask {
    const CATEGORY: TaskCategory = TaskCategory::SentenceClassification;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let existing: BTreeMap<BoundaryId, LabelId> = ctx
            .unit
            .sentence_classification
            .iter()
            .filter(|record| record.is_live_for(ctx.task_id))
            .map(|record| (record.boundary_id, record.label_id))
            .collect();

        let rows = ordered_sentences(ctx.unit)?
            .into_iter()
            .map(|sentence| SentenceClassRow {
                boundary_id: sentence.boundary_id,
                header_text: header_text(sentence.tokens.iter().copied()),
                label: existing.get(&sentence.boundary_id).copied(),
            })
            .collect();

        Ok(Self {
            task_id: ctx.task_id,
            unit_id: ctx.unit.id(),
            rows,
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn validate(&self) -> Result<(), TaskError> {
        match self.rows.iter().find(|row| row.label.is_none()) {
            Some(row) => Err(TaskError::validation(
                self.element_id(row.boundary_id),
                "a label is required",
            )),
            None => Ok(()),
        }
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let data: Vec<SentenceClassEntry> = self
            .rows
            .iter()
            .filter_map(|row| {
                row.label.map(|label_id| SentenceClassEntry {
                    boundary_id: row.boundary_id,
                    label_id,
                })
            })
            .collect();
        Ok(form.with_json_field("sentence_classification_data", &data)?)
    }
}
