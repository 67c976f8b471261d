//! Token text annotation and token classification
//!
//! Both tasks show one row per token of every sentence, in word order. A row
//! is submitted only while it is included; rows with an existing record of
//! the task start included.

use super::{header_text, ordered_sentences, AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_model::{
    BoundaryId, LabelId, SubmitForm, TaskCategory, TaskId, TaskScoped, TokenButton, TokenId,
    UnitId, UnitRecord,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Free-text row value
pub type TokenText = String;

/// Label row value
pub type TokenLabel = Option<LabelId>;

/// Values a row can hold
pub trait RowValue: Clone + Default + std::fmt::Debug {
    /// Whether the value satisfies a required input
    fn is_filled(&self) -> bool;
}

impl RowValue for TokenText {
    fn is_filled(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl RowValue for TokenLabel {
    fn is_filled(&self) -> bool {
        self.is_some()
    }
}

/// One token row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRow<V> {
    /// Sentence of the token
    pub boundary_id: BoundaryId,
    /// Token
    pub token_id: TokenId,
    /// Rendered token text
    pub text: String,
    /// Whether the row is submitted
    pub included: bool,
    /// Entered value
    pub value: V,
}

/// Rows of all sentences plus the sentence headers
#[derive(Debug, Clone, Default)]
pub struct TokenRows<V> {
    headers: Vec<(BoundaryId, String)>,
    rows: Vec<TokenRow<V>>,
}

impl<V: RowValue> TokenRows<V> {
    fn build(
        unit: &UnitRecord,
        existing: &HashMap<TokenId, V>,
    ) -> Result<Self, TaskError> {
        let mut out = Self {
            headers: Vec::new(),
            rows: Vec::new(),
        };
        for sentence in ordered_sentences(unit)? {
            out.headers.push((
                sentence.boundary_id,
                header_text(sentence.tokens.iter().copied()),
            ));
            for token in sentence.tokens {
                let value = existing.get(&token.id).cloned();
                out.rows.push(TokenRow {
                    boundary_id: sentence.boundary_id,
                    token_id: token.id,
                    text: TokenButton::render(token).text().to_string(),
                    included: value.is_some(),
                    value: value.unwrap_or_default(),
                });
            }
        }
        Ok(out)
    }

    /// Sentence headers in boundary order
    #[must_use]
    pub fn headers(&self) -> &[(BoundaryId, String)] {
        &self.headers
    }

    /// All rows
    #[must_use]
    pub fn rows(&self) -> &[TokenRow<V>] {
        &self.rows
    }

    /// Row of a token
    #[must_use]
    pub fn row(&self, token: TokenId) -> Option<&TokenRow<V>> {
        self.rows.iter().find(|row| row.token_id == token)
    }

    /// Included rows
    pub fn included(&self) -> impl Iterator<Item = &TokenRow<V>> {
        self.rows.iter().filter(|row| row.included)
    }

    /// Flip a row between included and excluded; returns the new flag
    ///
    /// # Errors
    /// Returns [`TaskError::UnknownToken`] for tokens without a row.
    pub fn toggle(&mut self, token: TokenId) -> Result<bool, TaskError> {
        let row = self.row_mut(token)?;
        row.included = !row.included;
        Ok(row.included)
    }

    /// Include every row
    pub fn include_all(&mut self) {
        self.rows.iter_mut().for_each(|row| row.included = true);
    }

    /// Exclude every row
    pub fn exclude_all(&mut self) {
        self.rows.iter_mut().for_each(|row| row.included = false);
    }

    /// Set the value of a row
    ///
    /// # Errors
    /// Returns [`TaskError::UnknownToken`] for tokens without a row.
    pub fn set(&mut self, token: TokenId, value: V) -> Result<(), TaskError> {
        self.row_mut(token)?.value = value;
        Ok(())
    }

    fn row_mut(&mut self, token: TokenId) -> Result<&mut TokenRow<V>, TaskError> {
        self.rows
            .iter_mut()
            .find(|row| row.token_id == token)
            .ok_or(TaskError::UnknownToken(token))
    }

    fn validate(&self, element: impl Fn(TokenId) -> String, reason: &str) -> Result<(), TaskError> {
        match self.included().find(|row| !row.value.is_filled()) {
            Some(row) => Err(TaskError::validation(element(row.token_id), reason)),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TextEntry<'a> {
    boundary_id: BoundaryId,
    text_annotation: &'a str,
}

#[derive(Debug, Serialize)]
struct LabelEntry {
    boundary_id: BoundaryId,
    label_id: LabelId,
}

/// Free text per token
#[derive(Debug, Clone)]
pub struct TokenTextAnnotationTask {
    task_id: TaskId,
    unit_id: UnitId,
    rows: TokenRows<TokenText>,
}

impl TokenTextAnnotationTask {
    /// Rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &TokenRows<TokenText> {
        &self.rows
    }

    /// Rows for editing
    #[inline]
    pub fn rows_mut(&mut self) -> &mut TokenRows<TokenText> {
        &mut self.rows
    }

    /// Set the text of a token
    ///
    /// # Errors
    /// Returns [`TaskError::UnknownToken`] for tokens without a row.
    pub fn set_text(&mut self, token: TokenId, text: impl Into<String>) -> Result<(), TaskError> {
        self.rows.set(token, text.into())
    }

    fn element_id(&self, token: TokenId) -> String {
        format!("token-text-annotation-input-{}-{token}", self.task_id)
    }
}

impl AnnotationTask for TokenTextAnnotationTask {
    const CATEGORY: TaskCategory = TaskCategory::TokenTextAnnotation;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let existing = ctx
            .unit
            .token_text_annotation
            .iter()
            .filter(|record| record.is_live_for(ctx.task_id))
            .map(|record| (record.token_id, record.text.clone()))
            .collect();
        Ok(Self {
            task_id: ctx.task_id,
            unit_id: ctx.unit.id(),
            rows: TokenRows::build(ctx.unit, &existing)?,
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn validate(&self) -> Result<(), TaskError> {
        self.rows
            .validate(|token| self.element_id(token), "text is required")
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let data: BTreeMap<String, TextEntry<'_>> = self
            .rows
            .included()
            .map(|row| {
                (
                    self.element_id(row.token_id),
                    TextEntry {
                        boundary_id: row.boundary_id,
                        text_annotation: &row.value,
                    },
                )
            })
            .collect();
        Ok(form.with_json_field("text_annotation_data", &data)?)
    }
}

/// Label per token
#[derive(Debug, Clone)]
pub struct TokenClassificationTask {
    task_id: TaskId,
    unit_id: UnitId,
    rows: TokenRows<TokenLabel>,
}

impl TokenClassificationTask {
    /// Rows
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &TokenRows<TokenLabel> {
        &self.rows
    }

    /// Rows for editing
    #[inline]
    pub fn rows_mut(&mut self) -> &mut TokenRows<TokenLabel> {
        &mut self.rows
    }

    /// Set or clear the label of a token
    ///
    /// # Errors
    /// Returns [`TaskError::UnknownToken`] for tokens without a row.
    pub fn set_label(&mut self, token: TokenId, label: Option<LabelId>) -> Result<(), TaskError> {
        self.rows.set(token, label)
    }

    fn element_id(&self, token: TokenId) -> String {
        format!("token-class-selector-{}-{token}", self.task_id)
    }
}

impl AnnotationTask for TokenClassificationTask {
    const CATEGORY: TaskCategory = TaskCategory::TokenClassification;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let existing = ctx
            .unit
            .token_classification
            .iter()
            .filter(|record| record.is_live_for(ctx.task_id))
            .map(|record| (record.token_id, Some(record.label_id)))
            .collect();
        Ok(Self {
            task_id: ctx.task_id,
            unit_id: ctx.unit.id(),
            rows: TokenRows::build(ctx.unit, &existing)?,
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn validate(&self) -> Result<(), TaskError> {
        self.rows
            .validate(|token| self.element_id(token), "label is required")
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let data: BTreeMap<String, LabelEntry> = self
            .rows
            .included()
            .filter_map(|row| {
                row.value.map(|label_id| {
                    (
                        self.element_id(row.token_id),
                        LabelEntry {
                            boundary_id: row.boundary_id,
                            label_id,
                        },
                    )
                })
            })
            .collect();
        Ok(form.with_json_field("token_classification_data", &data)?)
    }
}
