//! Token connection task
//!
//! Links tokens of the focus unit to tokens of the preceding units. The
//! window offers every ordered sentence; the annotator picks a source, then a
//! target, and confirms. Connections stored by a neighbouring unit are shown
//! read-only.

use super::{AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_model::{
    BoundaryId, SubmitForm, TaskCategory, TaskId, TokenButton, TokenConnection, TokenId, UnitId,
};
use anno_window::ContextWindow;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// One ordered sentence offered by a cross-unit task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBoundary {
    /// Sentence
    pub boundary_id: BoundaryId,
    /// Owning unit
    pub unit_id: UnitId,
    /// Whether the sentence belongs to the focus unit
    pub is_local: bool,
    /// Token that ends the sentence
    pub marker_token: Option<TokenId>,
    /// Tokens in word order
    pub tokens: Vec<TokenButton>,
}

impl ContextBoundary {
    /// Rendered text of a token of this sentence
    #[must_use]
    pub fn token_text(&self, token: TokenId) -> Option<&str> {
        self.tokens
            .iter()
            .find(|button| button.token_id() == token)
            .map(TokenButton::text)
    }
}

/// Ordered sentences of a window
pub(crate) fn context_boundaries(window: &ContextWindow<'_>) -> Vec<ContextBoundary> {
    window
        .ordered_boundaries()
        .map(|boundary| ContextBoundary {
            boundary_id: boundary.boundary_id(),
            unit_id: boundary.unit_id(),
            is_local: boundary.is_local(),
            marker_token: boundary.marker_token(),
            tokens: boundary
                .ordered_tokens()
                .into_iter()
                .map(TokenButton::render)
                .collect(),
        })
        .collect()
}

/// Source and target picked so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPick<E> {
    source: Option<E>,
    target: Option<E>,
}

impl<E> Default for ConnectionPick<E> {
    fn default() -> Self {
        Self {
            source: None,
            target: None,
        }
    }
}

impl<E: PartialEq> ConnectionPick<E> {
    /// Picked source
    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<&E> {
        self.source.as_ref()
    }

    /// Picked target
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&E> {
        self.target.as_ref()
    }

    /// Whether both ends are picked
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// Fill the next free end
    pub(crate) fn push(&mut self, endpoint: E) -> Result<(), TaskError> {
        match (&self.source, &self.target) {
            (None, _) => self.source = Some(endpoint),
            (Some(source), None) => {
                if *source == endpoint {
                    return Err(TaskError::Selection("endpoint is already picked"));
                }
                self.target = Some(endpoint);
            }
            (Some(_), Some(_)) => {
                return Err(TaskError::Selection(
                    "confirm or reset the current selection first",
                ))
            }
        }
        Ok(())
    }

    /// Take both ends, leaving the pick empty
    pub(crate) fn take(&mut self) -> Result<(E, E), TaskError> {
        if !self.is_complete() {
            return Err(TaskError::Selection("pick a source and a target first"));
        }
        match (self.source.take(), self.target.take()) {
            (Some(source), Some(target)) => Ok((source, target)),
            _ => Err(TaskError::Selection("pick a source and a target first")),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.source = None;
        self.target = None;
    }
}

/// One connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRow {
    /// Sentence owning the source token
    pub boundary_id: BoundaryId,
    /// Source token
    pub src_id: TokenId,
    /// Target token
    pub dst_id: TokenId,
    /// Stored by another unit; read-only here
    pub is_context: bool,
}

#[derive(Debug, Serialize)]
struct ConnectionEntry {
    boundary_id: BoundaryId,
    src_id: TokenId,
    dst_id: TokenId,
}

/// Cross-unit token links
#[derive(Debug, Clone)]
pub struct TokenConnectionTask {
    task_id: TaskId,
    unit_id: UnitId,
    boundaries: Vec<ContextBoundary>,
    owners: HashMap<TokenId, BoundaryId>,
    rows: Vec<ConnectionRow>,
    pick: ConnectionPick<TokenId>,
}

impl TokenConnectionTask {
    /// Offered sentences in window order
    #[inline]
    #[must_use]
    pub fn boundaries(&self) -> &[ContextBoundary] {
        &self.boundaries
    }

    /// Connections, newest first
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[ConnectionRow] {
        &self.rows
    }

    /// Current pick
    #[inline]
    #[must_use]
    pub fn pick(&self) -> &ConnectionPick<TokenId> {
        &self.pick
    }

    /// Pick a token as source, or as target once a source is set
    ///
    /// # Errors
    /// Fails for tokens outside the window, for the token already picked as
    /// source and while a complete pick awaits confirmation.
    pub fn select(&mut self, token: TokenId) -> Result<(), TaskError> {
        if !self.owners.contains_key(&token) {
            return Err(TaskError::UnknownToken(token));
        }
        self.pick.push(token)
    }

    /// Turn the pick into a new first row
    ///
    /// # Errors
    /// Fails unless both ends are picked.
    pub fn confirm(&mut self) -> Result<&ConnectionRow, TaskError> {
        let (src_id, dst_id) = self.pick.take()?;
        let boundary_id = self
            .owners
            .get(&src_id)
            .copied()
            .ok_or(TaskError::UnknownToken(src_id))?;
        debug!(%boundary_id, %src_id, %dst_id, "token connection added");
        self.rows.insert(
            0,
            ConnectionRow {
                boundary_id,
                src_id,
                dst_id,
                is_context: false,
            },
        );
        Ok(&self.rows[0])
    }

    /// Drop the pick
    pub fn reset_selection(&mut self) {
        self.pick.clear();
    }

    /// Delete a row of the focus unit
    ///
    /// # Errors
    /// Fails for unknown rows and for context rows.
    pub fn remove_row(&mut self, row: usize) -> Result<ConnectionRow, TaskError> {
        match self.rows.get(row) {
            None => Err(TaskError::UnknownRow(row)),
            Some(existing) if existing.is_context => Err(TaskError::ContextRow(row)),
            Some(_) => Ok(self.rows.remove(row)),
        }
    }

    fn existing_row(record: &TokenConnection, focus: UnitId) -> ConnectionRow {
        ConnectionRow {
            boundary_id: record.boundary_id,
            src_id: record.src_id,
            dst_id: record.dst_id,
            is_context: record.verse_id != focus,
        }
    }
}

impl AnnotationTask for TokenConnectionTask {
    const CATEGORY: TaskCategory = TaskCategory::TokenConnection;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let window = ctx.window(ctx.config.connection_window)?;
        let focus = window.focus().id();

        let mut rows = Vec::new();
        for unit in window.units() {
            for record in window.visible_connections(&unit.token_connection, ctx.task_id) {
                rows.insert(0, Self::existing_row(record, focus));
            }
        }
        debug!(unit = %focus, rows = rows.len(), "token connection rows");

        Ok(Self {
            task_id: ctx.task_id,
            unit_id: focus,
            boundaries: context_boundaries(&window),
            owners: window.token_owners(),
            rows,
            pick: ConnectionPick::default(),
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let context: Vec<BoundaryId> = self.boundaries.iter().map(|b| b.boundary_id).collect();
        let data: Vec<ConnectionEntry> = self
            .rows
            .iter()
            .map(|row| ConnectionEntry {
                boundary_id: row.boundary_id,
                src_id: row.src_id,
                dst_id: row.dst_id,
            })
            .collect();
        Ok(form
            .with_json_field("context_data", &context)?
            .with_json_field("token_connection_data", &data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use anno_model::UnitRecord;
    use anno_pool::TokenPoolManager;
    use anno_store::StoreKeys;
    use anno_test_utils::{create_test_page, setup_test_store, UnitBuilder};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn page() -> Vec<UnitRecord> {
        let mut page = create_test_page(3);
        page[0] = UnitBuilder::from_record(page[0].clone())
            .connection(5, 1, 1, 10, 11)
            .build();
        page[2] = UnitBuilder::from_record(page[2].clone())
            .connection(5, 3, 3, 30, 20)
            .connection(5, 3, 3, 31, 99)
            .connection(6, 3, 3, 31, 10)
            .build();
        page
    }

    fn setup(page: &[UnitRecord], focus: usize) -> TokenConnectionTask {
        let config = EngineConfig::new();
        let pools = TokenPoolManager::new(setup_test_store(), StoreKeys::default());
        TokenConnectionTask::setup(&SetupContext {
            task_id: TaskId(5),
            unit: &page[focus],
            page,
            config: &config,
            pools: &pools,
        })
        .unwrap()
    }

    #[test]
    fn existing_connections_are_listed_newest_first() {
        let page = page();
        let mut task = setup(&page, 2);

        assert_eq!(
            task.rows(),
            &[
                ConnectionRow {
                    boundary_id: BoundaryId(3),
                    src_id: TokenId(30),
                    dst_id: TokenId(20),
                    is_context: false,
                },
                ConnectionRow {
                    boundary_id: BoundaryId(1),
                    src_id: TokenId(10),
                    dst_id: TokenId(11),
                    is_context: true,
                },
            ]
        );
        assert!(matches!(task.remove_row(1), Err(TaskError::ContextRow(1))));
        assert!(matches!(task.remove_row(7), Err(TaskError::UnknownRow(7))));
        assert_eq!(task.remove_row(0).unwrap().src_id, TokenId(30));
    }

    #[test]
    fn pick_source_then_target_then_confirm() {
        let page = page();
        let mut task = setup(&page, 2);

        task.select(TokenId(31)).unwrap();
        assert!(matches!(task.select(TokenId(31)), Err(TaskError::Selection(_))));
        task.select(TokenId(12)).unwrap();
        assert!(matches!(task.select(TokenId(22)), Err(TaskError::Selection(_))));
        assert!(matches!(task.select(TokenId(99)), Err(TaskError::UnknownToken(_))));

        let row = task.confirm().unwrap().clone();
        assert_eq!(row.boundary_id, BoundaryId(3));
        assert_eq!((row.src_id, row.dst_id), (TokenId(31), TokenId(12)));
        assert_eq!(task.rows().len(), 3);
        assert!(task.pick().source().is_none());
        assert!(matches!(task.confirm(), Err(TaskError::Selection(_))));

        task.select(TokenId(20)).unwrap();
        task.reset_selection();
        assert!(!task.pick().is_complete());
        assert!(task.pick().source().is_none());
    }

    #[test]
    fn form_lists_window_and_every_row() {
        let page = page();
        let task = setup(&page, 2);
        let form = task.to_form().unwrap();

        assert_eq!(form.field("context_data"), Some("[1,2,3]"));
        let data: Value = serde_json::from_str(form.field("token_connection_data").unwrap()).unwrap();
        assert_eq!(
            data,
            json!([
                {"boundary_id": 3, "src_id": 30, "dst_id": 20},
                {"boundary_id": 1, "src_id": 10, "dst_id": 11}
            ])
        );
    }

    #[test]
    fn window_stops_at_the_focus_unit() {
        let page = page();
        let task = setup(&page, 0);
        let ids: Vec<BoundaryId> = task.boundaries().iter().map(|b| b.boundary_id).collect();
        assert_eq!(ids, vec![BoundaryId(1)]);
        assert!(task.boundaries()[0].is_local);
        assert_eq!(task.boundaries()[0].token_text(TokenId(11)), Some("w1b"));
        assert_eq!(task.rows().len(), 1);
        assert!(!task.rows()[0].is_context);
    }
}
