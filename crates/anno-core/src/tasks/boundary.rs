//! Sentence-boundary task
//!
//! The window is rendered as plain text with `##` after every sentence-ending
//! token. The annotator edits the focus unit's text by moving or adding `##`
//! markers; submission maps each marker back to the token printed before it.

use super::{AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_model::{SubmitForm, TaskCategory, TaskId, TokenId, UnitId, UnitRecord};
use std::cmp::Ordering;
use tracing::debug;

const MARKER: &str = "##";
const HIDDEN_TEXT: &str = "_";

/// Editable boundary text of a unit with read-only neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceBoundaryTask {
    task_id: TaskId,
    unit_id: UnitId,
    before: String,
    current: String,
    after: String,
    marker_positions: Vec<TokenId>,
}

impl SentenceBoundaryTask {
    /// Text of the units before the focus
    #[inline]
    #[must_use]
    pub fn before(&self) -> &str {
        &self.before
    }

    /// Editable text of the focus unit
    #[inline]
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Text of the units after the focus
    #[inline]
    #[must_use]
    pub fn after(&self) -> &str {
        &self.after
    }

    /// Token a marker resolves to, per printed word of the focus unit
    #[inline]
    #[must_use]
    pub fn marker_positions(&self) -> &[TokenId] {
        &self.marker_positions
    }

    /// Replace the editable text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.current = text.into();
    }

    /// Tokens followed by a marker in the current text
    ///
    /// The first word is the unit id. Every other word except a marker moves
    /// the cursor one printed token forward. Markers whose cursor falls outside
    /// the printed tokens are ignored.
    #[must_use]
    pub fn boundary_tokens(&self) -> Vec<TokenId> {
        let mut cursor: isize = -2;
        let mut boundaries = Vec::new();
        for word in self.current.split_whitespace() {
            if word != MARKER {
                cursor += 1;
                continue;
            }
            match usize::try_from(cursor)
                .ok()
                .and_then(|index| self.marker_positions.get(index))
            {
                Some(token) => boundaries.push(*token),
                None => debug!(cursor, "marker outside the printed tokens"),
            }
        }
        boundaries
    }
}

/// Render one unit; markers are recorded when `markers` is given
fn render_unit(unit: &UnitRecord, mut markers: Option<&mut Vec<TokenId>>) -> String {
    let boundary_tokens = unit.boundary_token_ids();
    let mut parts = vec![unit.id().to_string()];

    for (index, line) in unit.tokens.iter().enumerate() {
        parts.push("\t".to_string());
        for token in line.iter().filter(|token| !token.is_manual()) {
            let text = token.text.as_deref().unwrap_or_default();
            if text != HIDDEN_TEXT {
                if let Some(markers) = markers.as_deref_mut() {
                    markers.push(token.last_component_id());
                }
                parts.push(text.to_string());
            }
            if boundary_tokens.contains(&token.id) {
                parts.push(MARKER.to_string());
            }
        }
        if index + 1 < unit.tokens.len() {
            parts.push("\n".to_string());
        }
    }
    parts.join(" ")
}

impl AnnotationTask for SentenceBoundaryTask {
    const CATEGORY: TaskCategory = TaskCategory::SentenceBoundary;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        let window = ctx.window(ctx.config.boundary_window)?;
        let focus = window.focus().id();

        let mut before = Vec::new();
        let mut current = Vec::new();
        let mut after = Vec::new();
        let mut marker_positions = Vec::new();

        for unit in window.units() {
            match unit.id().cmp(&focus) {
                Ordering::Less => before.push(render_unit(unit, None)),
                Ordering::Equal => current.push(render_unit(unit, Some(&mut marker_positions))),
                Ordering::Greater => after.push(render_unit(unit, None)),
            }
        }

        Ok(Self {
            task_id: ctx.task_id,
            unit_id: focus,
            before: before.join("\n"),
            current: current.join("\n"),
            after: after.join("\n"),
            marker_positions,
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        let boundaries = self
            .boundary_tokens()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        Ok(form.with_field("boundaries", boundaries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use anno_pool::TokenPoolManager;
    use anno_store::StoreKeys;
    use anno_test_utils::{create_test_page, manual_token, setup_test_store, token, UnitBuilder};
    use pretty_assertions::assert_eq;

    fn setup(page: &[UnitRecord], focus: usize) -> SentenceBoundaryTask {
        let config = EngineConfig::new();
        let pools = TokenPoolManager::new(setup_test_store(), StoreKeys::default());
        SentenceBoundaryTask::setup(&SetupContext {
            task_id: TaskId(1),
            unit: &page[focus],
            page,
            config: &config,
            pools: &pools,
        })
        .unwrap()
    }

    #[test]
    fn renders_window_text() {
        let page = create_test_page(3);
        let task = setup(&page, 1);
        assert_eq!(task.before(), "1 \t w1a w1b w1c ##");
        assert_eq!(task.current(), "2 \t w2a w2b w2c ##");
        assert_eq!(task.after(), "3 \t w3a w3b w3c ##");
        assert_eq!(task.marker_positions(), &[TokenId(20), TokenId(21), TokenId(22)]);
    }

    #[test]
    fn first_unit_has_no_before_text() {
        let page = create_test_page(2);
        let task = setup(&page, 0);
        assert_eq!(task.before(), "");
        assert_eq!(task.after(), "2 \t w2a w2b w2c ##");
    }

    #[test]
    fn markers_resolve_to_preceding_tokens() {
        let page = create_test_page(1);
        let mut task = setup(&page, 0);
        task.set_text("1 \t w1a ## w1b w1c ##");
        assert_eq!(task.boundary_tokens(), vec![TokenId(10), TokenId(12)]);

        let form = task.to_form().unwrap();
        assert_eq!(form.field("boundaries"), Some("10,12"));
    }

    #[test]
    fn leading_marker_is_dropped() {
        let page = create_test_page(1);
        let mut task = setup(&page, 0);
        task.set_text("## 1 w1a w1b ## w1c ## ##");
        assert_eq!(task.boundary_tokens(), vec![TokenId(11), TokenId(12), TokenId(12)]);
        task.set_text("1 ##");
        assert!(task.boundary_tokens().is_empty());
    }

    #[test]
    fn composite_tokens_mark_their_last_component() {
        let unit = UnitBuilder::new(1)
            .line_tokens(vec![
                token(10, "rāmo").with_inner_id("1-2"),
                token(11, "_").with_inner_id("1"),
                token(12, "_").with_inner_id("2"),
                token(13, "gacchati").with_inner_id("3"),
                manual_token(90, "ca"),
            ])
            .new_line()
            .line_tokens(vec![token(14, "iti")])
            .build();
        let task = setup(&[unit], 0);
        assert_eq!(task.current(), "1 \t rāmo gacchati \n \t iti");
        assert_eq!(task.marker_positions(), &[TokenId(12), TokenId(13), TokenId(14)]);
    }
}
