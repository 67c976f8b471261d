//! Window slicing

use crate::error::WindowError;
use crate::window::ContextWindow;
use anno_model::{UnitId, UnitRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of neighbouring units on each side of the focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Units before the focus
    pub before: usize,
    /// Units after the focus
    pub after: usize,
}

impl WindowSpec {
    /// Create a window size
    #[inline]
    #[must_use]
    pub const fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }

    /// Only the focus unit
    #[inline]
    #[must_use]
    pub const fn focus_only() -> Self {
        Self::new(0, 0)
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self::new(3, 1)
    }
}

/// Builds context windows over a page of units in grid order
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextWindowAssembler;

impl ContextWindowAssembler {
    /// Create an assembler
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Window of `spec` units around `focus`, clamped to the page
    ///
    /// # Errors
    /// Returns [`WindowError::FocusNotLoaded`] when the focus unit is not on
    /// the page.
    pub fn build_window<'a>(
        &self,
        page: &'a [UnitRecord],
        focus: UnitId,
        spec: WindowSpec,
    ) -> Result<ContextWindow<'a>, WindowError> {
        let index = page
            .iter()
            .position(|unit| unit.id() == focus)
            .ok_or(WindowError::FocusNotLoaded(focus))?;
        Ok(self.window_at(page, index, spec))
    }

    /// Window around the unit at grid index `index`
    ///
    /// # Errors
    /// Returns [`WindowError::FocusNotLoaded`] when `index` is past the page.
    pub fn build_window_at<'a>(
        &self,
        page: &'a [UnitRecord],
        index: usize,
        spec: WindowSpec,
    ) -> Result<ContextWindow<'a>, WindowError> {
        if index >= page.len() {
            return Err(WindowError::FocusNotLoaded(UnitId(
                u64::try_from(index).unwrap_or(u64::MAX),
            )));
        }
        Ok(self.window_at(page, index, spec))
    }

    #[allow(clippy::unused_self)]
    fn window_at<'a>(&self, page: &'a [UnitRecord], index: usize, spec: WindowSpec) -> ContextWindow<'a> {
        let start = index.saturating_sub(spec.before);
        let end = index.saturating_add(spec.after).min(page.len() - 1);
        if index - start < spec.before || end - index < spec.after {
            debug!(
                focus = %page[index].id(),
                requested_before = spec.before,
                requested_after = spec.after,
                before = index - start,
                after = end - index,
                "window clamped at page edge"
            );
        }
        ContextWindow::new(&page[start..=end], index - start)
    }
}
