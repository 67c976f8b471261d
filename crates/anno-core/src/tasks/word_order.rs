//! Word-order task
//!
//! A thin task wrapper around [`TokenPoolManager`]: every edit goes through the
//! manager so the layout survives a reload, and an accepted submission clears
//! the stored keys of every boundary.

use super::{AnnotationTask, SetupContext};
use crate::error::TaskError;
use anno_model::{
    BoundaryId, PoolKey, SubmitForm, TaskCategory, TaskId, TokenButton, TokenId, UnitId,
    UnitRecord,
};
use anno_pool::{Inclusion, TokenPoolManager, UnitPools};
use tracing::info;

/// Token pools of a unit being ordered
#[derive(Debug, Clone)]
pub struct WordOrderTask {
    task_id: TaskId,
    unit: UnitRecord,
    manager: TokenPoolManager,
    pools: UnitPools,
}

impl WordOrderTask {
    /// Current layout
    #[inline]
    #[must_use]
    pub fn pools(&self) -> &UnitPools {
        &self.pools
    }

    /// Unit row the layout was built from
    #[inline]
    #[must_use]
    pub fn unit(&self) -> &UnitRecord {
        &self.unit
    }

    /// Rendered button of a unit token
    #[must_use]
    pub fn button(&self, token: TokenId) -> Option<TokenButton> {
        self.unit.token(token).map(TokenButton::render)
    }

    /// Rendered included tokens of a boundary, in order
    #[must_use]
    pub fn included_buttons(&self, boundary: BoundaryId) -> Vec<TokenButton> {
        self.pools
            .boundary(boundary)
            .map(|pool| pool.included().iter().filter_map(|id| self.button(*id)).collect())
            .unwrap_or_default()
    }

    /// Badge caption and style of a boundary
    #[must_use]
    pub fn badge(&self, boundary: BoundaryId) -> Option<(&'static str, &'static str)> {
        self.pools
            .boundary(boundary)?
            .state()
            .map(|state| (state.badge_text(), state.badge_style()))
    }

    /// Move a token between the included and excluded pools
    ///
    /// # Errors
    /// Fails when the boundary does not hold the token.
    pub fn toggle(&mut self, token: TokenId, boundary: BoundaryId) -> Result<Inclusion, TaskError> {
        Ok(self.manager.toggle_inclusion(&mut self.pools, token, boundary)?)
    }

    /// Move a manual token to a boundary or back to the extra pool
    ///
    /// # Errors
    /// Fails for tokens that are not manual and for unknown boundaries.
    pub fn move_extra(&mut self, token: TokenId, target: PoolKey) -> Result<(), TaskError> {
        Ok(self.manager.move_extra(&mut self.pools, token, target)?)
    }

    /// Record a dragged order
    ///
    /// # Errors
    /// Fails for unknown boundaries.
    pub fn reorder(
        &mut self,
        boundary: BoundaryId,
        order: &[TokenId],
    ) -> Result<Vec<TokenId>, TaskError> {
        Ok(self.manager.reorder(&mut self.pools, boundary, order)?)
    }

    /// Apply the server heuristic to a boundary
    ///
    /// # Errors
    /// Fails without a heuristic or after a manual reorder.
    pub fn apply_heuristic(&mut self, boundary: BoundaryId) -> Result<bool, TaskError> {
        Ok(self.manager.apply_heuristic(&mut self.pools, boundary)?)
    }

    /// Discard edits of a boundary
    ///
    /// # Errors
    /// Fails for unknown boundaries.
    pub fn reset(&mut self, boundary: BoundaryId) -> Result<(), TaskError> {
        Ok(self.manager.reset(&mut self.pools, &self.unit, boundary)?)
    }

    /// Lay the pools out again from a refreshed unit row
    pub(crate) fn rebuild(&mut self, unit: UnitRecord) {
        self.pools = self.manager.layout(&unit);
        self.unit = unit;
    }

    /// Put new tokens where the originals stood
    pub(crate) fn substitute(
        &mut self,
        originals: &[TokenId],
        replacements: &[TokenId],
    ) -> Result<BoundaryId, TaskError> {
        let boundary = self
            .manager
            .substitute(&mut self.pools, originals, replacements)?;
        info!(unit = %self.unit.id(), %boundary, ?originals, ?replacements, "substituted tokens");
        Ok(boundary)
    }
}

impl AnnotationTask for WordOrderTask {
    const CATEGORY: TaskCategory = TaskCategory::WordOrder;

    fn setup(ctx: &SetupContext<'_>) -> Result<Self, TaskError> {
        Ok(Self {
            task_id: ctx.task_id,
            unit: ctx.unit.clone(),
            manager: ctx.pools.clone(),
            pools: ctx.pools.layout(ctx.unit),
        })
    }

    fn task_id(&self) -> TaskId {
        self.task_id
    }

    fn unit_id(&self) -> UnitId {
        self.unit.id()
    }

    fn write_fields(&self, form: SubmitForm) -> Result<SubmitForm, TaskError> {
        Ok(form.with_json_field("word_order", &self.pools.word_order_payload())?)
    }

    fn on_submitted(&self) {
        self.manager.clear(&self.pools);
    }
}
