//! Pool state of one unit

use crate::error::PoolError;
use crate::state::BoundaryState;
use anno_model::{boundary_element_id, token_element_id, BoundaryId, PoolKey, TokenId, UnitId};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Result of an inclusion toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    /// Token joined the ordered sentence
    Included,
    /// Token left the order and sits in the boundary's excluded pool
    Excluded,
    /// Manual token left the order and went back to the extra pool
    ReturnedToExtra,
}

/// Working pools of one boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryPool {
    boundary_id: BoundaryId,
    sentence_tokens: BTreeSet<TokenId>,
    pub(crate) included: Vec<TokenId>,
    pub(crate) excluded: Vec<TokenId>,
    pub(crate) heuristic: Option<Vec<TokenId>>,
    pub(crate) state: Option<BoundaryState>,
}

impl BoundaryPool {
    pub(crate) fn new(
        boundary_id: BoundaryId,
        sentence_tokens: BTreeSet<TokenId>,
        included: Vec<TokenId>,
        heuristic: Option<Vec<TokenId>>,
    ) -> Self {
        let excluded = sentence_tokens
            .iter()
            .filter(|id| !included.contains(id))
            .copied()
            .collect();
        Self {
            boundary_id,
            sentence_tokens,
            included,
            excluded,
            heuristic,
            state: None,
        }
    }

    /// Boundary id
    #[inline]
    #[must_use]
    pub fn boundary_id(&self) -> BoundaryId {
        self.boundary_id
    }

    /// Ordered tokens of the sentence
    #[inline]
    #[must_use]
    pub fn included(&self) -> &[TokenId] {
        &self.included
    }

    /// Sentence tokens toggled out of the order, by id
    #[inline]
    #[must_use]
    pub fn excluded(&self) -> &[TokenId] {
        &self.excluded
    }

    /// Server-suggested order, if any
    #[inline]
    #[must_use]
    pub fn heuristic(&self) -> Option<&[TokenId]> {
        self.heuristic.as_deref()
    }

    /// Current ordering state
    #[inline]
    #[must_use]
    pub fn state(&self) -> Option<BoundaryState> {
        self.state
    }

    /// Tokens that belong to this sentence in the corpus
    #[inline]
    #[must_use]
    pub fn sentence_tokens(&self) -> &BTreeSet<TokenId> {
        &self.sentence_tokens
    }

    /// Sentence tokens plus the extra tokens currently assigned here
    #[must_use]
    pub fn eligible(&self) -> BTreeSet<TokenId> {
        self.sentence_tokens
            .iter()
            .chain(self.included.iter())
            .copied()
            .collect()
    }

    /// Whether the token is included in the order
    #[must_use]
    pub fn includes(&self, token: TokenId) -> bool {
        self.included.contains(&token)
    }
}

/// Pool layout of a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPools {
    unit_id: UnitId,
    pub(crate) boundaries: BTreeMap<BoundaryId, BoundaryPool>,
    pub(crate) extra: Vec<TokenId>,
    manual: BTreeSet<TokenId>,
}

impl UnitPools {
    pub(crate) fn new(unit_id: UnitId, manual: BTreeSet<TokenId>) -> Self {
        Self {
            unit_id,
            boundaries: BTreeMap::new(),
            extra: Vec::new(),
            manual,
        }
    }

    /// Unit id
    #[inline]
    #[must_use]
    pub fn unit_id(&self) -> UnitId {
        self.unit_id
    }

    /// Pool of one boundary
    #[must_use]
    pub fn boundary(&self, id: BoundaryId) -> Option<&BoundaryPool> {
        self.boundaries.get(&id)
    }

    /// All boundary pools, ascending by id
    pub fn boundaries(&self) -> impl Iterator<Item = &BoundaryPool> {
        self.boundaries.values()
    }

    /// Boundary ids, ascending
    #[must_use]
    pub fn boundary_ids(&self) -> Vec<BoundaryId> {
        self.boundaries.keys().copied().collect()
    }

    /// Manual tokens not assigned to any sentence
    #[inline]
    #[must_use]
    pub fn extra(&self) -> &[TokenId] {
        &self.extra
    }

    /// Whether the token is a manually added token of this unit
    #[must_use]
    pub fn is_manual(&self, token: TokenId) -> bool {
        self.manual.contains(&token)
    }

    /// Pool currently holding an included or extra token
    #[must_use]
    pub fn owner_of(&self, token: TokenId) -> Option<PoolKey> {
        if self.extra.contains(&token) {
            return Some(PoolKey::Extra);
        }
        self.boundaries
            .values()
            .find(|pool| pool.includes(token) || pool.excluded.contains(&token))
            .map(|pool| PoolKey::Boundary(pool.boundary_id))
    }

    /// Word-order submission: `{"boundary-<id>": ["token-button-<id>", …]}`
    #[must_use]
    pub fn word_order_payload(&self) -> BTreeMap<String, Vec<String>> {
        self.boundaries
            .values()
            .map(|pool| {
                (
                    boundary_element_id(pool.boundary_id),
                    pool.included.iter().copied().map(token_element_id).collect(),
                )
            })
            .collect()
    }

    pub(crate) fn pool_mut(&mut self, id: BoundaryId) -> Result<&mut BoundaryPool, PoolError> {
        self.boundaries
            .get_mut(&id)
            .ok_or(PoolError::UnknownBoundary(id))
    }

    /// Move a token out of a boundary's order into the pool it falls back to
    pub(crate) fn release(&mut self, boundary: BoundaryId, token: TokenId) -> Option<Inclusion> {
        let is_manual = self.manual.contains(&token);
        let pool = self.boundaries.get_mut(&boundary)?;
        let position = pool.included.iter().position(|id| *id == token)?;
        pool.included.remove(position);
        if is_manual {
            insert_sorted(&mut self.extra, token);
            Some(Inclusion::ReturnedToExtra)
        } else {
            insert_sorted(&mut pool.excluded, token);
            Some(Inclusion::Excluded)
        }
    }

    /// Move every manual token of a boundary's order back to the extra pool
    pub(crate) fn return_manual(&mut self, boundary: BoundaryId) {
        let Some(pool) = self.boundaries.get_mut(&boundary) else {
            return;
        };
        let manual = &self.manual;
        let (returned, kept): (Vec<TokenId>, Vec<TokenId>) = std::mem::take(&mut pool.included)
            .into_iter()
            .partition(|id| manual.contains(id));
        pool.included = kept;
        for token in returned {
            insert_sorted(&mut self.extra, token);
        }
    }

    /// Replace the included order of a boundary
    ///
    /// Candidates are the currently included tokens plus the extra pool. All
    /// included tokens leave first, then the proposed ids that are candidates are
    /// re-included in the proposed order. Everything else is dropped.
    pub(crate) fn apply_order(
        &mut self,
        boundary: BoundaryId,
        proposed: &[TokenId],
    ) -> Result<(), PoolError> {
        self.place(boundary, proposed, false)
    }

    /// Replay a persisted order
    ///
    /// Like [`UnitPools::apply_order`], except that excluded sentence tokens are
    /// candidates too: the persisted order may re-include tokens the record
    /// order leaves out.
    pub(crate) fn replay_order(
        &mut self,
        boundary: BoundaryId,
        stored: &[TokenId],
    ) -> Result<(), PoolError> {
        self.place(boundary, stored, true)
    }

    fn place(
        &mut self,
        boundary: BoundaryId,
        proposed: &[TokenId],
        from_excluded: bool,
    ) -> Result<(), PoolError> {
        let pool = self
            .boundaries
            .get_mut(&boundary)
            .ok_or(PoolError::UnknownBoundary(boundary))?;

        let mut candidates: HashSet<TokenId> = pool.included.iter().copied().collect();
        if from_excluded {
            candidates.extend(pool.excluded.iter().copied());
        }
        candidates.extend(self.extra.iter().copied());

        for token in std::mem::take(&mut pool.included) {
            if self.manual.contains(&token) {
                insert_sorted(&mut self.extra, token);
            } else {
                insert_sorted(&mut pool.excluded, token);
            }
        }

        for &token in proposed {
            if !candidates.remove(&token) {
                tracing::debug!(%boundary, %token, "dropping token outside the pool");
                continue;
            }
            pool.excluded.retain(|id| *id != token);
            self.extra.retain(|id| *id != token);
            pool.included.push(token);
        }
        Ok(())
    }
}

/// Insert into an id-ordered pool, ignoring ids already present
pub(crate) fn insert_sorted(pool: &mut Vec<TokenId>, token: TokenId) {
    if let Err(position) = pool.binary_search(&token) {
        pool.insert(position, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(raw: &[u64]) -> Vec<TokenId> {
        raw.iter().copied().map(TokenId).collect()
    }

    fn pools() -> UnitPools {
        let mut pools = UnitPools::new(UnitId(3), ids(&[90, 91]).into_iter().collect());
        pools.boundaries.insert(
            BoundaryId(1),
            BoundaryPool::new(
                BoundaryId(1),
                ids(&[10, 11, 12]).into_iter().collect(),
                ids(&[10, 11, 12]),
                Some(ids(&[12, 10, 11])),
            ),
        );
        pools.extra = ids(&[90, 91]);
        pools
    }

    #[test]
    fn apply_order_takes_extra_tokens_and_drops_unknown() {
        let mut pools = pools();
        pools
            .apply_order(BoundaryId(1), &ids(&[90, 12, 10, 999, 12]))
            .unwrap();

        let pool = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(pool.included(), &ids(&[90, 12, 10])[..]);
        assert_eq!(pool.excluded(), &ids(&[11])[..]);
        assert_eq!(pools.extra(), &ids(&[91])[..]);
    }

    #[test]
    fn apply_order_returns_dropped_manual_tokens_to_extra() {
        let mut pools = pools();
        pools.apply_order(BoundaryId(1), &ids(&[90, 10])).unwrap();
        pools.apply_order(BoundaryId(1), &ids(&[10])).unwrap();

        let pool = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(pool.included(), &ids(&[10])[..]);
        assert!(pools.extra().contains(&TokenId(90)));
        assert!(!pool.excluded().contains(&TokenId(90)));
    }

    #[test]
    fn excluded_tokens_are_not_reorder_candidates() {
        let mut pools = pools();
        pools.release(BoundaryId(1), TokenId(11));
        pools.apply_order(BoundaryId(1), &ids(&[11, 12, 10])).unwrap();
        assert_eq!(
            pools.boundary(BoundaryId(1)).unwrap().included(),
            &ids(&[12, 10])[..]
        );
    }

    #[test]
    fn replayed_order_may_take_excluded_tokens() {
        let mut pools = pools();
        pools.release(BoundaryId(1), TokenId(11));
        pools.release(BoundaryId(1), TokenId(10));
        assert_eq!(pools.boundary(BoundaryId(1)).unwrap().excluded(), &ids(&[10, 11])[..]);

        pools.replay_order(BoundaryId(1), &ids(&[11, 12, 55])).unwrap();
        let pool = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(pool.included(), &ids(&[11, 12])[..]);
        assert_eq!(pool.excluded(), &ids(&[10])[..]);
    }

    #[test]
    fn returning_manual_tokens_keeps_sentence_tokens() {
        let mut pools = pools();
        pools.apply_order(BoundaryId(1), &ids(&[91, 10, 90])).unwrap();
        pools.return_manual(BoundaryId(1));
        assert_eq!(pools.boundary(BoundaryId(1)).unwrap().included(), &ids(&[10])[..]);
        assert_eq!(pools.extra(), &ids(&[90, 91])[..]);
    }

    #[test]
    fn payload_uses_element_ids() {
        let payload = pools().word_order_payload();
        assert_eq!(
            payload["boundary-1"],
            vec!["token-button-10", "token-button-11", "token-button-12"]
        );
    }

    #[test]
    fn owner_lookup() {
        let pools = pools();
        assert_eq!(pools.owner_of(TokenId(90)), Some(PoolKey::Extra));
        assert_eq!(pools.owner_of(TokenId(11)), Some(PoolKey::Boundary(BoundaryId(1))));
        assert_eq!(pools.owner_of(TokenId(5)), None);
    }
}
