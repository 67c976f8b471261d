//! Token pool manager
//!
//! Builds [`UnitPools`] from a unit record and applies annotator edits to them,
//! writing every change through the state store:
//! - Layout from stored, annotated, heuristic or default orders
//! - Inclusion toggles and extra-pool moves
//! - Reordering and heuristic application
//! - Token substitution after merge/split actions

use crate::error::PoolError;
use crate::heuristic::suggest_word_order;
use crate::pools::{insert_sorted, BoundaryPool, Inclusion, UnitPools};
use crate::state::{validate_transition, BoundaryState};
use anno_model::{BoundaryId, PoolKey, TokenId, UnitRecord};
use anno_store::{StateStore, StoreKeys};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds and edits token pools, persisting them through a [`StateStore`]
#[derive(Debug, Clone)]
pub struct TokenPoolManager {
    store: Arc<dyn StateStore>,
    keys: StoreKeys,
}

impl TokenPoolManager {
    /// Create a manager over `store`
    #[inline]
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, keys: StoreKeys) -> Self {
        Self { store, keys }
    }

    /// Key scheme in use
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Lay out the pools of a unit
    ///
    /// Each boundary starts from its annotated order, falling back to the server
    /// heuristic and then to [`suggest_word_order`]. Tokens outside the sentence
    /// and the extra pool are dropped; an extra token claimed by several
    /// boundaries stays with the first. Stored state is then replayed: a stored
    /// order replaces the included order and may take back excluded sentence
    /// tokens, and a boundary in `Heuristic` state gets the heuristic order.
    #[must_use]
    pub fn layout(&self, unit: &UnitRecord) -> UnitPools {
        let sentence_ids: Vec<BoundaryId> = unit.sentence_ids().collect();
        let all_sentence_tokens: BTreeSet<TokenId> = sentence_ids
            .iter()
            .flat_map(|id| unit.sentence_token_ids(*id))
            .collect();
        let manual: BTreeSet<TokenId> = unit
            .extra_token_ids()
            .into_iter()
            .filter(|id| !all_sentence_tokens.contains(id))
            .collect();

        let mut pools = UnitPools::new(unit.id(), manual.clone());
        let mut claimed: HashSet<TokenId> = HashSet::new();

        for boundary in sentence_ids {
            let sentence_tokens: BTreeSet<TokenId> =
                unit.sentence_token_ids(boundary).into_iter().collect();
            let order = unit
                .word_order(boundary)
                .or_else(|| unit.heuristic_word_order(boundary))
                .map_or_else(
                    || {
                        warn!(unit = %unit.id(), %boundary, "no word order, using default heuristic");
                        unit.sentence(boundary)
                            .map(suggest_word_order)
                            .unwrap_or_default()
                    },
                    <[TokenId]>::to_vec,
                );

            let mut seen = HashSet::new();
            let included: Vec<TokenId> = order
                .into_iter()
                .filter(|id| {
                    let known = sentence_tokens.contains(id)
                        || (manual.contains(id) && !claimed.contains(id));
                    if !known {
                        debug!(%boundary, token = %id, "word order references a token outside the pool");
                    }
                    known && seen.insert(*id)
                })
                .collect();
            claimed.extend(included.iter().filter(|id| manual.contains(id)));

            let heuristic = unit.heuristic_word_order(boundary).map(<[TokenId]>::to_vec);
            pools.boundaries.insert(
                boundary,
                BoundaryPool::new(boundary, sentence_tokens, included, heuristic),
            );
        }

        pools.extra = manual.into_iter().filter(|id| !claimed.contains(id)).collect();

        let stored: BTreeMap<BoundaryId, Vec<TokenId>> = pools
            .boundary_ids()
            .into_iter()
            .filter_map(|boundary| {
                self.store
                    .get(&self.keys.word_order(boundary))
                    .map(|order| (boundary, StoreKeys::decode_order(&order)))
            })
            .collect();
        // Stored orders own their manual tokens; free them before any replay
        for boundary in stored.keys() {
            pools.return_manual(*boundary);
        }
        for boundary in pools.boundary_ids() {
            self.restore(&mut pools, boundary, stored.get(&boundary).map(Vec::as_slice));
        }
        pools
    }

    fn restore(&self, pools: &mut UnitPools, boundary: BoundaryId, stored: Option<&[TokenId]>) {
        let state_key = self.keys.state(boundary);
        let heuristic = pools
            .boundary(boundary)
            .and_then(|pool| pool.heuristic().map(<[TokenId]>::to_vec));

        if let Some(order) = &heuristic {
            self.store
                .set(&self.keys.heuristic(boundary), StoreKeys::encode_order(order));
            if self.store.get(&state_key).is_none() {
                self.store.set(
                    &state_key,
                    BoundaryState::TokenDecision.as_stored().to_string(),
                );
            }
        }

        let state = self
            .store
            .get(&state_key)
            .and_then(|stored| BoundaryState::from_stored(&stored));

        if let Some(order) = stored {
            if let Err(err) = pools.replay_order(boundary, order) {
                warn!(%boundary, %err, "stored word order could not be restored");
            }
        }
        if state == Some(BoundaryState::Heuristic) {
            if let Some(order) = &heuristic {
                if let Err(err) = pools.apply_order(boundary, order) {
                    warn!(%boundary, %err, "heuristic word order could not be restored");
                }
            }
        }
        if let Ok(pool) = pools.pool_mut(boundary) {
            pool.state = state;
        }
    }

    /// Move a token between the included and excluded pools of a boundary
    ///
    /// Manual tokens leaving the order go back to the extra pool.
    ///
    /// # Errors
    /// Fails for unknown boundaries and for tokens the boundary does not hold.
    pub fn toggle_inclusion(
        &self,
        pools: &mut UnitPools,
        token: TokenId,
        boundary: BoundaryId,
    ) -> Result<Inclusion, PoolError> {
        let pool = pools.pool_mut(boundary)?;
        let outcome = if pool.includes(token) {
            pools
                .release(boundary, token)
                .ok_or(PoolError::TokenNotInBoundary { token, boundary })?
        } else if let Some(position) = pool.excluded.iter().position(|id| *id == token) {
            pool.excluded.remove(position);
            pool.included.push(token);
            Inclusion::Included
        } else {
            return Err(PoolError::TokenNotInBoundary { token, boundary });
        };
        debug!(%boundary, %token, ?outcome, "toggled inclusion");
        self.mark_sorted(pools, boundary)?;
        Ok(outcome)
    }

    /// Move a manual token to a boundary or back to the extra pool
    ///
    /// A manual token is used by at most one boundary: moving it to another
    /// boundary takes it out of the previous one.
    ///
    /// # Errors
    /// Fails for tokens that are not manual or not part of this unit, and for
    /// unknown boundaries.
    pub fn move_extra(
        &self,
        pools: &mut UnitPools,
        token: TokenId,
        target: PoolKey,
    ) -> Result<(), PoolError> {
        if !pools.is_manual(token) {
            return Err(PoolError::NotManual(token));
        }
        if let PoolKey::Boundary(id) = target {
            pools.pool_mut(id)?;
        }
        let source = pools.owner_of(token).ok_or(PoolError::NotManual(token))?;
        if source == target {
            return Ok(());
        }

        if let PoolKey::Boundary(previous) = source {
            pools.release(previous, token);
            self.mark_sorted(pools, previous)?;
        }
        if let PoolKey::Boundary(next) = target {
            pools.extra.retain(|id| *id != token);
            pools.pool_mut(next)?.included.push(token);
            self.mark_sorted(pools, next)?;
        }
        debug!(%token, %source, %target, "moved manual token");
        Ok(())
    }

    /// Record a new included order for a boundary
    ///
    /// Ids outside the boundary's included pool and the extra pool are dropped.
    ///
    /// # Errors
    /// Fails for unknown boundaries.
    pub fn reorder(
        &self,
        pools: &mut UnitPools,
        boundary: BoundaryId,
        order: &[TokenId],
    ) -> Result<Vec<TokenId>, PoolError> {
        pools.apply_order(boundary, order)?;
        self.mark_sorted(pools, boundary)?;
        Ok(pools.pool_mut(boundary)?.included.clone())
    }

    /// Replace the included order with the heuristic order
    ///
    /// Returns `false` when the heuristic is already applied and unmodified.
    ///
    /// # Errors
    /// Fails when the boundary has no heuristic or was reordered by hand.
    pub fn apply_heuristic(
        &self,
        pools: &mut UnitPools,
        boundary: BoundaryId,
    ) -> Result<bool, PoolError> {
        let pool = pools.pool_mut(boundary)?;
        let order = pool
            .heuristic
            .clone()
            .ok_or(PoolError::NoHeuristic(boundary))?;
        if pool.state == Some(BoundaryState::Heuristic) {
            return Ok(false);
        }
        validate_transition(pool.state, BoundaryState::Heuristic)?;

        pools.apply_order(boundary, &order)?;
        self.set_state(pools, boundary, BoundaryState::Heuristic)?;
        info!(unit = %pools.unit_id(), %boundary, "applied heuristic word order");
        Ok(true)
    }

    /// Forget stored state for a boundary and lay it out again from the record
    ///
    /// # Errors
    /// Fails when the boundary is not part of the unit.
    pub fn reset(
        &self,
        pools: &mut UnitPools,
        unit: &UnitRecord,
        boundary: BoundaryId,
    ) -> Result<(), PoolError> {
        pools.pool_mut(boundary)?;
        self.clear_boundaries(&[boundary]);

        let mut fresh = self.layout(unit);
        let pool = fresh
            .boundaries
            .remove(&boundary)
            .ok_or(PoolError::UnknownBoundary(boundary))?;

        // Manual tokens the fresh layout assigns here leave the shared pool and
        // any other boundary holding them
        pools.extra.retain(|id| !pool.includes(*id));
        let claimed: Vec<TokenId> = pool
            .included()
            .iter()
            .copied()
            .filter(|id| pools.is_manual(*id))
            .collect();
        for id in claimed {
            let holder = pools
                .boundaries()
                .find(|other| other.boundary_id() != boundary && other.includes(id))
                .map(BoundaryPool::boundary_id);
            if let Some(holder) = holder {
                pools.release(holder, id);
                pools.extra.retain(|extra| *extra != id);
                self.mark_sorted(pools, holder)?;
                debug!(%boundary, %holder, token = %id, "reset took back a manual token");
            }
        }
        if let Some(previous) = pools.boundaries.insert(boundary, pool) {
            for id in previous.included() {
                if pools.is_manual(*id) && pools.owner_of(*id).is_none() {
                    insert_sorted(&mut pools.extra, *id);
                }
            }
        }
        info!(unit = %pools.unit_id(), %boundary, "reset boundary pool");
        Ok(())
    }

    /// Put `replacements` where the first of `originals` stood and take the originals out
    ///
    /// Used after a merge or split: the new tokens arrive in the extra pool and
    /// take over the position of the token they replace.
    ///
    /// # Errors
    /// Fails when `originals` is empty or its first token is not included anywhere.
    pub fn substitute(
        &self,
        pools: &mut UnitPools,
        originals: &[TokenId],
        replacements: &[TokenId],
    ) -> Result<BoundaryId, PoolError> {
        let first = originals.first().copied().ok_or(PoolError::NothingToReplace)?;
        let boundary = pools
            .boundaries()
            .find(|pool| pool.includes(first))
            .map(BoundaryPool::boundary_id)
            .ok_or(PoolError::NotIncluded(first))?;

        let fresh: Vec<TokenId> = replacements
            .iter()
            .copied()
            .filter(|id| pools.extra.contains(id))
            .collect();
        pools.extra.retain(|id| !fresh.contains(id));
        {
            let pool = pools.pool_mut(boundary)?;
            let position = pool
                .included
                .iter()
                .position(|id| *id == first)
                .map_or(pool.included.len(), |p| p + 1);
            pool.included.splice(position..position, fresh);
        }

        let mut touched = BTreeSet::from([boundary]);
        for original in originals {
            let owner = pools
                .boundaries()
                .find(|pool| pool.includes(*original))
                .map(BoundaryPool::boundary_id);
            if let Some(owner) = owner {
                pools.release(owner, *original);
                touched.insert(owner);
            }
        }
        for id in touched {
            self.mark_sorted(pools, id)?;
        }
        Ok(boundary)
    }

    /// Remove every stored key of the unit's boundaries
    pub fn clear(&self, pools: &UnitPools) {
        self.clear_boundaries(&pools.boundary_ids());
    }

    /// Remove every stored key of the given boundaries
    pub fn clear_boundaries(&self, boundaries: &[BoundaryId]) {
        for boundary in boundaries {
            for key in self.keys.all(*boundary) {
                self.store.remove(&key);
            }
        }
        debug!(count = boundaries.len(), "cleared boundary state");
    }

    fn mark_sorted(&self, pools: &mut UnitPools, boundary: BoundaryId) -> Result<(), PoolError> {
        self.set_state(pools, boundary, BoundaryState::Sort)
    }

    fn set_state(
        &self,
        pools: &mut UnitPools,
        boundary: BoundaryId,
        state: BoundaryState,
    ) -> Result<(), PoolError> {
        let pool = pools.pool_mut(boundary)?;
        validate_transition(pool.state, state)?;
        pool.state = Some(state);
        self.store.set(
            &self.keys.word_order(boundary),
            StoreKeys::encode_order(&pool.included),
        );
        self.store
            .set(&self.keys.state(boundary), state.as_stored().to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_store::MemoryStore;
    use anno_test_utils::{manual_token, UnitBuilder};
    use pretty_assertions::assert_eq;

    fn ids(raw: &[u64]) -> Vec<TokenId> {
        raw.iter().copied().map(TokenId).collect()
    }

    fn manager() -> (Arc<MemoryStore>, TokenPoolManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = TokenPoolManager::new(store.clone(), StoreKeys::default());
        (store, manager)
    }

    fn unit() -> UnitRecord {
        UnitBuilder::new(3)
            .sentence(1, &[(10, "rāmaḥ"), (11, "vanam"), (12, "gacchati")])
            .word_order(1, &[10, 11, 12])
            .sentence(2, &[(13, "sītā"), (14, "api")])
            .word_order(2, &[14, 13])
            .heuristic(2, &[13, 14])
            .extra(manual_token(90, "ca"))
            .extra(manual_token(91, "eva"))
            .build()
    }

    #[test]
    fn layout_starts_from_word_order() {
        let (store, manager) = manager();
        let pools = manager.layout(&unit());

        let first = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(first.included(), &ids(&[10, 11, 12])[..]);
        assert!(first.excluded().is_empty());
        assert_eq!(first.state(), None);
        assert_eq!(pools.extra(), &ids(&[90, 91])[..]);

        let second = pools.boundary(BoundaryId(2)).unwrap();
        assert_eq!(second.state(), Some(BoundaryState::TokenDecision));
        assert_eq!(
            store.get("boundary_heuristic_word_order_boundary-2").as_deref(),
            Some("13,14")
        );
    }

    #[test]
    fn layout_keeps_used_extra_tokens_out_of_the_extra_pool() {
        let (_, manager) = manager();
        let unit = UnitBuilder::new(3)
            .sentence(1, &[(10, "a"), (11, "b")])
            .word_order(1, &[10, 90, 11, 77])
            .sentence(2, &[(12, "c")])
            .word_order(2, &[90, 12])
            .extra(manual_token(90, "ca"))
            .build();
        let pools = manager.layout(&unit);

        assert_eq!(pools.boundary(BoundaryId(1)).unwrap().included(), &ids(&[10, 90, 11])[..]);
        assert_eq!(pools.boundary(BoundaryId(2)).unwrap().included(), &ids(&[12])[..]);
        assert!(pools.extra().is_empty());
    }

    #[test]
    fn layout_replays_stored_order() {
        let (store, manager) = manager();
        store.set("boundary_word_order_boundary-1", "token-button-12,10,55".to_string());
        store.set("boundary_state_boundary-1", "boundary_status_sort".to_string());

        let pools = manager.layout(&unit());
        let pool = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(pool.included(), &ids(&[12, 10])[..]);
        assert_eq!(pool.excluded(), &ids(&[11])[..]);
        assert_eq!(pool.state(), Some(BoundaryState::Sort));
    }

    #[test]
    fn layout_replays_heuristic_state() {
        let (store, manager) = manager();
        store.set("boundary_state_boundary-2", "boundary_status_heuristic".to_string());
        let pools = manager.layout(&unit());
        assert_eq!(
            pools.boundary(BoundaryId(2)).unwrap().included(),
            &ids(&[13, 14])[..]
        );
    }

    #[test]
    fn toggle_then_reorder() {
        let (store, manager) = manager();
        let mut pools = manager.layout(&unit());

        let outcome = manager
            .toggle_inclusion(&mut pools, TokenId(11), BoundaryId(1))
            .unwrap();
        assert_eq!(outcome, Inclusion::Excluded);

        let included = manager
            .reorder(&mut pools, BoundaryId(1), &ids(&[10, 12]))
            .unwrap();
        assert_eq!(included, ids(&[10, 12]));

        let pool = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(pool.state(), Some(BoundaryState::Sort));
        assert_eq!(
            store.get("boundary_word_order_boundary-1").as_deref(),
            Some("10,12")
        );
        assert_eq!(
            store.get("boundary_state_boundary-1").as_deref(),
            Some("boundary_status_sort")
        );
    }

    #[test]
    fn toggle_back_in_appends() {
        let (_, manager) = manager();
        let mut pools = manager.layout(&unit());
        manager.toggle_inclusion(&mut pools, TokenId(10), BoundaryId(1)).unwrap();
        let outcome = manager
            .toggle_inclusion(&mut pools, TokenId(10), BoundaryId(1))
            .unwrap();
        assert_eq!(outcome, Inclusion::Included);
        assert_eq!(
            pools.boundary(BoundaryId(1)).unwrap().included(),
            &ids(&[11, 12, 10])[..]
        );
    }

    #[test]
    fn toggle_rejects_foreign_tokens() {
        let (_, manager) = manager();
        let mut pools = manager.layout(&unit());
        assert_eq!(
            manager.toggle_inclusion(&mut pools, TokenId(13), BoundaryId(1)),
            Err(PoolError::TokenNotInBoundary {
                token: TokenId(13),
                boundary: BoundaryId(1)
            })
        );
    }

    #[test]
    fn manual_token_moves_between_boundaries() {
        let (_, manager) = manager();
        let mut pools = manager.layout(&unit());

        manager
            .move_extra(&mut pools, TokenId(90), PoolKey::Boundary(BoundaryId(1)))
            .unwrap();
        assert!(pools.boundary(BoundaryId(1)).unwrap().includes(TokenId(90)));
        assert_eq!(pools.extra(), &ids(&[91])[..]);

        manager
            .move_extra(&mut pools, TokenId(90), PoolKey::Boundary(BoundaryId(2)))
            .unwrap();
        assert!(!pools.boundary(BoundaryId(1)).unwrap().includes(TokenId(90)));
        assert!(pools.boundary(BoundaryId(2)).unwrap().includes(TokenId(90)));

        manager
            .move_extra(&mut pools, TokenId(90), PoolKey::Extra)
            .unwrap();
        assert_eq!(pools.extra(), &ids(&[90, 91])[..]);
        assert_eq!(
            manager.move_extra(&mut pools, TokenId(10), PoolKey::Extra),
            Err(PoolError::NotManual(TokenId(10)))
        );
    }

    #[test]
    fn heuristic_application_is_idempotent() {
        let (_, manager) = manager();
        let mut pools = manager.layout(&unit());

        assert_eq!(manager.apply_heuristic(&mut pools, BoundaryId(2)), Ok(true));
        let pool = pools.boundary(BoundaryId(2)).unwrap();
        assert_eq!(pool.included(), &ids(&[13, 14])[..]);
        assert_eq!(pool.state(), Some(BoundaryState::Heuristic));

        assert_eq!(manager.apply_heuristic(&mut pools, BoundaryId(2)), Ok(false));
        assert_eq!(
            manager.apply_heuristic(&mut pools, BoundaryId(1)),
            Err(PoolError::NoHeuristic(BoundaryId(1)))
        );
    }

    #[test]
    fn sorted_boundary_needs_reset_before_heuristic() {
        let (store, manager) = manager();
        let unit = unit();
        let mut pools = manager.layout(&unit);

        manager
            .reorder(&mut pools, BoundaryId(2), &ids(&[14, 13]))
            .unwrap();
        assert!(matches!(
            manager.apply_heuristic(&mut pools, BoundaryId(2)),
            Err(PoolError::InvalidTransition { .. })
        ));

        manager.reset(&mut pools, &unit, BoundaryId(2)).unwrap();
        assert_eq!(
            pools.boundary(BoundaryId(2)).unwrap().state(),
            Some(BoundaryState::TokenDecision)
        );
        assert_eq!(store.get("boundary_word_order_boundary-2"), None);
        assert_eq!(manager.apply_heuristic(&mut pools, BoundaryId(2)), Ok(true));
    }

    #[test]
    fn reset_takes_its_manual_token_back() {
        let (store, manager) = manager();
        let unit = UnitBuilder::new(3)
            .sentence(1, &[(10, "a")])
            .word_order(1, &[10, 90])
            .sentence(2, &[(20, "b")])
            .word_order(2, &[20])
            .extra(manual_token(90, "ca"))
            .build();
        let mut pools = manager.layout(&unit);

        manager
            .move_extra(&mut pools, TokenId(90), PoolKey::Boundary(BoundaryId(2)))
            .unwrap();
        assert_eq!(pools.boundary(BoundaryId(2)).unwrap().included(), &ids(&[20, 90])[..]);

        manager.reset(&mut pools, &unit, BoundaryId(1)).unwrap();
        assert_eq!(pools.boundary(BoundaryId(1)).unwrap().included(), &ids(&[10, 90])[..]);
        let second = pools.boundary(BoundaryId(2)).unwrap();
        assert_eq!(second.included(), &ids(&[20])[..]);
        assert_eq!(second.state(), Some(BoundaryState::Sort));
        assert!(pools.extra().is_empty());
        assert_eq!(store.get("boundary_word_order_boundary-2").as_deref(), Some("20"));

        assert_eq!(manager.layout(&unit), pools);
    }

    #[test]
    fn substitute_places_new_tokens_after_the_original() {
        let (_, manager) = manager();
        let unit = UnitBuilder::new(3)
            .sentence(1, &[(10, "a"), (11, "b"), (12, "c")])
            .word_order(1, &[10, 11, 12])
            .extra(manual_token(95, "b1"))
            .extra(manual_token(96, "b2"))
            .build();
        let mut pools = manager.layout(&unit);

        let boundary = manager
            .substitute(&mut pools, &ids(&[11]), &ids(&[95, 96]))
            .unwrap();
        assert_eq!(boundary, BoundaryId(1));

        let pool = pools.boundary(BoundaryId(1)).unwrap();
        assert_eq!(pool.included(), &ids(&[10, 95, 96, 12])[..]);
        assert_eq!(pool.excluded(), &ids(&[11])[..]);
        assert_eq!(pool.state(), Some(BoundaryState::Sort));
        assert!(pools.extra().is_empty());
    }

    #[test]
    fn clear_removes_every_boundary_key() {
        let (store, manager) = manager();
        let mut pools = manager.layout(&unit());
        manager.reorder(&mut pools, BoundaryId(1), &ids(&[12, 11, 10])).unwrap();
        assert!(!store.is_empty());

        manager.clear(&pools);
        assert!(store.keys_with_prefix("boundary_").is_empty());
    }
}
