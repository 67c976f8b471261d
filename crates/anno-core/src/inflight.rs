//! In-flight submission guard
//!
//! One outstanding request per (unit, action). The guard releases its slot
//! when dropped, whatever the outcome of the request.

use anno_model::{Action, UnitId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

type Slot = (UnitId, Action);

/// Registry of outstanding submissions
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    slots: Arc<DashMap<Slot, ()>>,
}

/// Held while a submission is outstanding
#[derive(Debug)]
#[must_use = "the slot is released as soon as the guard is dropped"]
pub struct InFlightGuard {
    slots: Arc<DashMap<Slot, ()>>,
    slot: Slot,
}

impl InFlightRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `action` on `unit`; `None` while it is taken
    pub fn try_acquire(&self, unit: UnitId, action: Action) -> Option<InFlightGuard> {
        match self.slots.entry((unit, action)) {
            Entry::Occupied(_) => None,
            Entry::Vacant(entry) => {
                entry.insert(());
                trace!(%unit, %action, "submission slot taken");
                Some(InFlightGuard {
                    slots: Arc::clone(&self.slots),
                    slot: (unit, action),
                })
            }
        }
    }

    /// Whether `action` on `unit` is outstanding
    #[must_use]
    pub fn is_in_flight(&self, unit: UnitId, action: Action) -> bool {
        self.slots.contains_key(&(unit, action))
    }

    /// Number of outstanding submissions
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing is outstanding
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.slots.remove(&self.slot);
        trace!(unit = %self.slot.0, action = %self.slot.1, "submission slot released");
    }
}
