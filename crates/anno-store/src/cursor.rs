//! Navigation cursors

use crate::store::StateStore;
use anno_model::UnitId;

const CURRENT_INDEX: &str = "current_index";
const NEXT_INDEX: &str = "next_index";
const CURRENT_UNIT: &str = "current_verse_id";
const NEXT_UNIT: &str = "next_verse_id";

/// Position of the open unit in the grid, and of the one after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationCursor {
    /// Grid index of the open unit
    pub current_index: usize,
    /// Grid index to open after the last task
    pub next_index: usize,
    /// Open unit
    pub current_unit: UnitId,
    /// Unit expected at `next_index`
    pub next_unit: UnitId,
}

impl NavigationCursor {
    /// Cursor for the unit opened at `index`
    #[must_use]
    pub fn at(index: usize, unit: UnitId) -> Self {
        Self {
            current_index: index,
            next_index: index + 1,
            current_unit: unit,
            next_unit: unit.next(),
        }
    }

    /// Persist all four pointers
    pub fn save(&self, store: &dyn StateStore) {
        store.set(CURRENT_INDEX, self.current_index.to_string());
        store.set(NEXT_INDEX, self.next_index.to_string());
        store.set(CURRENT_UNIT, self.current_unit.to_string());
        store.set(NEXT_UNIT, self.next_unit.to_string());
    }

    /// Read the pointers back; `None` if any is missing or unreadable
    #[must_use]
    pub fn load(store: &dyn StateStore) -> Option<Self> {
        Some(Self {
            current_index: store.get(CURRENT_INDEX)?.parse().ok()?,
            next_index: store.get(NEXT_INDEX)?.parse().ok()?,
            current_unit: store.get(CURRENT_UNIT)?.parse().ok()?,
            next_unit: store.get(NEXT_UNIT)?.parse().ok()?,
        })
    }

    /// Stored "next" pointer alone
    #[must_use]
    pub fn stored_next_index(store: &dyn StateStore) -> Option<usize> {
        store.get(NEXT_INDEX)?.parse().ok()
    }
}
