//! Corpus grid port
//!
//! The grid owns the loaded page of unit rows and the row selection. Windows
//! read page snapshots; refreshes after a submission replace single rows.

use anno_model::{UnitId, UnitRecord};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Loaded page of units plus the selected row
pub trait CorpusGrid: Send + Sync + fmt::Debug {
    /// Snapshot of the page in grid order
    fn page(&self) -> Arc<Vec<UnitRecord>>;

    /// Replace the row of `unit.verse_id`; false when the unit is not loaded
    fn replace_unit(&self, unit: UnitRecord) -> bool;

    /// Select the row at `index`
    fn select(&self, index: usize);

    /// Selected row
    fn selected(&self) -> Option<usize>;
}

/// In-memory grid
#[derive(Debug, Default)]
pub struct PageCache {
    units: RwLock<Arc<Vec<UnitRecord>>>,
    selected: RwLock<Option<usize>>,
}

impl PageCache {
    /// Create a grid over a loaded page
    #[must_use]
    pub fn new(units: Vec<UnitRecord>) -> Self {
        Self {
            units: RwLock::new(Arc::new(units)),
            selected: RwLock::new(None),
        }
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    /// Whether the page is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.read().is_empty()
    }

    /// Row of a unit
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<UnitRecord> {
        self.units.read().iter().find(|unit| unit.id() == id).cloned()
    }
}

impl CorpusGrid for PageCache {
    fn page(&self) -> Arc<Vec<UnitRecord>> {
        Arc::clone(&self.units.read())
    }

    fn replace_unit(&self, unit: UnitRecord) -> bool {
        let mut guard = self.units.write();
        let units = Arc::make_mut(&mut guard);
        match units.iter_mut().find(|row| row.id() == unit.id()) {
            Some(row) => {
                debug!(unit = %unit.id(), "row replaced");
                *row = unit;
                true
            }
            None => false,
        }
    }

    fn select(&self, index: usize) {
        *self.selected.write() = Some(index);
    }

    fn selected(&self) -> Option<usize> {
        *self.selected.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anno_test_utils::{create_test_page, UnitBuilder};

    #[test]
    fn replacing_keeps_earlier_snapshots() {
        let grid = PageCache::new(create_test_page(3));
        let before = grid.page();

        let updated = UnitBuilder::new(2).sentence(2, &[(20, "new")]).build();
        assert!(grid.replace_unit(updated));

        assert_eq!(before[1].sentence_token_ids(anno_model::BoundaryId(2)).len(), 3);
        assert_eq!(grid.page()[1].sentence_token_ids(anno_model::BoundaryId(2)).len(), 1);
        assert!(!grid.replace_unit(UnitBuilder::new(9).build()));
    }

    #[test]
    fn selection_is_tracked() {
        let grid = PageCache::new(create_test_page(2));
        assert_eq!(grid.selected(), None);
        grid.select(1);
        assert_eq!(grid.selected(), Some(1));
        assert_eq!(grid.len(), 2);
        assert!(grid.unit(UnitId(2)).is_some());
    }
}
