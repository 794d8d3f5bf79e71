//! Sentinel-reset accumulation map
//!
//! Row-wise sparse accumulation (second-order graph, indirect interpolation,
//! Galerkin product) needs "where in the current output row is column j?" in
//! O(1). [`PositionMap`] keeps one slot per column, EMPTY when unused. A row
//! is accumulated through a [`RowAccumulator`] guard that resets exactly the
//! slots it touched when it is finished or dropped, so an early return can
//! never leave stale positions behind for the next row.

const EMPTY: usize = usize::MAX;

/// Column to position-in-row lookup shared by all rows of one level
#[derive(Debug, Clone)]
pub(crate) struct PositionMap {
    slots: Vec<usize>,
    occupied: usize,
}

impl PositionMap {
    /// Map able to address columns `0..size`
    pub(crate) fn new(size: usize) -> Self {
        Self {
            slots: vec![EMPTY; size],
            occupied: 0,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` if no slot is in use
    pub(crate) fn is_clear(&self) -> bool {
        self.occupied == 0
    }

    /// Start accumulating one row with payload type `V`
    pub(crate) fn row<V>(&mut self) -> RowAccumulator<'_, V> {
        assert!(self.is_clear(), "position map reused while not reset");
        RowAccumulator {
            map: self,
            entries: Vec::new(),
        }
    }
}

/// Scoped accumulation of one output row
pub(crate) struct RowAccumulator<'a, V> {
    map: &'a mut PositionMap,
    entries: Vec<(usize, V)>,
}

impl<V> RowAccumulator<'_, V> {
    /// Payload of column `col`, inserting `init()` on first visit
    pub(crate) fn entry_or_insert_with(&mut self, col: usize, init: impl FnOnce() -> V) -> &mut V {
        let pos = self.map.slots[col];
        if pos == EMPTY {
            self.map.slots[col] = self.entries.len();
            self.map.occupied += 1;
            self.entries.push((col, init()));
            let last = self.entries.len() - 1;
            &mut self.entries[last].1
        } else {
            &mut self.entries[pos].1
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries in insertion order; slots are reset
    pub(crate) fn finish(mut self) -> Vec<(usize, V)> {
        self.release();
        std::mem::take(&mut self.entries)
    }

    fn release(&mut self) {
        for (col, _) in &self.entries {
            self.map.slots[*col] = EMPTY;
        }
        self.map.occupied = 0;
    }
}

impl<V> Drop for RowAccumulator<'_, V> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_by_column() {
        let mut map = PositionMap::new(8);
        let mut row = map.row::<f64>();

        *row.entry_or_insert_with(5, || 0.0) += 1.5;
        *row.entry_or_insert_with(2, || 0.0) += 1.0;
        *row.entry_or_insert_with(5, || 0.0) += 2.0;
        assert_eq!(row.len(), 2);

        let entries = row.finish();
        assert_eq!(entries, vec![(5, 3.5), (2, 1.0)]);
        assert!(map.is_clear());
        assert_eq!(map.len(), 8);
    }

    #[test]
    fn test_reset_on_early_exit() {
        fn accumulate_then_fail(map: &mut PositionMap) -> Result<(), ()> {
            let mut row = map.row::<usize>();
            *row.entry_or_insert_with(1, || 0) += 1;
            *row.entry_or_insert_with(3, || 0) += 1;
            Err(())
        }

        let mut map = PositionMap::new(4);
        assert!(accumulate_then_fail(&mut map).is_err());
        assert!(map.is_clear());

        // a fresh row starts from empty slots
        let mut row = map.row::<usize>();
        *row.entry_or_insert_with(3, || 10) += 1;
        assert_eq!(row.finish(), vec![(3, 11)]);
    }
}
