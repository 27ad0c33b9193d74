//! Committed forest membership: the alive set and its mother subset.

use std::collections::HashMap;

use forest_core::CellCoord;

/// Insertion-ordered set of cells with constant-time membership and removal.
///
/// Removal swaps the last element into the vacated slot, so iteration order
/// depends only on the sequence of operations applied.
#[derive(Clone, Debug, Default)]
pub(crate) struct CellSet {
    cells: Vec<CellCoord>,
    positions: HashMap<CellCoord, usize>,
}

impl CellSet {
    pub(crate) fn contains(&self, cell: CellCoord) -> bool {
        self.positions.contains_key(&cell)
    }

    pub(crate) fn as_slice(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Adds the cell unless it is already present.
    pub(crate) fn insert(&mut self, cell: CellCoord) -> bool {
        if self.contains(cell) {
            return false;
        }
        let _ = self.positions.insert(cell, self.cells.len());
        self.cells.push(cell);
        true
    }

    pub(crate) fn remove(&mut self, cell: CellCoord) -> bool {
        let Some(position) = self.positions.remove(&cell) else {
            return false;
        };
        let _ = self.cells.swap_remove(position);
        if let Some(moved) = self.cells.get(position).copied() {
            let _ = self.positions.insert(moved, position);
        }
        true
    }

    /// Swaps `old` for `new` in place, keeping its position.
    pub(crate) fn replace(&mut self, old: CellCoord, new: CellCoord) -> bool {
        if self.contains(new) {
            return false;
        }
        let Some(position) = self.positions.remove(&old) else {
            return false;
        };
        if let Some(slot) = self.cells.get_mut(position) {
            *slot = new;
        }
        let _ = self.positions.insert(new, position);
        true
    }
}

/// Alive set and mother set, maintaining `mothers ⊆ alive` and uniqueness.
#[derive(Clone, Debug, Default)]
pub(crate) struct ForestState {
    alive: CellSet,
    mothers: CellSet,
}

impl ForestState {
    pub(crate) fn alive(&self) -> &[CellCoord] {
        self.alive.as_slice()
    }

    pub(crate) fn mothers(&self) -> &[CellCoord] {
        self.mothers.as_slice()
    }

    pub(crate) fn is_member(&self, cell: CellCoord) -> bool {
        self.alive.contains(cell)
    }

    pub(crate) fn is_mother(&self, cell: CellCoord) -> bool {
        self.mothers.contains(cell)
    }

    pub(crate) fn add(&mut self, cell: CellCoord) -> bool {
        self.alive.insert(cell)
    }

    /// Removes the cell from the alive set and, if present, the mother set.
    pub(crate) fn remove(&mut self, cell: CellCoord) -> bool {
        let _ = self.remove_mother(cell);
        self.alive.remove(cell)
    }

    /// Registers an alive member as a mother.
    pub(crate) fn add_mother(&mut self, cell: CellCoord) -> bool {
        self.alive.contains(cell) && self.mothers.insert(cell)
    }

    pub(crate) fn remove_mother(&mut self, cell: CellCoord) -> bool {
        self.mothers.remove(cell)
    }

    /// Moves a mother role onto another alive member that is not yet a mother.
    pub(crate) fn replace_mother(&mut self, old: CellCoord, new: CellCoord) -> bool {
        self.alive.contains(new) && self.mothers.replace(old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, column: u32) -> CellCoord {
        CellCoord::new(row, column)
    }

    #[test]
    fn duplicate_insertion_is_rejected() {
        let mut forest = ForestState::default();
        assert!(forest.add(cell(1, 1)));
        assert!(!forest.add(cell(1, 1)));
        assert!(forest.add_mother(cell(1, 1)));
        assert!(!forest.add_mother(cell(1, 1)));

        assert_eq!(forest.alive(), &[cell(1, 1)]);
        assert_eq!(forest.mothers(), &[cell(1, 1)]);
    }

    #[test]
    fn mothers_must_be_alive_members() {
        let mut forest = ForestState::default();
        assert!(!forest.add_mother(cell(0, 0)));
        assert!(forest.mothers().is_empty());
    }

    #[test]
    fn removal_drops_mother_role() {
        let mut forest = ForestState::default();
        for column in 0..4 {
            assert!(forest.add(cell(0, column)));
        }
        assert!(forest.add_mother(cell(0, 1)));
        assert!(forest.add_mother(cell(0, 3)));

        assert!(forest.remove(cell(0, 1)));
        assert!(!forest.remove(cell(0, 1)));
        assert!(!forest.is_member(cell(0, 1)));
        assert!(!forest.is_mother(cell(0, 1)));
        assert_eq!(forest.mothers(), &[cell(0, 3)]);
        assert_eq!(forest.alive().len(), 3);
        assert!(forest.is_member(cell(0, 3)));
    }

    #[test]
    fn replace_mother_keeps_position_and_uniqueness() {
        let mut forest = ForestState::default();
        for column in 0..3 {
            assert!(forest.add(cell(2, column)));
        }
        assert!(forest.add_mother(cell(2, 0)));
        assert!(forest.add_mother(cell(2, 1)));

        assert!(!forest.replace_mother(cell(2, 0), cell(2, 1)));
        assert!(!forest.replace_mother(cell(2, 0), cell(5, 5)));
        assert!(forest.replace_mother(cell(2, 0), cell(2, 2)));
        assert_eq!(forest.mothers(), &[cell(2, 2), cell(2, 1)]);

        assert!(forest.remove_mother(cell(2, 1)));
        assert_eq!(forest.mothers(), &[cell(2, 2)]);
    }

    #[test]
    fn swap_removal_keeps_positions_consistent() {
        let mut set = CellSet::default();
        for column in 0..5 {
            assert!(set.insert(cell(0, column)));
        }
        assert!(set.remove(cell(0, 0)));
        assert!(set.remove(cell(0, 4)));
        assert!(set.remove(cell(0, 2)));

        let mut remaining = set.as_slice().to_vec();
        remaining.sort();
        assert_eq!(remaining, vec![cell(0, 1), cell(0, 3)]);
        for member in remaining {
            assert!(set.contains(member));
            assert!(set.remove(member));
        }
        assert!(set.as_slice().is_empty());
    }
}
