//! Per-cell lifecycle states and the queue of scheduled transitions.

use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Duration,
};

use forest_core::{CellCoord, CellState, GridSize, Timing};

/// Delayed state change queued for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Growing → Alive, optionally registering the tree as a mother.
    Mature { mother: bool },
    /// Dying → Vanishing.
    Wither,
    /// Vanishing → Empty.
    Clear,
}

impl Transition {
    const fn source(self) -> CellState {
        match self {
            Self::Mature { .. } => CellState::Growing,
            Self::Wither => CellState::Dying,
            Self::Clear => CellState::Vanishing,
        }
    }

    const fn target(self) -> CellState {
        match self {
            Self::Mature { .. } => CellState::Alive,
            Self::Wither => CellState::Vanishing,
            Self::Clear => CellState::Empty,
        }
    }
}

/// Transition that fired while advancing the clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FiredTransition {
    pub(crate) cell: CellCoord,
    pub(crate) transition: Transition,
}

#[derive(Clone, Copy, Debug)]
struct ScheduledTransition {
    fire_at: Duration,
    sequence: u64,
    cell: CellCoord,
    transition: Transition,
}

impl ScheduledTransition {
    fn key(&self) -> (Duration, u64) {
        (self.fire_at, self.sequence)
    }
}

impl PartialEq for ScheduledTransition {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ScheduledTransition {}

impl PartialOrd for ScheduledTransition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledTransition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Dense cell state grid paired with the clock that drives its transitions.
///
/// Every accepted grow or kill request schedules its follow-up transitions as
/// `(cell, transition, fire time)` records. Advancing the clock fires records
/// in fire-time order, with scheduling order breaking ties, so a single large
/// step replays a whole sequence deterministically.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    grid: GridSize,
    timing: Timing,
    cells: Vec<CellState>,
    clock: Duration,
    next_sequence: u64,
    pending: BinaryHeap<Reverse<ScheduledTransition>>,
}

impl Lifecycle {
    pub(crate) fn new(grid: GridSize, timing: Timing) -> Self {
        let capacity = grid.cell_count().unwrap_or(0);
        Self {
            grid,
            timing,
            cells: vec![CellState::Empty; capacity],
            clock: Duration::ZERO,
            next_sequence: 0,
            pending: BinaryHeap::new(),
        }
    }

    pub(crate) const fn grid(&self) -> GridSize {
        self.grid
    }

    pub(crate) const fn timing(&self) -> Timing {
        self.timing
    }

    pub(crate) const fn clock(&self) -> Duration {
        self.clock
    }

    pub(crate) fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn next_fire_at(&self) -> Option<Duration> {
        self.pending.peek().map(|Reverse(next)| next.fire_at)
    }

    /// Current state of the cell, or `None` when the cell does not exist.
    pub(crate) fn state(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied())
    }

    /// Empty → Growing. Returns `false` when the cell is missing or occupied.
    pub(crate) fn begin_growth(&mut self, cell: CellCoord, mother: bool) -> bool {
        if self.state(cell) != Some(CellState::Empty) {
            return false;
        }
        self.set(cell, CellState::Growing);
        let fire_at = self.clock.saturating_add(self.timing.growth);
        self.schedule(fire_at, cell, Transition::Mature { mother });
        true
    }

    /// Alive → Dying. Returns `false` when the cell is missing or not alive.
    pub(crate) fn begin_death(&mut self, cell: CellCoord) -> bool {
        if self.state(cell) != Some(CellState::Alive) {
            return false;
        }
        self.set(cell, CellState::Dying);
        let fire_at = self.clock.saturating_add(self.timing.death);
        self.schedule(fire_at, cell, Transition::Wither);
        true
    }

    /// Advances the clock and fires every transition that fell due.
    pub(crate) fn advance(&mut self, dt: Duration, out: &mut Vec<FiredTransition>) {
        self.clock = self.clock.saturating_add(dt);

        while let Some(Reverse(next)) = self.pending.peek().copied() {
            if next.fire_at > self.clock {
                break;
            }
            let _ = self.pending.pop();

            let transition = next.transition;
            if self.state(next.cell) != Some(transition.source()) {
                tracing::trace!(cell = ?next.cell, ?transition, "dropping stale transition");
                continue;
            }

            self.set(next.cell, transition.target());
            if transition == Transition::Wither {
                let fire_at = next.fire_at.saturating_add(self.timing.vanish);
                self.schedule(fire_at, next.cell, Transition::Clear);
            }

            out.push(FiredTransition {
                cell: next.cell,
                transition,
            });
        }
    }

    fn schedule(&mut self, fire_at: Duration, cell: CellCoord, transition: Transition) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.pending.push(Reverse(ScheduledTransition {
            fire_at,
            sequence,
            cell,
            transition,
        }));
    }

    fn set(&mut self, cell: CellCoord, state: CellState) {
        if let Some(index) = self.index(cell) {
            if let Some(slot) = self.cells.get_mut(index) {
                *slot = state;
            }
        }
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        self.grid
            .index(cell)
            .filter(|index| *index < self.cells.len())
    }
}
