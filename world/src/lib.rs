#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative forest state management.
//!
//! The world is the single owner of every cell's lifecycle state and of the
//! committed alive and mother sets. All mutations are serialized through
//! [`apply`], so overlapping growth and disease activity never observe a
//! partially applied change.

mod forest;
mod lifecycle;

use std::time::Duration;

use forest_core::{Command, Event, GridSize, Timing, DEFAULT_GRID};

use crate::{
    forest::ForestState,
    lifecycle::{FiredTransition, Lifecycle, Transition},
};

/// Represents the authoritative forest world state.
#[derive(Debug)]
pub struct World {
    lifecycle: Lifecycle,
    forest: ForestState,
    fired: Vec<FiredTransition>,
}

impl World {
    /// Creates a new world with the default grid and timing and no trees.
    #[must_use]
    pub fn new() -> Self {
        Self::with_grid(DEFAULT_GRID, Timing::default())
    }

    /// Creates a new empty world using the provided grid and timing.
    #[must_use]
    pub fn with_grid(grid: GridSize, timing: Timing) -> Self {
        if grid.cell_count().is_none() {
            tracing::warn!(?grid, "grid is not addressable; creating it without cells");
        }
        Self {
            lifecycle: Lifecycle::new(grid, timing),
            forest: ForestState::default(),
            fired: Vec::new(),
        }
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.fired.clear();
        self.lifecycle.advance(dt, &mut self.fired);

        for fired in self.fired.drain(..) {
            let cell = fired.cell;
            match fired.transition {
                Transition::Mature { mother } => {
                    if !self.forest.add(cell) {
                        tracing::warn!(?cell, "matured tree was already committed");
                    }
                    let mother = mother && self.forest.add_mother(cell);
                    out_events.push(Event::TreeGrown { cell, mother });
                }
                Transition::Wither => out_events.push(Event::TreeWithered { cell }),
                Transition::Clear => {
                    let _ = self.forest.remove(cell);
                    out_events.push(Event::TreeVanished { cell });
                }
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Commands that cannot take effect (coordinates outside the grid, growth on
/// an occupied cell, kills on trees that are not alive, replacement of cells
/// that are not mothers) leave the world untouched and emit no events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Configure { grid, timing } => {
            *world = World::with_grid(grid, timing);
            out_events.push(Event::Configured { grid });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            world.advance(dt, out_events);
        }
        Command::GrowTree { cell, mother } => {
            if world.lifecycle.begin_growth(cell, mother) {
                out_events.push(Event::GrowthStarted { cell });
            } else {
                tracing::trace!(?cell, "ignoring growth on unavailable cell");
            }
        }
        Command::KillTree { cell } => {
            if world.lifecycle.begin_death(cell) {
                out_events.push(Event::TreeKilled { cell });
            } else {
                tracing::trace!(?cell, "ignoring kill of cell without a living tree");
            }
        }
        Command::ReplaceMother { from, to } => {
            let target_alive = world
                .lifecycle
                .state(to)
                .map_or(false, |state| state.is_alive());
            if target_alive && world.forest.replace_mother(from, to) {
                out_events.push(Event::MotherMoved { from, to });
            } else {
                tracing::trace!(?from, ?to, "ignoring mother replacement");
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use forest_core::{CellCoord, CellState, ForestView, GridSize, Timing};

    use super::World;

    /// Dimensions of the current grid.
    #[must_use]
    pub fn grid(world: &World) -> GridSize {
        world.lifecycle.grid()
    }

    /// Delays applied to lifecycle transitions.
    #[must_use]
    pub fn timing(world: &World) -> Timing {
        world.lifecycle.timing()
    }

    /// Simulated time elapsed since the grid was configured.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.lifecycle.clock()
    }

    /// Captures a read-only view of cell states and forest membership.
    #[must_use]
    pub fn forest_view(world: &World) -> ForestView<'_> {
        ForestView::new(
            world.lifecycle.grid(),
            world.lifecycle.cells(),
            world.forest.alive(),
            world.forest.mothers(),
        )
    }

    /// Reports whether the coordinate names an instantiated grid cell.
    #[must_use]
    pub fn cell_exists(world: &World, cell: CellCoord) -> bool {
        world.lifecycle.state(cell).is_some()
    }

    /// Current lifecycle state of the cell; unknown cells are empty.
    #[must_use]
    pub fn cell_state(world: &World, cell: CellCoord) -> CellState {
        world.lifecycle.state(cell).unwrap_or_default()
    }

    /// Reports whether the cell holds a mature tree that has not been struck.
    #[must_use]
    pub fn is_alive(world: &World, cell: CellCoord) -> bool {
        cell_state(world, cell).is_alive()
    }

    /// Reports whether the cell is in the committed alive set.
    ///
    /// Membership lags the cell state: it begins when growth matures and ends
    /// only once a killed tree has fully vanished.
    #[must_use]
    pub fn is_committed(world: &World, cell: CellCoord) -> bool {
        world.forest.is_member(cell)
    }

    /// Reports whether the cell is a growth origin.
    #[must_use]
    pub fn is_mother(world: &World, cell: CellCoord) -> bool {
        world.forest.is_mother(cell)
    }

    /// Committed alive set.
    #[must_use]
    pub fn alive_cells(world: &World) -> &[CellCoord] {
        world.forest.alive()
    }

    /// Current growth origins.
    #[must_use]
    pub fn mothers(world: &World) -> &[CellCoord] {
        world.forest.mothers()
    }

    /// Number of lifecycle transitions waiting for their delay to elapse.
    #[must_use]
    pub fn pending_transitions(world: &World) -> usize {
        world.lifecycle.pending_len()
    }

    /// Simulation time at which the earliest pending transition falls due.
    #[must_use]
    pub fn next_transition_at(world: &World) -> Option<Duration> {
        world.lifecycle.next_fire_at()
    }
}
