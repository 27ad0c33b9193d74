#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the forest simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Drivers submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! renderers to react to. Systems read immutable [`ForestView`] snapshots and
//! respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid used until a driver configures its own dimensions.
pub const DEFAULT_GRID: GridSize = GridSize::new(80, 24);

/// Largest number of cells a grid may hold.
pub const MAX_GRID_CELLS: usize = 1 << 24;

/// Delay between a grow request and the tree committing as alive.
pub const DEFAULT_GROWTH_DELAY: Duration = Duration::from_millis(50);
/// Delay between a kill request and the dying tree starting to vanish.
pub const DEFAULT_DEATH_DELAY: Duration = Duration::from_millis(100);
/// Delay between a tree starting to vanish and its cell becoming empty.
pub const DEFAULT_VANISH_DELAY: Duration = Duration::from_millis(400);

/// Row and column offsets visited by [`CellCoord::neighbors`], clockwise
/// starting from the cell one column to the left.
const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Rebuilds the grid with new dimensions and timing, discarding every tree.
    Configure {
        /// Dimensions of the freshly created grid.
        grid: GridSize,
        /// Delays applied to every timed lifecycle transition.
        timing: Timing,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an empty cell start growing a tree.
    GrowTree {
        /// Cell that should sprout.
        cell: CellCoord,
        /// Whether the tree joins the mother set once its growth commits.
        mother: bool,
    },
    /// Requests that an alive tree start dying.
    KillTree {
        /// Cell holding the tree to kill.
        cell: CellCoord,
    },
    /// Moves a growth origin from one alive tree to another.
    ReplaceMother {
        /// Mother that gives up its role.
        from: CellCoord,
        /// Alive tree that becomes a mother in its place.
        to: CellCoord,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that the grid was rebuilt and every tree discarded.
    Configured {
        /// Dimensions of the new grid.
        grid: GridSize,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// An empty cell accepted a grow request and entered the growing state.
    GrowthStarted {
        /// Cell that started growing.
        cell: CellCoord,
    },
    /// A growing tree matured and was committed to the alive set.
    TreeGrown {
        /// Cell holding the matured tree.
        cell: CellCoord,
        /// Whether the tree was committed as a mother.
        mother: bool,
    },
    /// An alive tree was struck and entered the dying state.
    TreeKilled {
        /// Cell holding the dying tree.
        cell: CellCoord,
    },
    /// A dying tree finished dying and started to vanish.
    TreeWithered {
        /// Cell holding the withered tree.
        cell: CellCoord,
    },
    /// A vanishing tree was removed and its cell became empty.
    TreeVanished {
        /// Cell that became empty.
        cell: CellCoord,
    },
    /// A growth origin drifted to a neighbouring tree.
    MotherMoved {
        /// Previous mother.
        from: CellCoord,
        /// New mother.
        to: CellCoord,
    },
}

/// Location of a single grid cell expressed as row and column coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Enumerates the up to eight cells surrounding this one.
    ///
    /// Candidates are produced clockwise starting from `(row, column - 1)`.
    /// Candidates with a negative row or column are dropped; no upper bound is
    /// applied, so callers must confirm a candidate exists in their grid.
    pub fn neighbors(self) -> impl Iterator<Item = CellCoord> {
        NEIGHBOR_OFFSETS
            .into_iter()
            .filter_map(move |(row_offset, column_offset)| {
                let row = self.row.checked_add_signed(row_offset)?;
                let column = self.column.checked_add_signed(column_offset)?;
                Some(CellCoord::new(row, column))
            })
    }

    /// Reports whether the two cells touch, including diagonally.
    #[must_use]
    pub fn is_adjacent(self, other: CellCoord) -> bool {
        self != other
            && self.row.abs_diff(other.row) <= 1
            && self.column.abs_diff(other.column) <= 1
    }
}

/// Lifecycle state of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CellState {
    /// No tree occupies the cell.
    #[default]
    Empty,
    /// A tree was planted and is waiting for its growth delay.
    Growing,
    /// A mature tree occupies the cell.
    Alive,
    /// The tree was struck by disease and is waiting for its death delay.
    Dying,
    /// The dead tree is waiting for its vanish delay before the cell empties.
    Vanishing,
}

impl CellState {
    /// Reports whether the state counts as alive for neighbour and disease queries.
    #[must_use]
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }

    /// Reports whether a tree may be planted in a cell with this state.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Dimensions of the forest grid measured in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new grid size from explicit dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells, or `None` when it exceeds [`MAX_GRID_CELLS`].
    #[must_use]
    pub fn cell_count(&self) -> Option<usize> {
        let columns = usize::try_from(self.columns).ok()?;
        let rows = usize::try_from(self.rows).ok()?;
        columns
            .checked_mul(rows)
            .filter(|count| *count <= MAX_GRID_CELLS)
    }

    /// Reports whether the grid holds no cells at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.columns == 0 || self.rows == 0
    }

    /// Reports whether the cell lies within the grid bounds.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.row() < self.rows && cell.column() < self.columns
    }

    /// Row-major index of the cell, if it lies within the grid.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    /// Iterates every cell of the grid in row-major order.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        let columns = self.columns;
        (0..self.rows)
            .flat_map(move |row| (0..columns).map(move |column| CellCoord::new(row, column)))
    }
}

/// Delays applied to the timed lifecycle transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Timing {
    /// Time spent growing before a tree commits as alive.
    pub growth: Duration,
    /// Time spent dying before a tree starts to vanish.
    pub death: Duration,
    /// Time spent vanishing before the cell becomes empty.
    pub vanish: Duration,
}

impl Timing {
    /// Creates timing from explicit delays.
    #[must_use]
    pub const fn new(growth: Duration, death: Duration, vanish: Duration) -> Self {
        Self {
            growth,
            death,
            vanish,
        }
    }

    /// Timing with every delay set to zero; transitions fire on the next tick.
    #[must_use]
    pub const fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(
            DEFAULT_GROWTH_DELAY,
            DEFAULT_DEATH_DELAY,
            DEFAULT_VANISH_DELAY,
        )
    }
}

/// Read-only snapshot of the forest used by systems to plan commands.
#[derive(Clone, Copy, Debug)]
pub struct ForestView<'a> {
    grid: GridSize,
    cells: &'a [CellState],
    alive: &'a [CellCoord],
    mothers: &'a [CellCoord],
}

impl<'a> ForestView<'a> {
    /// Captures a new view backed by the provided dense state slice and sets.
    ///
    /// `cells` is indexed row-major using `grid`; `alive` and `mothers` hold
    /// the committed alive set and mother set without duplicates.
    #[must_use]
    pub fn new(
        grid: GridSize,
        cells: &'a [CellState],
        alive: &'a [CellCoord],
        mothers: &'a [CellCoord],
    ) -> Self {
        Self {
            grid,
            cells,
            alive,
            mothers,
        }
    }

    /// Dimensions of the viewed grid.
    #[must_use]
    pub const fn grid(&self) -> GridSize {
        self.grid
    }

    /// Reports whether the coordinate names an instantiated grid cell.
    #[must_use]
    pub fn cell_exists(&self, cell: CellCoord) -> bool {
        self.grid
            .index(cell)
            .map_or(false, |index| index < self.cells.len())
    }

    /// Current lifecycle state of the cell; unknown cells are empty.
    #[must_use]
    pub fn state(&self, cell: CellCoord) -> CellState {
        self.grid
            .index(cell)
            .and_then(|index| self.cells.get(index).copied())
            .unwrap_or_default()
    }

    /// Reports whether the cell currently holds a mature, unstruck tree.
    #[must_use]
    pub fn is_alive(&self, cell: CellCoord) -> bool {
        self.state(cell).is_alive()
    }

    /// Reports whether the cell exists and a tree may be planted in it.
    #[must_use]
    pub fn is_free(&self, cell: CellCoord) -> bool {
        self.cell_exists(cell) && self.state(cell).is_empty()
    }

    /// Committed alive set, including trees whose removal is still pending.
    #[must_use]
    pub fn alive_cells(&self) -> &'a [CellCoord] {
        self.alive
    }

    /// Current growth origins.
    #[must_use]
    pub fn mothers(&self) -> &'a [CellCoord] {
        self.mothers
    }

    /// Reports whether the cell is a growth origin.
    #[must_use]
    pub fn is_mother(&self, cell: CellCoord) -> bool {
        self.mothers.contains(&cell)
    }

    /// Neighbours of the cell that exist and hold an alive tree.
    #[must_use]
    pub fn alive_neighbors(&self, cell: CellCoord) -> Vec<CellCoord> {
        cell.neighbors()
            .filter(|neighbor| self.cell_exists(*neighbor) && self.is_alive(*neighbor))
            .collect()
    }

    /// Neighbours of the cell that exist and could accept a new tree.
    #[must_use]
    pub fn free_neighbors(&self, cell: CellCoord) -> Vec<CellCoord> {
        cell.neighbors()
            .filter(|neighbor| self.is_free(*neighbor))
            .collect()
    }
}

/// Boundary hooks implemented by whatever presents the forest.
///
/// The engine invokes these at the corresponding lifecycle transitions and
/// never waits on them.
pub trait CellRenderer {
    /// A tree was planted in an empty cell.
    fn render_grow(&mut self, cell: CellCoord);

    /// An alive tree was struck and is now dying.
    fn render_kill_start(&mut self, cell: CellCoord);

    /// A dead tree finished vanishing and its cell is empty again.
    fn render_vanish(&mut self, cell: CellCoord);

    /// A growing tree matured.
    fn render_mature(&mut self, _cell: CellCoord) {}

    /// A dying tree finished dying and started to fade.
    fn render_wither(&mut self, _cell: CellCoord) {}

    /// The grid was rebuilt; every cell is empty.
    fn render_reset(&mut self, _grid: GridSize) {}
}

/// Renderer that ignores every hook.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullRenderer;

impl CellRenderer for NullRenderer {
    fn render_grow(&mut self, _cell: CellCoord) {}

    fn render_kill_start(&mut self, _cell: CellCoord) {}

    fn render_vanish(&mut self, _cell: CellCoord) {}
}

/// Reasons a simulation configuration may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The kill rate is not a finite probability.
    #[error("kill rate must be a probability in [0, 1] (received {0})")]
    InvalidKillRate(f64),
    /// The grid holds more than [`MAX_GRID_CELLS`] cells.
    #[error("grid of {columns}x{rows} cells is too large")]
    GridTooLarge {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The driver must be allowed at least one tick per step.
    #[error("max ticks per step must be positive")]
    ZeroTickCap,
}
