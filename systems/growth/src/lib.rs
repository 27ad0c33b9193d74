#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Randomized growth planner that extends the forest by one tree per tick.
//!
//! Each call either seeds a new mother at a random grid cell or expands from
//! an existing mother. Seeding becomes rarer as mothers accumulate, so the
//! forest tends to grow as a handful of spreading clusters.

use forest_core::{CellCoord, Command, ForestView};
use rand::{seq::SliceRandom, Rng};

/// Number of roots the neighbour search visits before giving up on a tick.
pub const NEIGHBOR_SEARCH_LIMIT: u32 = 500;

/// Probability that an expanding mother hands its role to an alive neighbour.
pub const MOTHER_DRIFT_PROBABILITY: f64 = 1.0 / 3.0;

const MOTHER_SPACING: f64 = 2.5;

/// Probability of seeding a new mother given the current mother count.
///
/// Always seeds when no mother exists; otherwise `1 / (2.5 * mothers)²`.
#[must_use]
pub fn new_mother_probability(mothers: usize) -> f64 {
    if mothers == 0 {
        return 1.0;
    }
    let spread = MOTHER_SPACING * mothers as f64;
    (1.0 / (spread * spread)).min(1.0)
}

/// Configuration parameters required to construct the growth planner.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    search_limit: u32,
    drift_probability: f64,
}

impl Config {
    /// Creates a new configuration with an explicit search limit and drift rate.
    ///
    /// The drift probability is clamped into `[0, 1]`.
    #[must_use]
    pub fn new(search_limit: u32, drift_probability: f64) -> Self {
        let drift_probability = if drift_probability.is_finite() {
            drift_probability.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            search_limit,
            drift_probability,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(NEIGHBOR_SEARCH_LIMIT, MOTHER_DRIFT_PROBABILITY)
    }
}

/// Pure system that chooses the next cell to grow.
#[derive(Debug, Default)]
pub struct Growth {
    config: Config,
}

impl Growth {
    /// Creates a new growth planner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Plans a single growth step and emits the commands that realise it.
    ///
    /// Returns the cell asked to grow, or `None` when this tick produces no
    /// growth: the random seed cell was taken, or the neighbour search was
    /// exhausted. Neither case is an error.
    pub fn plan<R>(
        &self,
        view: &ForestView<'_>,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        let mothers = view.mothers();
        if rng.gen_bool(new_mother_probability(mothers.len())) {
            return self.seed_mother(view, rng, out);
        }

        let mut root = *mothers.choose(rng)?;

        if rng.gen_bool(self.config.drift_probability) {
            let alive = view.alive_neighbors(root);
            if let Some(&successor) = alive.choose(rng) {
                out.push(Command::ReplaceMother {
                    from: root,
                    to: successor,
                });
                root = successor;
            }
        }

        let Some(cell) = self.search_free_neighbor(view, root, rng) else {
            tracing::trace!(?root, "neighbour search exhausted");
            return None;
        };
        out.push(Command::GrowTree {
            cell,
            mother: false,
        });
        Some(cell)
    }

    fn seed_mother<R>(
        &self,
        view: &ForestView<'_>,
        rng: &mut R,
        out: &mut Vec<Command>,
    ) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        let grid = view.grid();
        if grid.is_empty() {
            return None;
        }

        let cell = CellCoord::new(
            rng.gen_range(0..grid.rows()),
            rng.gen_range(0..grid.columns()),
        );
        if !view.is_free(cell) {
            tracing::trace!(?cell, "seed cell already taken");
            return None;
        }

        out.push(Command::GrowTree { cell, mother: true });
        Some(cell)
    }

    /// Walks randomly from `root` until a cell with a free neighbour is found.
    ///
    /// The walk ignores grid bounds; roots outside the grid simply have no
    /// free neighbours.
    fn search_free_neighbor<R>(
        &self,
        view: &ForestView<'_>,
        mut root: CellCoord,
        rng: &mut R,
    ) -> Option<CellCoord>
    where
        R: Rng + ?Sized,
    {
        for _ in 0..self.config.search_limit {
            let free = view.free_neighbors(root);
            if let Some(&cell) = free.choose(rng) {
                return Some(cell);
            }

            let candidates = root.neighbors().count();
            if candidates == 0 {
                return None;
            }
            root = root.neighbors().nth(rng.gen_range(0..candidates))?;
        }
        None
    }
}
