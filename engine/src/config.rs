//! Engine configuration and its validation.

use forest_core::{ConfigError, GridSize, Timing, DEFAULT_GRID};

/// Probability that a completed tick starts a disease outbreak.
pub const DEFAULT_KILL_RATE: f64 = 1.0 / 100.0;

/// Ticks without growth that a single [`crate::Forest::advance`] may run.
pub const DEFAULT_MAX_TICKS_PER_STEP: u32 = 64;

/// Parameters used to build or reset a forest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForestConfig {
    /// Grid dimensions.
    pub grid: GridSize,
    /// Growth, death and vanish delays.
    pub timing: Timing,
    /// Per-tick probability of an outbreak, in `[0, 1]`.
    pub kill_rate: f64,
    /// Upper bound on growth plans executed per advance, growthless or not.
    pub max_ticks_per_step: u32,
    /// Seed for the random source; `None` draws one from the operating system.
    pub seed: Option<u64>,
}

impl ForestConfig {
    /// Creates a configuration for the provided grid using default parameters.
    #[must_use]
    pub fn new(grid: GridSize) -> Self {
        Self {
            grid,
            ..Self::default()
        }
    }

    /// Checks that the configuration describes a forest the engine can run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.kill_rate) {
            return Err(ConfigError::InvalidKillRate(self.kill_rate));
        }
        if self.grid.cell_count().is_none() {
            return Err(ConfigError::GridTooLarge {
                columns: self.grid.columns(),
                rows: self.grid.rows(),
            });
        }
        if self.max_ticks_per_step == 0 {
            return Err(ConfigError::ZeroTickCap);
        }
        Ok(())
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            grid: DEFAULT_GRID,
            timing: Timing::default(),
            kill_rate: DEFAULT_KILL_RATE,
            max_ticks_per_step: DEFAULT_MAX_TICKS_PER_STEP,
            seed: None,
        }
    }
}
