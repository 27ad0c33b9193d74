#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Simulation loop that grows a forest and lets disease thin it out.
//!
//! [`Forest`] owns the world, the growth and disease systems and the random
//! source. Drivers call [`Forest::advance`] with elapsed time; the forest
//! applies the resulting tick, lets outbreaks progress, and whenever the
//! previous growth has settled it rolls for disease and plans the next tree.
//! Lifecycle events are forwarded to a [`CellRenderer`].

mod config;

use std::time::Duration;

use forest_core::{CellCoord, CellRenderer, CellState, Command, ConfigError, Event};
use forest_system_disease::Disease;
use forest_system_growth::Growth;
use forest_world::{self as world, query, World};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub use config::{ForestConfig, DEFAULT_KILL_RATE, DEFAULT_MAX_TICKS_PER_STEP};

/// Counters accumulated since the forest was last configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Loop iterations completed, with or without growth.
    pub ticks: u64,
    /// Trees that matured.
    pub grown: u64,
    /// Trees struck by disease.
    pub killed: u64,
    /// Outbreaks started by the kill roll.
    pub outbreaks_started: u64,
    /// Outbreaks that ran out of trees to strike.
    pub outbreaks_contained: u64,
}

/// Position of the loop within its current iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// No iteration is executing.
    Idle,
    /// Waiting for the tree planted this iteration to mature.
    Settling { cell: CellCoord },
    /// At an iteration boundary, ready to plan growth.
    Planning,
}

/// Forest simulation driven by elapsed time.
#[derive(Debug)]
pub struct Forest<R> {
    config: ForestConfig,
    world: World,
    growth: Growth,
    disease: Disease,
    rng: ChaCha8Rng,
    running: bool,
    phase: Phase,
    stats: Stats,
    renderer: R,
}

impl<R: CellRenderer> Forest<R> {
    /// Builds an idle forest from a validated configuration.
    pub fn new(config: ForestConfig, renderer: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut forest = Self {
            config,
            world: World::new(),
            growth: Growth::default(),
            disease: Disease::new(),
            rng: rng_for(config.seed),
            running: false,
            phase: Phase::Idle,
            stats: Stats::default(),
            renderer,
        };
        forest.reset();
        Ok(forest)
    }

    /// Replaces the configuration, clearing every tree and outbreak.
    ///
    /// The loop returns to idle; call [`Forest::start`] to resume growth.
    pub fn configure(&mut self, config: ForestConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.rng = rng_for(config.seed);
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.growth = Growth::default();
        self.running = false;
        self.phase = Phase::Idle;
        self.stats = Stats::default();
        self.pump(vec![Command::Configure {
            grid: self.config.grid,
            timing: self.config.timing,
        }]);
        tracing::info!(
            columns = self.config.grid.columns(),
            rows = self.config.grid.rows(),
            kill_rate = self.config.kill_rate,
            "forest configured"
        );
    }

    /// Requests growth; an idle loop begins a new iteration on the next advance.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        if self.phase == Phase::Idle {
            self.phase = Phase::Planning;
        }
        tracing::info!("forest started");
    }

    /// Requests the loop to go idle once its current iteration finishes.
    ///
    /// Trees already growing or dying complete their transitions.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        tracing::info!("forest stopping");
    }

    /// Starts an idle loop or stops a running one.
    ///
    /// A toggle that arrives while a stopped loop is still finishing its last
    /// iteration is ignored.
    pub fn toggle(&mut self) {
        if self.running {
            self.stop();
        } else if self.phase == Phase::Idle {
            self.start();
        } else {
            tracing::debug!("ignoring toggle while the loop winds down");
        }
    }

    /// Reports whether growth has been requested.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Reports whether an iteration is executing.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Advances simulated time and runs every loop iteration that completes.
    ///
    /// Time is stepped one due transition at a time, so iterations and
    /// outbreak waves act at the moment their delays elapse whatever the
    /// size of `dt`. Iterations that produce no growth complete immediately;
    /// at most `max_ticks_per_step` plans run per call.
    pub fn advance(&mut self, dt: Duration) {
        let target = query::clock(&self.world).saturating_add(dt);
        let mut budget = self.config.max_ticks_per_step;
        self.run_iterations(&mut budget);

        loop {
            let now = query::clock(&self.world);
            let due =
                query::next_transition_at(&self.world).filter(|at| *at <= target);
            let until = due.map_or(target, |at| at.max(now));
            self.pump(vec![Command::Tick { dt: until - now }]);
            self.run_iterations(&mut budget);
            if due.is_none() {
                return;
            }
        }
    }

    /// Runs iterations at the current clock until one waits on growth.
    fn run_iterations(&mut self, budget: &mut u32) {
        loop {
            match self.phase {
                Phase::Idle => return,
                Phase::Settling { cell } => {
                    if query::cell_state(&self.world, cell) == CellState::Growing {
                        return;
                    }
                    self.finish_iteration();
                }
                Phase::Planning => {
                    if !self.running {
                        self.go_idle();
                        return;
                    }
                    if *budget == 0 {
                        tracing::trace!("tick cap reached");
                        return;
                    }
                    *budget -= 1;
                    self.plan_growth();
                }
            }
        }
    }

    fn plan_growth(&mut self) {
        let mut commands = Vec::new();
        let planned = self.growth.plan(
            &query::forest_view(&self.world),
            &mut self.rng,
            &mut commands,
        );
        self.pump(commands);

        match planned {
            Some(cell) if query::cell_state(&self.world, cell) == CellState::Growing => {
                tracing::debug!(?cell, "growth planted");
                self.phase = Phase::Settling { cell };
            }
            _ => self.finish_iteration(),
        }
    }

    /// Rolls for disease and moves to the next iteration boundary.
    fn finish_iteration(&mut self) {
        self.stats.ticks += 1;
        self.roll_disease();
        if self.running {
            self.phase = Phase::Planning;
        } else {
            self.go_idle();
        }
    }

    fn go_idle(&mut self) {
        self.phase = Phase::Idle;
        tracing::info!(ticks = self.stats.ticks, "forest idle");
    }

    fn roll_disease(&mut self) {
        if self.rng.gen::<f64>() >= self.config.kill_rate {
            return;
        }
        let living: Vec<CellCoord> = query::alive_cells(&self.world)
            .iter()
            .copied()
            .filter(|&cell| query::is_alive(&self.world, cell))
            .collect();
        let Some(&origin) = living.choose(&mut self.rng) else {
            tracing::trace!("no living tree to strike");
            return;
        };

        let mut commands = Vec::new();
        let id = self
            .disease
            .spread(origin, &query::forest_view(&self.world), &mut commands);
        self.stats.outbreaks_started += 1;
        tracing::debug!(outbreak = id.get(), ?origin, "outbreak started");
        self.pump(commands);
    }

    /// Applies commands until neither the world nor the disease produces more.
    fn pump(&mut self, mut commands: Vec<Command>) {
        let mut events = Vec::new();
        while !commands.is_empty() {
            events.clear();
            for command in commands.drain(..) {
                world::apply(&mut self.world, command, &mut events);
            }
            self.observe(&events);
            self.disease
                .handle(&events, &query::forest_view(&self.world), &mut commands);
        }
        self.record_contained();
    }

    fn observe(&mut self, events: &[Event]) {
        for event in events {
            match *event {
                Event::Configured { grid } => self.renderer.render_reset(grid),
                Event::GrowthStarted { cell } => self.renderer.render_grow(cell),
                Event::TreeGrown { cell, .. } => {
                    self.stats.grown += 1;
                    self.renderer.render_mature(cell);
                }
                Event::TreeKilled { cell } => {
                    self.stats.killed += 1;
                    self.renderer.render_kill_start(cell);
                }
                Event::TreeWithered { cell } => self.renderer.render_wither(cell),
                Event::TreeVanished { cell } => self.renderer.render_vanish(cell),
                Event::TimeAdvanced { .. } | Event::MotherMoved { .. } => {}
            }
        }
    }

    fn record_contained(&mut self) {
        for summary in self.disease.drain_contained() {
            self.stats.outbreaks_contained += 1;
            tracing::info!(
                outbreak = summary.id.get(),
                origin = ?summary.origin,
                waves = summary.waves,
                kills = summary.kills,
                "outbreak contained"
            );
        }
    }

    /// Configuration currently in effect.
    #[must_use]
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Authoritative world, readable through [`forest_world::query`].
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Counters accumulated since the last configure.
    #[must_use]
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Number of outbreaks still spreading.
    #[must_use]
    pub fn outbreaks_in_flight(&self) -> usize {
        self.disease.in_flight()
    }

    /// Renderer receiving lifecycle hooks.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the renderer, for drivers that draw between steps.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

fn rng_for(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}
