use std::time::Duration;

use forest_core::{
    CellCoord, CellRenderer, CellState, ConfigError, GridSize, NullRenderer, Timing,
};
use forest_engine::{Forest, ForestConfig, Stats};
use forest_world::query;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hook {
    Reset(GridSize),
    Grow(CellCoord),
    Mature(CellCoord),
    KillStart(CellCoord),
    Wither(CellCoord),
    Vanish(CellCoord),
}

#[derive(Debug, Default)]
struct Recorder {
    hooks: Vec<Hook>,
}

impl CellRenderer for Recorder {
    fn render_grow(&mut self, cell: CellCoord) {
        self.hooks.push(Hook::Grow(cell));
    }

    fn render_kill_start(&mut self, cell: CellCoord) {
        self.hooks.push(Hook::KillStart(cell));
    }

    fn render_vanish(&mut self, cell: CellCoord) {
        self.hooks.push(Hook::Vanish(cell));
    }

    fn render_mature(&mut self, cell: CellCoord) {
        self.hooks.push(Hook::Mature(cell));
    }

    fn render_wither(&mut self, cell: CellCoord) {
        self.hooks.push(Hook::Wither(cell));
    }

    fn render_reset(&mut self, grid: GridSize) {
        self.hooks.push(Hook::Reset(grid));
    }
}

fn config(columns: u32, rows: u32, kill_rate: f64, seed: u64) -> ForestConfig {
    ForestConfig {
        kill_rate,
        seed: Some(seed),
        ..ForestConfig::new(GridSize::new(columns, rows))
    }
}

fn forest(config: ForestConfig) -> Forest<Recorder> {
    Forest::new(config, Recorder::default()).expect("valid configuration")
}

fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}

fn assert_forest_invariants(forest: &Forest<Recorder>) {
    let world = forest.world();
    let alive = query::alive_cells(world);
    let mothers = query::mothers(world);

    let mut unique_alive = alive.to_vec();
    unique_alive.sort();
    unique_alive.dedup();
    assert_eq!(unique_alive.len(), alive.len(), "duplicate alive entries");

    let mut unique_mothers = mothers.to_vec();
    unique_mothers.sort();
    unique_mothers.dedup();
    assert_eq!(unique_mothers.len(), mothers.len(), "duplicate mothers");

    for mother in mothers {
        assert!(alive.contains(mother), "mother {mother:?} is not alive");
    }
    for cell in query::grid(world).cells() {
        if query::cell_state(world, cell) == CellState::Alive {
            assert!(alive.contains(&cell), "{cell:?} alive but uncommitted");
        }
    }
}

#[test]
fn new_forest_stays_idle_until_started() {
    let mut forest = forest(config(6, 4, 0.0, 1));
    assert!(!forest.is_running());
    assert!(!forest.is_active());

    forest.advance(millis(500));

    assert_eq!(forest.stats(), Stats::default());
    assert!(query::alive_cells(forest.world()).is_empty());
    assert_eq!(
        forest.renderer().hooks,
        vec![Hook::Reset(GridSize::new(6, 4))]
    );
}

#[test]
fn sets_stay_consistent_over_a_long_run() {
    let mut forest = forest(config(12, 8, 0.05, 7));
    forest.start();

    for _ in 0..3_000 {
        forest.advance(millis(10));
        assert_forest_invariants(&forest);
    }

    let stats = forest.stats();
    assert!(stats.grown > 0);
    assert!(stats.outbreaks_started > 0);
    assert!(stats.killed > 0);
}

#[test]
fn stop_lets_the_current_iteration_finish() {
    let mut forest = forest(config(6, 6, 0.0, 5));
    forest.start();
    forest.advance(Duration::ZERO);

    let planted = match forest.renderer().hooks.last() {
        Some(Hook::Grow(cell)) => *cell,
        other => panic!("expected a planted tree, found {other:?}"),
    };
    assert!(query::mothers(forest.world()).is_empty());

    forest.stop();
    assert!(!forest.is_running());
    assert!(forest.is_active());

    forest.toggle();
    assert!(!forest.is_running(), "toggle while winding down is ignored");

    forest.advance(millis(50));
    assert!(!forest.is_active());
    assert_eq!(query::alive_cells(forest.world()), &[planted]);
    assert_eq!(query::mothers(forest.world()), &[planted]);
    assert_eq!(forest.stats().ticks, 1);

    forest.advance(millis(500));
    assert_eq!(forest.stats().ticks, 1);

    forest.toggle();
    assert!(forest.is_running());
    assert!(forest.is_active());
    forest.toggle();
    assert!(!forest.is_running());
}

#[test]
fn start_rearms_a_loop_that_is_winding_down() {
    let mut forest = forest(config(6, 6, 0.0, 9));
    forest.start();
    forest.advance(Duration::ZERO);
    forest.stop();
    forest.start();

    forest.advance(millis(50));
    assert!(forest.is_active());
    assert!(forest.stats().ticks >= 1);
}

#[test]
fn growthless_iterations_respect_the_tick_cap() {
    let mut forest = forest(ForestConfig {
        max_ticks_per_step: 5,
        ..config(1, 1, 0.0, 3)
    });
    forest.start();

    forest.advance(Duration::ZERO);
    assert_eq!(forest.stats().ticks, 0);

    forest.advance(millis(50));
    assert_eq!(forest.stats().ticks, 6);

    forest.advance(Duration::ZERO);
    assert_eq!(forest.stats().ticks, 11);
}

#[test]
fn certain_kill_rate_strikes_the_first_tree() {
    let mut forest = forest(config(6, 6, 1.0, 11));
    forest.start();
    forest.advance(Duration::ZERO);
    forest.advance(millis(50));

    let stats = forest.stats();
    assert_eq!(stats.grown, 1);
    assert_eq!(stats.killed, 1);
    assert!(stats.outbreaks_started >= 1);

    let hooks = &forest.renderer().hooks;
    let Some(Hook::Mature(tree)) = hooks.iter().find(|hook| matches!(hook, Hook::Mature(_)))
    else {
        panic!("no tree matured");
    };
    assert!(hooks.contains(&Hook::KillStart(*tree)));
    assert_eq!(
        query::cell_state(forest.world(), *tree),
        CellState::Dying
    );
}

fn matured_and_struck(hooks: &[Hook]) -> (Vec<CellCoord>, Vec<CellCoord>) {
    let matured = hooks
        .iter()
        .filter_map(|hook| match hook {
            Hook::Mature(cell) => Some(*cell),
            _ => None,
        })
        .collect();
    let struck = hooks
        .iter()
        .filter_map(|hook| match hook {
            Hook::KillStart(cell) => Some(*cell),
            _ => None,
        })
        .collect();
    (matured, struck)
}

#[test]
fn outbreaks_start_on_living_trees_only() {
    for seed in 0..50 {
        let mut forest = forest(config(3, 1, 1.0, seed));
        forest.start();
        forest.advance(Duration::ZERO);
        forest.advance(millis(100));

        let (matured, struck) = matured_and_struck(&forest.renderer().hooks);
        let &[dying, living] = matured.as_slice() else {
            panic!("seed {seed}: expected two matured trees, found {matured:?}");
        };
        assert_eq!(struck, vec![dying, living], "seed {seed}");
        assert_eq!(query::cell_state(forest.world(), dying), CellState::Dying);
        assert_eq!(query::cell_state(forest.world(), living), CellState::Dying);
        assert_eq!(forest.stats().outbreaks_started, 2, "seed {seed}");
        assert_eq!(forest.stats().killed, 2, "seed {seed}");
    }
}

#[test]
fn step_size_does_not_change_the_outcome() {
    let runs = [
        config(20, 20, 0.0, 5),
        ForestConfig {
            max_ticks_per_step: 1_000,
            ..config(12, 12, 0.3, 8)
        },
    ];
    for config in runs {
        let mut whole = forest(config);
        whole.start();
        whole.advance(millis(1_000));

        let mut sliced = forest(config);
        sliced.start();
        for _ in 0..20 {
            sliced.advance(millis(50));
        }

        assert!(whole.stats().grown >= 15, "{:?}", whole.stats());
        assert_eq!(whole.stats(), sliced.stats());
        assert_eq!(whole.renderer().hooks, sliced.renderer().hooks);
        assert_eq!(
            query::alive_cells(whole.world()),
            query::alive_cells(sliced.world())
        );
        assert_eq!(
            query::mothers(whole.world()),
            query::mothers(sliced.world())
        );
    }
}

#[test]
fn renderer_receives_the_whole_lifecycle() {
    let mut forest = forest(config(1, 1, 1.0, 21));
    let cell = CellCoord::new(0, 0);
    forest.start();
    forest.advance(Duration::ZERO);
    forest.advance(millis(50));
    forest.stop();

    forest.advance(millis(100));
    forest.advance(millis(400));

    assert_eq!(
        forest.renderer().hooks,
        vec![
            Hook::Reset(GridSize::new(1, 1)),
            Hook::Grow(cell),
            Hook::Mature(cell),
            Hook::KillStart(cell),
            Hook::Wither(cell),
            Hook::Vanish(cell),
        ]
    );
    assert!(query::alive_cells(forest.world()).is_empty());
    assert_eq!(forest.outbreaks_in_flight(), 0);
    assert_eq!(
        forest.stats().outbreaks_started,
        forest.stats().outbreaks_contained
    );
}

#[test]
fn configure_resets_trees_outbreaks_and_counters() {
    let mut forest = forest(config(8, 8, 0.2, 13));
    forest.start();
    for _ in 0..200 {
        forest.advance(millis(10));
    }
    assert!(forest.stats().ticks > 0);

    let grid = GridSize::new(4, 3);
    forest
        .configure(ForestConfig {
            timing: Timing::immediate(),
            ..config(4, 3, 0.0, 1)
        })
        .expect("valid configuration");

    assert!(!forest.is_running());
    assert!(!forest.is_active());
    assert_eq!(forest.stats(), Stats::default());
    assert_eq!(forest.outbreaks_in_flight(), 0);
    assert_eq!(query::grid(forest.world()), grid);
    assert!(query::alive_cells(forest.world()).is_empty());
    assert_eq!(query::pending_transitions(forest.world()), 0);
    assert_eq!(forest.renderer().hooks.last(), Some(&Hook::Reset(grid)));
}

#[test]
fn rejected_configuration_leaves_the_forest_untouched() {
    let mut forest = forest(config(5, 5, 0.0, 17));
    forest.start();
    forest.advance(Duration::ZERO);
    forest.advance(millis(50));
    let before = forest.stats();

    let result = forest.configure(ForestConfig {
        kill_rate: 2.0,
        ..ForestConfig::default()
    });

    assert_eq!(result, Err(ConfigError::InvalidKillRate(2.0)));
    assert_eq!(forest.config().grid, GridSize::new(5, 5));
    assert_eq!(forest.stats(), before);
    assert!(forest.is_running());
    assert!(!query::alive_cells(forest.world()).is_empty());
}

#[test]
fn seeded_forests_replay_identically() {
    let run = |seed| {
        let mut forest = forest(config(10, 10, 0.05, seed));
        forest.start();
        for _ in 0..500 {
            forest.advance(millis(10));
        }
        (forest.stats(), forest.renderer().hooks.clone())
    };

    assert_eq!(run(42), run(42));
}

#[test]
fn unseeded_forest_grows_without_a_renderer() {
    let config = ForestConfig {
        kill_rate: 0.0,
        ..ForestConfig::new(GridSize::new(10, 10))
    };
    let mut forest = Forest::new(config, NullRenderer).expect("valid configuration");
    forest.start();
    for _ in 0..20 {
        forest.advance(millis(50));
    }

    assert!(forest.stats().grown > 0);
    assert!(!query::mothers(forest.world()).is_empty());
}
