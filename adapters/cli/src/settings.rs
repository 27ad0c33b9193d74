//! Command-line flags, the optional TOML file, and how they combine.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use forest_core::{GridSize, Timing};
use forest_engine::ForestConfig;
use serde::Deserialize;

const DEFAULT_FRAME_MS: u64 = 20;

/// Grow a forest in the terminal and watch disease thin it out.
///
/// Press Enter to pause or resume growth, `q` then Enter to quit.
#[derive(Debug, Default, Parser)]
#[command(name = "forest", version)]
pub(crate) struct Args {
    /// TOML file providing defaults for every other option.
    #[arg(long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,
    /// Grid width in cells.
    #[arg(long)]
    pub(crate) columns: Option<u32>,
    /// Grid height in cells.
    #[arg(long)]
    pub(crate) rows: Option<u32>,
    /// Milliseconds a planted tree takes to mature.
    #[arg(long)]
    pub(crate) growth_ms: Option<u64>,
    /// Milliseconds a struck tree takes to die.
    #[arg(long)]
    pub(crate) death_ms: Option<u64>,
    /// Milliseconds a dead tree takes to vanish.
    #[arg(long)]
    pub(crate) vanish_ms: Option<u64>,
    /// Probability that an iteration starts an outbreak.
    #[arg(long)]
    pub(crate) kill_rate: Option<f64>,
    /// Growth plans allowed per frame.
    #[arg(long)]
    pub(crate) max_ticks_per_step: Option<u32>,
    /// Seed for a reproducible run.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Milliseconds between frames.
    #[arg(long)]
    pub(crate) frame_ms: Option<u64>,
    /// Exit after this many frames.
    #[arg(long)]
    pub(crate) frames: Option<u64>,
    /// Do not draw the canvas.
    #[arg(long)]
    pub(crate) quiet: bool,
    /// Start idle; press Enter to begin growing.
    #[arg(long)]
    pub(crate) paused: bool,
}

/// Values accepted from a `--config` file.
#[derive(Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    columns: Option<u32>,
    rows: Option<u32>,
    growth_ms: Option<u64>,
    death_ms: Option<u64>,
    vanish_ms: Option<u64>,
    kill_rate: Option<f64>,
    max_ticks_per_step: Option<u32>,
    seed: Option<u64>,
    frame_ms: Option<u64>,
    frames: Option<u64>,
}

/// Fully resolved run parameters.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Settings {
    pub(crate) forest: ForestConfig,
    pub(crate) frame: Duration,
    pub(crate) frames: Option<u64>,
    pub(crate) quiet: bool,
    pub(crate) paused: bool,
}

/// Loads the config file named by the flags, if any, and merges the two.
pub(crate) fn resolve(args: &Args) -> Result<Settings> {
    let file = match &args.config {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            parse_file(&contents)
                .with_context(|| format!("invalid config file {}", path.display()))?
        }
        None => FileConfig::default(),
    };
    merge(args, &file)
}

fn parse_file(contents: &str) -> Result<FileConfig> {
    toml::from_str(contents).context("failed to parse forest config toml contents")
}

/// Combines flags with file values; flags win, defaults fill the rest.
fn merge(args: &Args, file: &FileConfig) -> Result<Settings> {
    let defaults = ForestConfig::default();
    let default_timing = Timing::default();
    let millis = |flag: Option<u64>, file: Option<u64>, fallback: Duration| {
        flag.or(file).map_or(fallback, Duration::from_millis)
    };

    let forest = ForestConfig {
        grid: GridSize::new(
            args.columns
                .or(file.columns)
                .unwrap_or(defaults.grid.columns()),
            args.rows.or(file.rows).unwrap_or(defaults.grid.rows()),
        ),
        timing: Timing::new(
            millis(args.growth_ms, file.growth_ms, default_timing.growth),
            millis(args.death_ms, file.death_ms, default_timing.death),
            millis(args.vanish_ms, file.vanish_ms, default_timing.vanish),
        ),
        kill_rate: args
            .kill_rate
            .or(file.kill_rate)
            .unwrap_or(defaults.kill_rate),
        max_ticks_per_step: args
            .max_ticks_per_step
            .or(file.max_ticks_per_step)
            .unwrap_or(defaults.max_ticks_per_step),
        seed: args.seed.or(file.seed),
    };
    forest
        .validate()
        .context("invalid forest configuration")?;

    let frame_ms = args
        .frame_ms
        .or(file.frame_ms)
        .unwrap_or(DEFAULT_FRAME_MS);
    if frame_ms == 0 {
        bail!("frame interval must be at least one millisecond");
    }

    Ok(Settings {
        forest,
        frame: Duration::from_millis(frame_ms),
        frames: args.frames.or(file.frames),
        quiet: args.quiet,
        paused: args.paused,
    })
}
