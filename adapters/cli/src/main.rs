#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that grows a forest on a text canvas.

mod canvas;
mod settings;

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use forest_engine::Forest;
use forest_world::query;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::{self, Instant, MissedTickBehavior},
};
use tracing_subscriber::EnvFilter;

use crate::{
    canvas::Canvas,
    settings::{Args, Settings},
};

/// Clears the terminal and homes the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Entry point for the forest command-line interface.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let settings = settings::resolve(&args)?;

    let mut forest = Forest::new(settings.forest, Canvas::default())
        .context("failed to build the forest")?;
    if !settings.paused {
        forest.start();
    }

    run(&mut forest, &settings).await?;

    let stats = forest.stats();
    println!(
        "ticks: {}  grown: {}  killed: {}  outbreaks: {} started, {} contained",
        stats.ticks,
        stats.grown,
        stats.killed,
        stats.outbreaks_started,
        stats.outbreaks_contained
    );
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Drives the forest in real time until the frame limit, `q`, or Ctrl-C.
async fn run(forest: &mut Forest<Canvas>, settings: &Settings) -> Result<()> {
    let mut frames = time::interval(settings.frame);
    frames.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let mut last_frame = Instant::now();
    let mut drawn = 0_u64;

    loop {
        tokio::select! {
            now = frames.tick() => {
                forest.advance(now.duration_since(last_frame));
                last_frame = now;
                if !settings.quiet {
                    draw(forest).context("failed to draw the canvas")?;
                }
                drawn += 1;
                if settings.frames.map_or(false, |limit| drawn >= limit) {
                    return Ok(());
                }
            }
            line = input.next_line(), if input_open => {
                match line.context("failed to read from stdin")? {
                    Some(line) if line.trim().eq_ignore_ascii_case("q") => return Ok(()),
                    Some(_) => forest.toggle(),
                    None => input_open = false,
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                return Ok(());
            }
        }
    }
}

fn draw(forest: &Forest<Canvas>) -> io::Result<()> {
    let state = if forest.is_running() {
        "growing"
    } else if forest.is_active() {
        "stopping"
    } else {
        "paused"
    };
    let mut stdout = io::stdout().lock();
    write!(stdout, "{CLEAR_SCREEN}{}", forest.renderer().render())?;
    writeln!(
        stdout,
        "\n[{state}] trees: {}  outbreaks: {}  (Enter toggles, q quits)",
        query::alive_cells(forest.world()).len(),
        forest.outbreaks_in_flight()
    )?;
    stdout.flush()
}
