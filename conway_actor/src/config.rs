// config.rs - Command-line arguments and validated simulation settings

use std::num::NonZeroUsize;
use std::thread;
use std::time::Duration;

use clap::Parser;

use crate::engine::EngineKind;
use crate::error::ConfigError;
use crate::grid::{Grid, Markers};
use crate::patterns::Seeding;

#[derive(Debug, Parser)]
#[command(name = "conway_actor", about = "Game of Life with one concurrent actor per cell")]
pub struct Args {
    /// Grid rows
    #[arg(long, default_value_t = 150)]
    pub rows: usize,

    /// Grid columns
    #[arg(long, default_value_t = 200)]
    pub cols: usize,

    /// Target time between rounds, in milliseconds
    #[arg(long, default_value_t = 20)]
    pub interval_ms: u64,

    /// actor, pool or sequential
    #[arg(long, default_value_t = EngineKind::Actor)]
    pub engine: EngineKind,

    /// Worker count for the pool engine (defaults to available parallelism)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Start from a named pattern instead of random cells
    #[arg(long, conflicts_with_all = ["density", "seed"])]
    pub pattern: Option<String>,

    /// Probability that a cell starts alive
    #[arg(long, default_value_t = 0.5)]
    pub density: f64,

    /// Seed for the random initial state
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop after this many generations
    #[arg(long)]
    pub generations: Option<u64>,

    /// Stop once a generation repeats one of the last ten
    #[arg(long)]
    pub stop_on_cycle: bool,

    /// Abort if a single round takes longer than this, in milliseconds
    #[arg(long)]
    pub round_timeout_ms: Option<u64>,

    /// Marker for live cells
    #[arg(long, default_value_t = '*')]
    pub alive: char,

    /// Marker for dead cells
    #[arg(long, default_value_t = ' ')]
    pub dead: char,

    /// Do not clear the terminal before each frame
    #[arg(long)]
    pub no_clear: bool,

    /// Do not print the round duration under each frame
    #[arg(long)]
    pub quiet_duration: bool,
}

/// Everything needed to start a run, checked up front.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub rows: usize,
    pub cols: usize,
    pub interval: Duration,
    pub engine: EngineKind,
    pub workers: usize,
    pub seeding: Seeding,
    pub max_generations: Option<u64>,
    pub stop_on_cycle: bool,
    pub round_timeout: Option<Duration>,
    pub markers: Markers,
    pub clear_screen: bool,
    pub show_duration: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rows: 150,
            cols: 200,
            interval: Duration::from_millis(20),
            engine: EngineKind::Actor,
            workers: default_workers(),
            seeding: Seeding::default(),
            max_generations: None,
            stop_on_cycle: false,
            round_timeout: None,
            markers: Markers::default(),
            clear_screen: true,
            show_duration: true,
        }
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::EmptyGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.round_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroRoundTimeout);
        }
        if let Seeding::Random { density, .. } = self.seeding {
            if !(0.0..=1.0).contains(&density) {
                return Err(ConfigError::Density(density));
            }
        }
        Ok(())
    }

    /// The generation-0 grid described by `seeding`.
    pub fn initial_grid(&self) -> Result<Grid, ConfigError> {
        self.validate()?;
        self.seeding.initial_grid(self.rows, self.cols)
    }
}

impl TryFrom<Args> for SimConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let seeding = match args.pattern {
            Some(name) => Seeding::Pattern(name),
            None => Seeding::Random {
                density: args.density,
                seed: args.seed,
            },
        };
        let config = SimConfig {
            rows: args.rows,
            cols: args.cols,
            interval: Duration::from_millis(args.interval_ms),
            engine: args.engine,
            workers: args.workers.unwrap_or_else(default_workers),
            seeding,
            max_generations: args.generations,
            stop_on_cycle: args.stop_on_cycle,
            round_timeout: args.round_timeout_ms.map(Duration::from_millis),
            markers: Markers {
                alive: args.alive,
                dead: args.dead,
            },
            clear_screen: !args.no_clear,
            show_duration: !args.quiet_duration,
        };
        config.validate()?;
        Ok(config)
    }
}
