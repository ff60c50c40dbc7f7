//! Conway's Game of Life where every cell is its own task.
//!
//! Cells exchange states with their neighbors over bounded channels and a
//! controller barrier-synchronizes each generation in three phases (ready,
//! commit, report) before publishing a consistent snapshot. A worker-pool
//! engine and a sequential reference share the same [`Simulation`] surface,
//! which the [`Driver`] ticks at a fixed cadence.

pub mod cell;
pub mod config;
pub mod controller;
pub mod driver;
pub mod engine;
pub mod error;
pub mod grid;
pub mod patterns;
pub mod pool;
pub mod reference;
pub mod render;
pub mod rules;
pub mod wiring;

pub use config::{Args, SimConfig};
pub use controller::{ActorSystem, Controller, RoundStats};
pub use driver::{Driver, DriverReport, Frame, StopReason, TickObserver};
pub use engine::{EngineKind, ShutdownReport, Simulation};
pub use error::{ConfigError, Phase, RenderError, SimError};
pub use grid::{Coord, CycleDetector, Grid, Markers};
pub use patterns::{PATTERNS, Pattern, Seeding};
pub use pool::WorkerPool;
pub use reference::Sequential;
pub use render::{FrameSnapshot, SnapshotPublisher, TerminalRenderer};
