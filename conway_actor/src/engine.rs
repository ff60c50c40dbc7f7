// engine.rs - The surface the driver ticks, shared by every engine

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use crate::error::SimError;
use crate::grid::Grid;

/// A steppable Game of Life engine.
///
/// `snapshot()` is only meaningful between steps; every engine finishes a
/// whole generation before `step()` resolves.
pub trait Simulation {
    /// Advance one generation; resolves to the generation now in the snapshot.
    fn step(&mut self) -> impl Future<Output = Result<u64, SimError>> + Send;

    fn snapshot(&self) -> &Grid;

    /// Generation currently held by the snapshot; the initial grid is 0.
    fn generation(&self) -> u64;

    /// Stop every task the engine owns and wait for them.
    fn shutdown(self) -> impl Future<Output = ShutdownReport> + Send;
}

/// Tasks reaped by `Simulation::shutdown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub joined: usize,
    pub failed: usize,
}

/// Which engine computes the generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineKind {
    /// One task per cell, barrier-synchronized by a controller.
    #[default]
    Actor,
    /// A fixed worker pool over double-buffered state.
    Pool,
    /// Single-threaded reference.
    Sequential,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Actor => "actor",
            EngineKind::Pool => "pool",
            EngineKind::Sequential => "sequential",
        })
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "actor" | "actors" => Ok(EngineKind::Actor),
            "pool" => Ok(EngineKind::Pool),
            "sequential" | "seq" => Ok(EngineKind::Sequential),
            other => Err(format!("unknown engine {other:?} (expected actor, pool or sequential)")),
        }
    }
}
