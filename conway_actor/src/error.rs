// error.rs - Error types for the simulation core

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::grid::Coord;

/// Startup problems. All of them are detected before any task is spawned.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid must have at least one row and one column (got {rows}x{cols})")]
    EmptyGrid { rows: usize, cols: usize },

    #[error("mailbox of cell {coord} has capacity {capacity} but {inbound} inbound edges and {neighbors} neighbors")]
    CapacityMismatch {
        coord: Coord,
        capacity: usize,
        inbound: usize,
        neighbors: usize,
    },

    #[error("worker pool needs at least one worker")]
    NoWorkers,

    #[error("round timeout must be longer than zero")]
    ZeroRoundTimeout,

    #[error("density must lie in [0, 1] (got {0})")]
    Density(f64),

    #[error("unknown pattern {0:?}")]
    UnknownPattern(String),

    #[error("pattern {name} needs {needed_rows}x{needed_cols} but the grid is {rows}x{cols}")]
    PatternTooLarge {
        name: &'static str,
        needed_rows: usize,
        needed_cols: usize,
        rows: usize,
        cols: usize,
    },

    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unexpected character {ch:?} at row {row}, column {col}")]
    BadCell { ch: char, row: usize, col: usize },
}

/// The three phases of a controller round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Ready,
    Commit,
    Report,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Ready => "ready",
            Phase::Commit => "commit",
            Phase::Report => "report",
        })
    }
}

/// Runtime failures of a simulation engine. None of these is retried: a
/// round that fails has no partial state worth resuming.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{phase} channel closed after {received} of {expected} messages in round {round}")]
    Disconnected {
        phase: Phase,
        round: u64,
        received: usize,
        expected: usize,
    },

    #[error("commit mailbox of cell {coord} still holds an event from an earlier round")]
    CommitBacklog { coord: Coord },

    #[error("cell {coord} reported twice in round {round}")]
    DuplicateReport { coord: Coord, round: u64 },

    #[error("report for {coord} lies outside the {rows}x{cols} grid")]
    OutOfBounds { coord: Coord, rows: usize, cols: usize },

    #[error("round {round} did not finish within {timeout:?}")]
    Stalled { round: u64, timeout: Duration },

    #[error("engine was cancelled in the middle of round {round}")]
    Cancelled { round: u64 },
}

/// A frame could not be delivered to its sink.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write frame: {0}")]
    Io(#[from] std::io::Error),

    #[error("frame receiver has gone away")]
    Closed,
}
