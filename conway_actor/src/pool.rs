// pool.rs - Worker pool over double-buffered state
//
// The large-grid alternative to one task per cell. Each worker owns a
// contiguous batch of cell indices and, per round, reads the old generation
// and writes its batch of the new one. Two barriers bracket the round; a
// worker never reads the buffer being written in the same round.

use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Barrier;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{ShutdownReport, Simulation};
use crate::error::{ConfigError, SimError};
use crate::grid::Grid;
use crate::rules::next_state;
use crate::wiring::Adjacency;

struct Shared {
    adjacency: Adjacency,
    buffers: [Vec<AtomicBool>; 2],
    round_start: Barrier,
    round_end: Barrier,
}

impl Shared {
    fn compute(&self, range: Range<usize>, parity: usize) {
        let (src, dst) = (&self.buffers[parity], &self.buffers[parity ^ 1]);
        for index in range {
            let alive_neighbors = self
                .adjacency
                .neighbors(index)
                .iter()
                .filter(|&&n| src[n].load(Ordering::Relaxed))
                .count();
            let alive = src[index].load(Ordering::Relaxed);
            dst[index].store(next_state(alive, alive_neighbors), Ordering::Relaxed);
        }
    }
}

/// Contiguous batches covering `0..cells`, at most `workers` of them.
fn batches(cells: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.clamp(1, cells.max(1));
    let size = cells.div_ceil(workers);
    (0..cells).step_by(size).map(|start| start..(start + size).min(cells)).collect()
}

async fn worker(shared: Arc<Shared>, range: Range<usize>, token: CancellationToken) {
    let mut parity = 0;
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = shared.round_start.wait() => {}
        }
        shared.compute(range.clone(), parity);
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = shared.round_end.wait() => {}
        }
        parity ^= 1;
    }
    debug!(start = range.start, end = range.end, "pool worker stopped");
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    snapshot: Grid,
    parity: usize,
    generation: u64,
    tasks: JoinSet<()>,
    token: CancellationToken,
}

impl WorkerPool {
    /// Spawn up to `workers` workers over `initial`. Needs a tokio runtime.
    pub fn launch(initial: &Grid, workers: usize) -> Result<Self, ConfigError> {
        if workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        let adjacency = Adjacency::for_grid(initial)?;
        let ranges = batches(adjacency.cell_count(), workers);

        let front = initial.cells().iter().map(|&a| AtomicBool::new(a)).collect();
        let back = initial.cells().iter().map(|_| AtomicBool::new(false)).collect();
        let shared = Arc::new(Shared {
            adjacency,
            buffers: [front, back],
            round_start: Barrier::new(ranges.len() + 1),
            round_end: Barrier::new(ranges.len() + 1),
        });

        let token = CancellationToken::new();
        let mut tasks = JoinSet::new();
        for range in &ranges {
            tasks.spawn(worker(Arc::clone(&shared), range.clone(), token.clone()));
        }

        info!(
            rows = initial.rows(),
            cols = initial.cols(),
            workers = ranges.len(),
            "worker pool launched"
        );
        Ok(Self {
            shared,
            snapshot: initial.clone(),
            parity: 0,
            generation: 0,
            tasks,
            token,
        })
    }

    pub fn workers(&self) -> usize {
        self.tasks.len()
    }
}

impl Simulation for WorkerPool {
    async fn step(&mut self) -> Result<u64, SimError> {
        let round = self.generation + 1;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(SimError::Cancelled { round }),
            _ = self.shared.round_start.wait() => {}
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => return Err(SimError::Cancelled { round }),
            _ = self.shared.round_end.wait() => {}
        }
        self.parity ^= 1;

        let front = &self.shared.buffers[self.parity];
        for (cell, atom) in self.snapshot.cells_mut().iter_mut().zip(front) {
            *cell = atom.load(Ordering::Relaxed);
        }
        self.generation = round;
        Ok(round)
    }

    fn snapshot(&self) -> &Grid {
        &self.snapshot
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    async fn shutdown(mut self) -> ShutdownReport {
        self.token.cancel();
        let mut report = ShutdownReport::default();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(()) => report.joined += 1,
                Err(err) => {
                    warn!(error = %err, "pool worker failed");
                    report.failed += 1;
                }
            }
        }
        report
    }
}
