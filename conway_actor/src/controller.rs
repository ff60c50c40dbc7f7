// controller.rs - Round barrier and snapshot aggregation for the cell actors

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cell::{CellActor, CellInfo, ControlLinks};
use crate::engine::{ShutdownReport, Simulation};
use crate::error::{Phase, SimError};
use crate::grid::{Coord, Grid};
use crate::wiring::{Adjacency, wire};

/// Message counts observed by one `transit()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoundStats {
    /// Completed rounds including this one; the bootstrap round is 1.
    pub round: u64,
    pub ready: usize,
    pub commits: usize,
    pub reports: usize,
}

/// Barrier synchronizer and aggregator. Owns the snapshot exclusively.
#[derive(Debug)]
pub struct Controller {
    snapshot: Grid,
    cells: usize,
    ready: mpsc::Receiver<()>,
    commits: Vec<(Coord, mpsc::Sender<()>)>,
    reports: mpsc::Receiver<CellInfo>,
    seen: Vec<bool>,
    rounds: u64,
}

impl Controller {
    /// Run one three-phase round.
    pub async fn transit(&mut self) -> Result<RoundStats, SimError> {
        let round = self.rounds + 1;
        let expected = self.cells;
        let mut stats = RoundStats {
            round,
            ..RoundStats::default()
        };

        // Phase 1: every cell has finished collecting and computing
        while stats.ready < expected {
            if self.ready.recv().await.is_none() {
                return Err(SimError::Disconnected {
                    phase: Phase::Ready,
                    round,
                    received: stats.ready,
                    expected,
                });
            }
            stats.ready += 1;
        }

        // Phase 2: release each cell through its own mailbox
        for (coord, tx) in &self.commits {
            match tx.try_send(()) {
                Ok(()) => stats.commits += 1,
                Err(TrySendError::Full(())) => return Err(SimError::CommitBacklog { coord: *coord }),
                Err(TrySendError::Closed(())) => {
                    return Err(SimError::Disconnected {
                        phase: Phase::Commit,
                        round,
                        received: stats.commits,
                        expected,
                    });
                }
            }
        }

        // Phase 3: aggregate keyed by coordinate
        self.seen.fill(false);
        while stats.reports < expected {
            let Some(info) = self.reports.recv().await else {
                return Err(SimError::Disconnected {
                    phase: Phase::Report,
                    round,
                    received: stats.reports,
                    expected,
                });
            };
            if !self.snapshot.contains(info.coord) {
                return Err(SimError::OutOfBounds {
                    coord: info.coord,
                    rows: self.snapshot.rows(),
                    cols: self.snapshot.cols(),
                });
            }
            let index = self.snapshot.index_of(info.coord);
            if std::mem::replace(&mut self.seen[index], true) {
                return Err(SimError::DuplicateReport { coord: info.coord, round });
            }
            self.snapshot.set(info.coord, info.alive);
            stats.reports += 1;
        }

        self.rounds = round;
        Ok(stats)
    }

    pub fn snapshot(&self) -> &Grid {
        &self.snapshot
    }

    /// Completed rounds, bootstrap included.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}

/// The cell actors plus their controller.
#[derive(Debug)]
pub struct ActorSystem {
    controller: Controller,
    tasks: JoinSet<()>,
    token: CancellationToken,
}

impl ActorSystem {
    /// Wire the grid, spawn one actor per cell and run the bootstrap round
    /// so that the snapshot holds `initial` when this returns.
    pub async fn launch(initial: &Grid) -> Result<Self, SimError> {
        let adjacency = Adjacency::for_grid(initial)?;
        let neighbor_links = wire(&adjacency)?;
        let n = adjacency.cell_count();

        let (ready_tx, ready_rx) = mpsc::channel(n);
        let (report_tx, report_rx) = mpsc::channel(n);
        let token = CancellationToken::new();

        let mut tasks = JoinSet::new();
        let mut commits = Vec::with_capacity(n);
        for links in neighbor_links {
            let coord = links.coord;
            let (commit_tx, commit_rx) = mpsc::channel(1);
            commits.push((coord, commit_tx));

            let control = ControlLinks {
                ready: ready_tx.clone(),
                commit: commit_rx,
                report: report_tx.clone(),
            };
            let actor = CellActor::new(links, initial.get(coord), control, token.clone());
            tasks.spawn(actor.run());
        }
        drop(ready_tx);
        drop(report_tx);

        let mut snapshot = initial.clone();
        snapshot.clear();
        let mut system = Self {
            controller: Controller {
                snapshot,
                cells: n,
                ready: ready_rx,
                commits,
                reports: report_rx,
                seen: vec![false; n],
                rounds: 0,
            },
            tasks,
            token,
        };

        let stats = system.controller.transit().await?;
        info!(
            rows = adjacency.rows(),
            cols = adjacency.cols(),
            tasks = system.tasks.len(),
            alive = system.controller.snapshot().live_count(),
            round = stats.round,
            "cell actors launched"
        );
        Ok(system)
    }

    /// One round of the protocol with its message counts.
    pub async fn transit(&mut self) -> Result<RoundStats, SimError> {
        self.controller.transit().await
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Actor tasks still running.
    pub fn live_tasks(&self) -> usize {
        self.tasks.len()
    }
}

impl Simulation for ActorSystem {
    async fn step(&mut self) -> Result<u64, SimError> {
        self.transit().await?;
        Ok(self.generation())
    }

    fn snapshot(&self) -> &Grid {
        self.controller.snapshot()
    }

    fn generation(&self) -> u64 {
        // the bootstrap round publishes generation 0
        self.controller.rounds().saturating_sub(1)
    }

    async fn shutdown(mut self) -> ShutdownReport {
        self.token.cancel();
        let mut report = ShutdownReport::default();
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(()) => report.joined += 1,
                Err(err) => {
                    warn!(error = %err, "cell task failed");
                    report.failed += 1;
                }
            }
        }
        debug!(joined = report.joined, failed = report.failed, "cell actors stopped");
        report
    }
}
