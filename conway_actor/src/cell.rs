// cell.rs - One actor per grid coordinate
//
// A cell owns its state and talks to the world only through channels:
// neighbor mailboxes for the broadcast/collect exchange, and the three
// controller channels (ready, commit, report) for the round barrier.

use std::future::Future;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::grid::Coord;
use crate::rules::next_state;
use crate::wiring::NeighborLinks;

/// What a cell tells the controller after committing a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellInfo {
    pub coord: Coord,
    pub alive: bool,
}

/// Controller-side channel ends a cell is connected to.
#[derive(Debug)]
pub struct ControlLinks {
    pub ready: mpsc::Sender<()>,
    pub commit: mpsc::Receiver<()>,
    pub report: mpsc::Sender<CellInfo>,
}

#[derive(Debug)]
pub struct CellActor {
    coord: Coord,
    alive: bool,
    outbound: Vec<mpsc::Sender<bool>>,
    mailbox: Option<mpsc::Receiver<bool>>,
    degree: usize,
    control: ControlLinks,
    token: CancellationToken,
}

/// Await `fut` unless `token` fires first.
async fn until_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = fut => Some(out),
    }
}

impl CellActor {
    pub fn new(
        links: NeighborLinks,
        alive: bool,
        control: ControlLinks,
        token: CancellationToken,
    ) -> Self {
        Self {
            coord: links.coord,
            alive,
            outbound: links.outbound,
            mailbox: links.mailbox,
            degree: links.degree,
            control,
            token,
        }
    }

    /// Run the protocol until cancelled or until a peer channel closes.
    pub async fn run(mut self) {
        let mut rounds = 0u64;
        if self.bootstrap().await.is_some() {
            while self.round().await.is_some() {
                rounds += 1;
            }
        }
        trace!(x = self.coord.x, y = self.coord.y, rounds, "cell stopped");
    }

    /// Round 0: publish the initial state without computing anything.
    async fn bootstrap(&mut self) -> Option<()> {
        self.signal_ready().await?;
        self.await_commit().await?;
        self.report().await
    }

    async fn round(&mut self) -> Option<()> {
        self.broadcast().await?;
        let alive_neighbors = self.collect().await?;
        let next = next_state(self.alive, alive_neighbors);
        self.signal_ready().await?;
        self.await_commit().await?;
        self.alive = next;
        self.report().await
    }

    /// One send per outbound edge.
    async fn broadcast(&self) -> Option<()> {
        for tx in &self.outbound {
            until_cancelled(&self.token, tx.send(self.alive)).await?.ok()?;
        }
        Some(())
    }

    /// One receive per inbound edge; returns how many neighbors are alive.
    async fn collect(&mut self) -> Option<usize> {
        let Some(mailbox) = self.mailbox.as_mut() else {
            return Some(0);
        };
        let mut alive = 0;
        for _ in 0..self.degree {
            if until_cancelled(&self.token, mailbox.recv()).await?? {
                alive += 1;
            }
        }
        Some(alive)
    }

    async fn signal_ready(&self) -> Option<()> {
        until_cancelled(&self.token, self.control.ready.send(())).await?.ok()
    }

    async fn await_commit(&mut self) -> Option<()> {
        until_cancelled(&self.token, self.control.commit.recv()).await?
    }

    async fn report(&self) -> Option<()> {
        let info = CellInfo {
            coord: self.coord,
            alive: self.alive,
        };
        until_cancelled(&self.token, self.control.report.send(info)).await?.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiring::{Adjacency, wire};

    fn control() -> (ControlLinks, mpsc::Receiver<()>, mpsc::Sender<()>, mpsc::Receiver<CellInfo>) {
        let (ready_tx, ready_rx) = mpsc::channel(1);
        let (commit_tx, commit_rx) = mpsc::channel(1);
        let (report_tx, report_rx) = mpsc::channel(1);
        let links = ControlLinks {
            ready: ready_tx,
            commit: commit_rx,
            report: report_tx,
        };
        (links, ready_rx, commit_tx, report_rx)
    }

    #[tokio::test]
    async fn lone_cell_publishes_then_dies() {
        let adj = Adjacency::build(1, 1).unwrap();
        let links = wire(&adj).unwrap().pop().unwrap();
        let (ctrl, mut ready, commit, mut report) = control();
        let token = CancellationToken::new();
        let handle = tokio::spawn(CellActor::new(links, true, ctrl, token.clone()).run());

        ready.recv().await.unwrap();
        commit.send(()).await.unwrap();
        let initial = report.recv().await.unwrap();
        assert_eq!(initial, CellInfo { coord: Coord::new(0, 0), alive: true });

        ready.recv().await.unwrap();
        commit.send(()).await.unwrap();
        let next = report.recv().await.unwrap();
        assert!(!next.alive);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn cell_waits_for_commit_before_reporting() {
        let adj = Adjacency::build(1, 1).unwrap();
        let links = wire(&adj).unwrap().pop().unwrap();
        let (ctrl, mut ready, _commit, mut report) = control();
        let token = CancellationToken::new();
        let handle = tokio::spawn(CellActor::new(links, true, ctrl, token.clone()).run());

        ready.recv().await.unwrap();
        tokio::task::yield_now().await;
        assert!(report.try_recv().is_err());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn closed_controller_stops_the_cell() {
        let adj = Adjacency::build(1, 1).unwrap();
        let links = wire(&adj).unwrap().pop().unwrap();
        let (ctrl, ready, commit, report) = control();
        drop((ready, commit, report));
        CellActor::new(links, false, ctrl, CancellationToken::new()).run().await;
    }
}
