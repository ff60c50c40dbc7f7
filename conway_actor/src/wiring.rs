// wiring.rs - Moore-neighborhood adjacency and neighbor mailbox wiring
//
// Every count the round protocol relies on (cells per round, values per
// mailbox) comes from here. Nothing downstream hard-codes a neighbor count.

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ConfigError;
use crate::grid::{Coord, Grid};

/// Relative offsets of the Moore neighborhood, row offset outer.
#[rustfmt::skip]
const OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Bounded (non-wrapping) neighbor lists for every cell of a rows x cols grid.
#[derive(Debug, Clone)]
pub struct Adjacency {
    rows: usize,
    cols: usize,
    neighbors: Vec<Vec<usize>>,
}

impl Adjacency {
    pub fn build(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyGrid { rows, cols });
        }

        let mut neighbors = Vec::with_capacity(rows * cols);
        for x in 0..rows {
            for y in 0..cols {
                let list = OFFSETS
                    .iter()
                    .filter_map(|&(dx, dy)| {
                        let nx = x.checked_add_signed(dx)?;
                        let ny = y.checked_add_signed(dy)?;
                        (nx < rows && ny < cols).then_some(nx * cols + ny)
                    })
                    .collect();
                neighbors.push(list);
            }
        }

        Ok(Self { rows, cols, neighbors })
    }

    pub fn for_grid(grid: &Grid) -> Result<Self, ConfigError> {
        Self::build(grid.rows(), grid.cols())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells, which is also the number of messages per controller phase.
    pub fn cell_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Neighbor indices of the cell at `index`.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors[index].len()
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        Coord::new(index / self.cols, index % self.cols)
    }

    /// Total directed edges, i.e. broadcasts per round across the grid.
    pub fn edge_count(&self) -> usize {
        self.neighbors.iter().map(Vec::len).sum()
    }
}

/// The channel ends one cell actor needs to talk to its neighbors.
#[derive(Debug)]
pub struct NeighborLinks {
    pub coord: Coord,
    /// One sender per outbound edge, into each neighbor's mailbox.
    pub outbound: Vec<mpsc::Sender<bool>>,
    /// Inbound mailbox; `None` for a cell with no neighbors.
    pub mailbox: Option<mpsc::Receiver<bool>>,
    /// Values to collect per round.
    pub degree: usize,
}

/// Allocate one mailbox per cell sized to its neighbor count and hand each
/// cell a sender into every neighbor's mailbox.
///
/// Fails before anything is spawned if a mailbox capacity diverges from the
/// number of edges wired into it.
pub fn wire(adjacency: &Adjacency) -> Result<Vec<NeighborLinks>, ConfigError> {
    let n = adjacency.cell_count();

    let mut senders = Vec::with_capacity(n);
    let mut mailboxes = Vec::with_capacity(n);
    let mut capacities = Vec::with_capacity(n);
    for index in 0..n {
        let capacity = adjacency.degree(index);
        if capacity == 0 {
            // tokio channels need a non-zero buffer; an isolated cell has no mailbox
            senders.push(None);
            mailboxes.push(None);
        } else {
            let (tx, rx) = mpsc::channel(capacity);
            senders.push(Some(tx));
            mailboxes.push(Some(rx));
        }
        capacities.push(capacity);
    }

    let mut inbound = vec![0usize; n];
    let mut links = Vec::with_capacity(n);
    for (index, mailbox) in mailboxes.into_iter().enumerate() {
        let mut outbound = Vec::with_capacity(adjacency.degree(index));
        for &neighbor in adjacency.neighbors(index) {
            let tx = senders[neighbor].as_ref().ok_or(ConfigError::CapacityMismatch {
                coord: adjacency.coord_of(neighbor),
                capacity: 0,
                inbound: inbound[neighbor] + 1,
                neighbors: adjacency.degree(neighbor),
            })?;
            outbound.push(tx.clone());
            inbound[neighbor] += 1;
        }
        links.push(NeighborLinks {
            coord: adjacency.coord_of(index),
            outbound,
            mailbox,
            degree: adjacency.degree(index),
        });
    }

    for index in 0..n {
        let neighbors = adjacency.degree(index);
        if capacities[index] != inbound[index] || capacities[index] != neighbors {
            return Err(ConfigError::CapacityMismatch {
                coord: adjacency.coord_of(index),
                capacity: capacities[index],
                inbound: inbound[index],
                neighbors,
            });
        }
    }

    debug!(
        rows = adjacency.rows(),
        cols = adjacency.cols(),
        edges = adjacency.edge_count(),
        "wired neighbor mailboxes"
    );
    Ok(links)
}
