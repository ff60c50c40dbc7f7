// reference.rs - Single-threaded reference implementation
//
// Plain double-buffer stepping with bounded edges. Used as the oracle for the
// concurrent engines and selectable as an engine of its own.

use crate::engine::{ShutdownReport, Simulation};
use crate::error::SimError;
use crate::grid::{Coord, Grid};
use crate::rules::next_state;

/// Live neighbors of `coord`, cells past the edge counting as dead.
pub fn live_neighbors(grid: &Grid, coord: Coord) -> usize {
    let mut count = 0;
    for dx in -1isize..=1 {
        for dy in -1isize..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (Some(x), Some(y)) = (coord.x.checked_add_signed(dx), coord.y.checked_add_signed(dy))
            else {
                continue;
            };
            let neighbor = Coord::new(x, y);
            if grid.contains(neighbor) && grid.get(neighbor) {
                count += 1;
            }
        }
    }
    count
}

/// The generation after `grid`.
pub fn step(grid: &Grid) -> Grid {
    let mut next = grid.clone();
    for (index, cell) in next.cells_mut().iter_mut().enumerate() {
        let coord = grid.coord_of(index);
        *cell = next_state(grid.get(coord), live_neighbors(grid, coord));
    }
    next
}

/// `generations` steps from `grid`.
pub fn step_n(grid: &Grid, generations: u64) -> Grid {
    let mut current = grid.clone();
    for _ in 0..generations {
        current = step(&current);
    }
    current
}

/// The reference as a `Simulation`.
#[derive(Debug, Clone)]
pub struct Sequential {
    current: Grid,
    generation: u64,
}

impl Sequential {
    pub fn new(initial: Grid) -> Self {
        Self {
            current: initial,
            generation: 0,
        }
    }
}

impl Simulation for Sequential {
    async fn step(&mut self) -> Result<u64, SimError> {
        self.current = step(&self.current);
        self.generation += 1;
        Ok(self.generation)
    }

    fn snapshot(&self) -> &Grid {
        &self.current
    }

    fn generation(&self) -> u64 {
        self.generation
    }

    async fn shutdown(self) -> ShutdownReport {
        ShutdownReport::default()
    }
}
