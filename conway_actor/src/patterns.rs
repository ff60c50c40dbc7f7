// patterns.rs - Named starting patterns and initial-state seeding

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::ConfigError;
use crate::grid::{Coord, Grid};

/// A pattern as (row, col) offsets from its top-left corner.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(usize, usize)],
}

impl Pattern {
    /// Bounding box as (rows, cols).
    pub fn size(&self) -> (usize, usize) {
        let rows = self.cells.iter().map(|&(r, _)| r + 1).max().unwrap_or(0);
        let cols = self.cells.iter().map(|&(_, c)| c + 1).max().unwrap_or(0);
        (rows, cols)
    }

    /// Set the pattern's cells alive with its top-left corner at `origin`.
    /// Cells that would land outside the grid are skipped.
    pub fn stamp(&self, grid: &mut Grid, origin: Coord) {
        for &(r, c) in self.cells {
            let coord = Coord::new(origin.x + r, origin.y + c);
            if grid.contains(coord) {
                grid.set(coord, true);
            }
        }
    }

    /// Stamp the pattern centered on an otherwise empty grid.
    pub fn place_centered(&self, grid: &mut Grid) -> Result<(), ConfigError> {
        let (rows, cols) = self.size();
        if rows > grid.rows() || cols > grid.cols() {
            return Err(ConfigError::PatternTooLarge {
                name: self.name,
                needed_rows: rows,
                needed_cols: cols,
                rows: grid.rows(),
                cols: grid.cols(),
            });
        }
        grid.clear();
        let origin = Coord::new((grid.rows() - rows) / 2, (grid.cols() - cols) / 2);
        self.stamp(grid, origin);
        Ok(())
    }
}

pub const PATTERNS: &[Pattern] = &[
    Pattern {
        name: "Block",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1)],
    },
    Pattern {
        name: "Glider",
        cells: &[(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)],
    },
    Pattern {
        name: "Blinker",
        cells: &[(0, 0), (0, 1), (0, 2)],
    },
    Pattern {
        name: "Toad",
        cells: &[(0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)],
    },
    Pattern {
        name: "Beacon",
        cells: &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)],
    },
    Pattern {
        name: "Pulsar",
        cells: &[
            // Top half
            (0, 2), (0, 3), (0, 4), (0, 8), (0, 9), (0, 10),
            (2, 0), (2, 5), (2, 7), (2, 12),
            (3, 0), (3, 5), (3, 7), (3, 12),
            (4, 0), (4, 5), (4, 7), (4, 12),
            (5, 2), (5, 3), (5, 4), (5, 8), (5, 9), (5, 10),
            // Bottom half (mirrored)
            (7, 2), (7, 3), (7, 4), (7, 8), (7, 9), (7, 10),
            (8, 0), (8, 5), (8, 7), (8, 12),
            (9, 0), (9, 5), (9, 7), (9, 12),
            (10, 0), (10, 5), (10, 7), (10, 12),
            (12, 2), (12, 3), (12, 4), (12, 8), (12, 9), (12, 10),
        ],
    },
    Pattern {
        name: "R-pentomino",
        cells: &[(0, 2), (1, 1), (1, 2), (2, 0), (2, 1)],
    },
    Pattern {
        name: "Gosper Glider Gun",
        cells: &[
            (4, 0), (4, 1), (5, 0), (5, 1),
            (4, 10), (5, 10), (6, 10), (3, 11), (7, 11), (2, 12), (8, 12),
            (2, 13), (8, 13), (5, 14), (3, 15), (7, 15), (4, 16), (5, 16),
            (6, 16), (5, 17), (2, 20), (3, 20), (4, 20), (2, 21), (3, 21),
            (4, 21), (1, 22), (5, 22), (0, 24), (1, 24), (5, 24), (6, 24),
            (2, 34), (3, 34), (2, 35), (3, 35),
        ],
    },
];

/// Case-insensitive lookup; `-`, `_` and spaces are ignored.
pub fn find(name: &str) -> Option<&'static Pattern> {
    let key = normalize(name);
    PATTERNS.iter().find(|p| normalize(p.name) == key)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// How the initial generation is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum Seeding {
    /// Each cell alive with probability `density`; fixed `seed` makes it reproducible.
    Random { density: f64, seed: Option<u64> },
    /// A named pattern centered on an empty grid.
    Pattern(String),
    Empty,
}

impl Default for Seeding {
    fn default() -> Self {
        Seeding::Random {
            density: 0.5,
            seed: None,
        }
    }
}

impl Seeding {
    pub fn initial_grid(&self, rows: usize, cols: usize) -> Result<Grid, ConfigError> {
        let mut grid = Grid::new(rows, cols)?;
        match self {
            Seeding::Random { density, seed } => {
                if !(0.0..=1.0).contains(density) {
                    return Err(ConfigError::Density(*density));
                }
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                for cell in grid.cells_mut() {
                    *cell = rng.gen_bool(*density);
                }
            }
            Seeding::Pattern(name) => {
                let pattern = find(name).ok_or_else(|| ConfigError::UnknownPattern(name.clone()))?;
                pattern.place_centered(&mut grid)?;
            }
            Seeding::Empty => {}
        }
        Ok(grid)
    }
}
