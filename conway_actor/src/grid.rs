// grid.rs - Grid types for Conway's Game of Life

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ConfigError;

/// Position of a cell: `x` is the row, `y` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A fixed-size rows x cols board of alive/dead cells, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl Grid {
    /// An all-dead grid. Zero rows or columns is rejected.
    pub fn new(rows: usize, cols: usize) -> Result<Self, ConfigError> {
        if rows == 0 || cols == 0 {
            return Err(ConfigError::EmptyGrid { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            cells: vec![false; rows * cols],
        })
    }

    /// Parse a grid from text rows. `#`, `*`, `O` and `1` are alive; `.`,
    /// `_`, space and `0` are dead. Every row must have the same width.
    pub fn parse(rows: &[&str]) -> Result<Self, ConfigError> {
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut grid = Self::new(rows.len(), width)?;

        for (x, row) in rows.iter().enumerate() {
            let found = row.chars().count();
            if found != width {
                return Err(ConfigError::RaggedRow { row: x, expected: width, found });
            }
            for (y, ch) in row.chars().enumerate() {
                let alive = match ch {
                    '#' | '*' | 'O' | '1' => true,
                    '.' | '_' | ' ' | '0' => false,
                    _ => return Err(ConfigError::BadCell { ch, row: x, col: y }),
                };
                grid.set(Coord::new(x, y), alive);
            }
        }
        Ok(grid)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells, R x C.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a constructed grid; pairs with `len`.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.x < self.rows && coord.y < self.cols
    }

    pub fn index_of(&self, coord: Coord) -> usize {
        coord.x * self.cols + coord.y
    }

    pub fn coord_of(&self, index: usize) -> Coord {
        Coord::new(index / self.cols, index % self.cols)
    }

    pub fn get(&self, coord: Coord) -> bool {
        self.cells[self.index_of(coord)]
    }

    pub fn set(&mut self, coord: Coord, alive: bool) {
        let index = self.index_of(coord);
        self.cells[index] = alive;
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [bool] {
        &mut self.cells
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    /// Iterate over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(self.cols)
    }

    /// Coordinates of every live cell, row-major.
    pub fn live_cells(&self) -> Vec<Coord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(|(i, _)| self.coord_of(i))
            .collect()
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// Text form: one line per row, markers separated by single spaces.
    pub fn render(&self, markers: Markers) -> String {
        let mut out = String::with_capacity(self.rows * (self.cols * 2 + 1));
        for row in self.iter_rows() {
            for (i, &alive) in row.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                out.push(markers.marker(alive));
            }
            out.push('\n');
        }
        out
    }

    pub fn hash_value(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.cells.hash(&mut hasher);
        hasher.finish()
    }
}

/// Characters used for alive and dead cells when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Markers {
    pub alive: char,
    pub dead: char,
}

impl Markers {
    pub fn marker(&self, alive: bool) -> char {
        if alive { self.alive } else { self.dead }
    }
}

impl Default for Markers {
    fn default() -> Self {
        Self { alive: '*', dead: ' ' }
    }
}

const HISTORY_LEN: usize = 10;

/// Remembers the hashes of the last ten generations.
#[derive(Debug, Default)]
pub struct CycleDetector {
    history: [u64; HISTORY_LEN],
    count: usize,
}

impl CycleDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `grid`; returns true if it matches one of the recent generations.
    pub fn observe(&mut self, grid: &Grid) -> bool {
        let hash = grid.hash_value();
        let filled = self.count.min(HISTORY_LEN);
        if self.history[..filled].contains(&hash) {
            return true;
        }
        self.history[self.count % HISTORY_LEN] = hash;
        self.count += 1;
        false
    }
}
