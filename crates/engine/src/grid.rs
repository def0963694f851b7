use std::collections::TryReserveError;

use thiserror::Error;

use crate::address::Bounds;
use crate::cell::Cell;
use crate::formula::eval::CellLookup;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("grid dimensions must be non-zero (got {rows} x {cols})")]
    InvalidDimensions { rows: usize, cols: usize },
    #[error("cannot allocate a {rows} x {cols} grid: {source}")]
    Alloc {
        rows: usize,
        cols: usize,
        #[source]
        source: TryReserveError,
    },
}

/// Fixed-capacity row-major store of cells.
///
/// Allocated once with every cell blank. Out-of-bounds reads return `None`
/// and out-of-bounds writes are ignored; the address codec is responsible
/// for rejecting bad coordinates before they get here.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Cell>,
    bounds: Bounds,
}

impl Grid {
    pub fn new(bounds: Bounds) -> Result<Self, GridError> {
        let Bounds { rows, cols } = bounds;
        if rows == 0 || cols == 0 {
            return Err(GridError::InvalidDimensions { rows, cols });
        }
        let len = rows
            .checked_mul(cols)
            .ok_or(GridError::InvalidDimensions { rows, cols })?;

        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|source| GridError::Alloc { rows, cols, source })?;
        cells.resize_with(len, Cell::new);

        Ok(Self { cells, bounds })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn rows(&self) -> usize {
        self.bounds.rows
    }

    pub fn cols(&self) -> usize {
        self.bounds.cols
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> Option<usize> {
        self.bounds
            .contains(row, col)
            .then(|| row * self.bounds.cols + col)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_at(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(crate) fn cell_at_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    /// Raw text at `(row, col)`, empty for blank or out-of-bounds cells.
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.cell(row, col).map(Cell::text).unwrap_or("")
    }

    /// Display string for the renderer.
    pub fn display(&self, row: usize, col: usize) -> String {
        self.cell(row, col).map(Cell::display).unwrap_or_default()
    }

    /// Store raw text. The cell's value stays invalid until the next recalc.
    pub fn set_text(&mut self, row: usize, col: usize, text: &str) {
        if let Some(i) = self.index(row, col) {
            self.cells[i].set_text(text);
        }
    }

    /// Reset a cell to blank and return the text it held.
    pub fn clear(&mut self, row: usize, col: usize) -> String {
        match self.index(row, col) {
            Some(i) => {
                let prior = self.cells[i].text().to_string();
                self.cells[i].clear();
                prior
            }
            None => String::new(),
        }
    }

    pub fn clear_all(&mut self) {
        self.cells.iter_mut().for_each(Cell::clear);
    }

    /// Number of rows up to and including the last row with any non-blank
    /// cell. Zero for an empty grid.
    pub fn used_rows(&self) -> usize {
        (0..self.rows())
            .rev()
            .find(|&r| self.used_cols(r) > 0)
            .map_or(0, |r| r + 1)
    }

    /// Number of columns in `row` up to and including the last non-blank one.
    pub fn used_cols(&self, row: usize) -> usize {
        if row >= self.rows() {
            return 0;
        }
        let start = row * self.cols();
        self.cells[start..start + self.cols()]
            .iter()
            .rposition(|c| !c.is_blank())
            .map_or(0, |c| c + 1)
    }

    /// Iterate `(row, col, cell)` over non-blank cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, usize, &Cell)> + '_ {
        let cols = self.cols();
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_blank())
            .map(move |(i, c)| (i / cols, i % cols, c))
    }
}

impl CellLookup for Grid {
    fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.cell(row, col).and_then(Cell::value)
    }

    fn extent(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }
}
