use crate::piece::PieceColor;

// ============================================================================
// Configuration
// ============================================================================

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CellState {
    Empty,
    Filled(PieceColor),
}

/// Fixed 10x20 cell store. Row 0 is the top of the playfield.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Grid {
    rows: Vec<Vec<CellState>>,
}

// ============================================================================
// Grid Logic
// ============================================================================

impl Grid {
    pub fn new() -> Self {
        Self {
            rows: vec![vec![CellState::Empty; GRID_WIDTH]; GRID_HEIGHT],
        }
    }

    fn index(x: i16, y: i16) -> Option<(usize, usize)> {
        if x < 0 || x >= GRID_WIDTH as i16 || y < 0 || y >= GRID_HEIGHT as i16 {
            return None;
        }
        Some((x as usize, y as usize))
    }

    /// Cell at (x, y), or `None` outside the grid.
    pub fn cell(&self, x: i16, y: i16) -> Option<CellState> {
        Self::index(x, y).map(|(x, y)| self.rows[y][x])
    }

    /// Out-of-range coordinates count as occupied.
    pub fn is_occupied(&self, x: i16, y: i16) -> bool {
        !matches!(self.cell(x, y), Some(CellState::Empty))
    }

    pub fn set_occupant(&mut self, x: i16, y: i16, color: PieceColor) {
        debug_assert!(Self::index(x, y).is_some(), "set_occupant out of range: ({x}, {y})");
        if let Some((x, y)) = Self::index(x, y) {
            self.rows[y][x] = CellState::Filled(color);
        }
    }

    pub fn clear_occupant(&mut self, x: i16, y: i16) {
        if let Some((x, y)) = Self::index(x, y) {
            self.rows[y][x] = CellState::Empty;
        }
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .is_some_and(|cells| cells.iter().all(|cell| *cell != CellState::Empty))
    }

    /// Drops `row` and shifts everything above it down by one. Row 0 comes back empty.
    pub fn clear_row_shift_down(&mut self, row: usize) {
        if row >= GRID_HEIGHT {
            return;
        }
        self.rows.remove(row);
        self.rows.insert(0, vec![CellState::Empty; GRID_WIDTH]);
    }

    /// Scans bottom to top, clearing full rows one at a time.
    ///
    /// After a clear the same row index is tested again, since the row above
    /// has just shifted into it. Returns the index of every clear in the order
    /// it happened, so a double clear at the floor reports `[19, 19]`.
    pub fn clear_full_rows(&mut self) -> Vec<usize> {
        let mut cleared = Vec::new();
        let mut remaining = GRID_HEIGHT;

        while remaining > 0 {
            let row = remaining - 1;
            if self.is_row_full(row) {
                self.clear_row_shift_down(row);
                cleared.push(row);
            } else {
                remaining -= 1;
            }
        }

        cleared
    }

    pub fn rows(&self) -> &[Vec<CellState>] {
        &self.rows
    }

    /// Count filled cells in a row
    pub fn filled_count_in_row(&self, row: usize) -> usize {
        self.rows
            .get(row)
            .map_or(0, |cells| cells.iter().filter(|cell| **cell != CellState::Empty).count())
    }

    /// Count total filled cells in grid
    pub fn total_filled_cells(&self) -> usize {
        self.rows.iter().flatten().filter(|cell| **cell != CellState::Empty).count()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
