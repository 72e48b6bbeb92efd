use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::grid::GRID_WIDTH;

// ============================================================================
// Configuration
// ============================================================================

pub const SPAWN_X: i16 = (GRID_WIDTH as i16 / 2) - 1;
pub const SPAWN_Y: i16 = 0;

// Indexed by `TetrominoType as usize`. Rows may be ragged.
const SHAPE_TABLE: [&[&[u8]]; 7] = [
    &[&[1, 1, 1, 1]],
    &[&[1, 1, 1], &[1]],
    &[&[1, 1, 1], &[0, 0, 1]],
    &[&[1, 1], &[1, 1]],
    &[&[1, 1, 0], &[0, 1, 1]],
    &[&[0, 1, 1], &[1, 1]],
    &[&[1, 1, 1], &[0, 1]],
];

const COLOR_TABLE: [PieceColor; 7] = [
    PieceColor::Cyan,
    PieceColor::Blue,
    PieceColor::Orange,
    PieceColor::Yellow,
    PieceColor::Green,
    PieceColor::Purple,
    PieceColor::Red,
];

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PieceColor {
    Cyan,
    Blue,
    Orange,
    Yellow,
    Green,
    Purple,
    Red,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TetrominoType {
    I,
    L,
    J,
    O,
    Z,
    S,
    T,
}

impl TetrominoType {
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::L,
        TetrominoType::J,
        TetrominoType::O,
        TetrominoType::Z,
        TetrominoType::S,
        TetrominoType::T,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn shape(self) -> Shape {
        Shape::from_rows(SHAPE_TABLE[self as usize])
    }

    /// Color is tied to the shape slot, never drawn independently.
    pub fn color(self) -> PieceColor {
        COLOR_TABLE[self as usize]
    }
}

/// Boolean occupancy matrix, local (0, 0) at the top-left.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| *cell != 0).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<bool>] {
        &self.rows
    }

    /// Occupied offsets as `(dx, dy)`, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        self.rows.iter().enumerate().flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, occupied)| **occupied)
                .map(move |(j, _)| (j as i16, i as i16))
        })
    }

    /// Transpose then reverse row order: 90 degrees clockwise about the local
    /// origin. Output width follows the first row; short rows read as empty.
    pub fn rotated_clockwise(&self) -> Self {
        let width = self.rows.first().map_or(0, Vec::len);
        let rows = (0..width)
            .map(|col| {
                self.rows
                    .iter()
                    .rev()
                    .map(|row| row.get(col).copied().unwrap_or(false))
                    .collect()
            })
            .collect();
        Self { rows }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Piece {
    pub shape: Shape,
    pub color: PieceColor,
    pub anchor: Position,
}

impl Piece {
    pub fn new(tetromino_type: TetrominoType) -> Self {
        Self::new_at(tetromino_type, SPAWN_X, SPAWN_Y)
    }

    pub fn new_at(tetromino_type: TetrominoType, x: i16, y: i16) -> Self {
        Self {
            shape: tetromino_type.shape(),
            color: tetromino_type.color(),
            anchor: Position { x, y },
        }
    }

    /// Absolute grid cells covered by the piece.
    pub fn blocks(&self) -> Vec<Position> {
        self.shape
            .cells()
            .map(|(dx, dy)| Position {
                x: self.anchor.x + dx,
                y: self.anchor.y + dy,
            })
            .collect()
    }

    pub fn moved(&self, dx: i16, dy: i16) -> Self {
        Self {
            anchor: Position {
                x: self.anchor.x + dx,
                y: self.anchor.y + dy,
            },
            ..self.clone()
        }
    }

    pub fn at_column(&self, x: i16) -> Self {
        Self {
            anchor: Position { x, ..self.anchor },
            ..self.clone()
        }
    }

    /// The anchor stays put; there are no wall kicks.
    pub fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_clockwise(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform draw over the seven shapes.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        TetrominoType::from_index(self.rng.gen_range(0..TetrominoType::ALL.len()))
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        if self.pieces.is_empty() {
            return TetrominoType::O;
        }
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

// ============================================================================
// Piece Factory
// ============================================================================

pub struct PieceFactory {
    provider: Box<dyn PieceProvider>,
}

impl PieceFactory {
    pub fn new(provider: Box<dyn PieceProvider>) -> Self {
        Self { provider }
    }

    /// Next piece at the canonical spawn anchor.
    pub fn spawn(&mut self) -> Piece {
        Piece::new(self.provider.next_piece())
    }
}
