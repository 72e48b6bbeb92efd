use crate::grid::{Grid, GRID_HEIGHT, GRID_WIDTH};
use crate::piece::{Piece, Position, Shape};

/// True if `shape` placed at `anchor` leaves the side walls, passes the floor,
/// or overlaps a filled cell. Cells above the top row only check the walls.
pub fn collides(shape: &Shape, anchor: Position, grid: &Grid) -> bool {
    shape.cells().any(|(dx, dy)| {
        let x = anchor.x + dx;
        let y = anchor.y + dy;
        x < 0
            || x >= GRID_WIDTH as i16
            || y >= GRID_HEIGHT as i16
            || (y >= 0 && grid.is_occupied(x, y))
    })
}

pub fn piece_collides(piece: &Piece, grid: &Grid) -> bool {
    collides(&piece.shape, piece.anchor, grid)
}
