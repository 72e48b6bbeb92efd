pub mod clock;
pub mod collision;
pub mod game;
pub mod grid;
pub mod piece;
pub mod progression;
