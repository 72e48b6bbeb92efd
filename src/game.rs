use std::time::{Duration, Instant};

use crate::clock::DropClock;
use crate::collision::piece_collides;
use crate::grid::{CellState, Grid, GRID_HEIGHT, GRID_WIDTH};
use crate::piece::{
    Piece, PieceColor, PieceFactory, PieceProvider, Position, RandomPieceProvider,
};
use crate::progression::Progression;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Idle,
    Running,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Started,
    PieceMoved,
    PieceRotated,
    PieceLocked,
    PieceSpawned,
    LinesCleared(u32),
    LevelUp(u32),
    Paused,
    Unpaused,
    GameOver { final_score: u32 },
}

// ============================================================================
// Game
// ============================================================================

/// Owns the whole session: grid, falling piece, progression and drop clock.
///
/// Every command runs to completion, including any lock, line clear and
/// respawn it triggers, before returning. Commands outside `Running` are
/// ignored.
pub struct Game {
    pub grid: Grid,
    pub current_piece: Option<Piece>,
    pub progression: Progression,
    pub state: GameState,
    factory: PieceFactory,
    clock: DropClock,
    events: Vec<GameEvent>,
}

// ============================================================================
// Game Logic
// ============================================================================

impl Game {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::new()))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::seeded(seed)))
    }

    pub fn with_provider(provider: Box<dyn PieceProvider>) -> Self {
        let progression = Progression::new();
        Self {
            grid: Grid::new(),
            current_piece: None,
            progression,
            state: GameState::Idle,
            factory: PieceFactory::new(provider),
            clock: DropClock::new(progression.drop_interval()),
            events: Vec::new(),
        }
    }

    /// Already running with the given board and piece. Later spawns are random.
    pub fn with_grid(grid: Grid, current_piece: Piece) -> Self {
        let mut game = Self::new();
        game.grid = grid;
        game.current_piece = Some(current_piece);
        game.state = GameState::Running;
        game.clock.start(game.progression.drop_interval(), Instant::now());
        game
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    /// Idle to Running, with the first drop deadline counted from `now`.
    pub fn start_at(&mut self, now: Instant) {
        if self.state != GameState::Idle {
            return;
        }
        self.state = GameState::Running;
        self.events.push(GameEvent::Started);
        self.clock.start(self.progression.drop_interval(), now);
        self.spawn_next_piece();
    }

    pub fn toggle_pause(&mut self) {
        self.toggle_pause_at(Instant::now());
    }

    pub fn toggle_pause_at(&mut self, now: Instant) {
        match self.state {
            GameState::Running => {
                self.state = GameState::Paused;
                self.clock.cancel();
                self.events.push(GameEvent::Paused);
            }
            GameState::Paused => {
                self.state = GameState::Running;
                self.clock.start(self.progression.drop_interval(), now);
                self.events.push(GameEvent::Unpaused);
            }
            GameState::Idle | GameState::GameOver => {}
        }
    }

    pub fn move_left(&mut self) -> bool {
        self.shift(-1)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1)
    }

    /// One row down. A blocked move locks the piece and spawns the next one;
    /// returns false in that case.
    pub fn move_down(&mut self) -> bool {
        self.move_down_at(Instant::now())
    }

    /// `move_down` at a known time. A level-up during the lock reschedules
    /// the drop clock from `now`.
    pub fn move_down_at(&mut self, now: Instant) -> bool {
        if self.state != GameState::Running {
            return false;
        }
        let Some(candidate) = self.current_piece.as_ref().map(|piece| piece.moved(0, 1)) else {
            return false;
        };
        if self.try_place(candidate) {
            self.events.push(GameEvent::PieceMoved);
            true
        } else {
            self.lock_and_spawn(now);
            false
        }
    }

    pub fn rotate(&mut self) -> bool {
        if self.state != GameState::Running {
            return false;
        }
        let Some(candidate) = self.current_piece.as_ref().map(Piece::rotated) else {
            return false;
        };
        if self.try_place(candidate) {
            self.events.push(GameEvent::PieceRotated);
            true
        } else {
            false
        }
    }

    /// Jumps the anchor to column `x` in one step, or stays put if that collides.
    pub fn target_column(&mut self, x: i16) -> bool {
        if self.state != GameState::Running {
            return false;
        }
        let Some(candidate) = self.current_piece.as_ref().map(|piece| piece.at_column(x)) else {
            return false;
        };
        if self.try_place(candidate) {
            self.events.push(GameEvent::PieceMoved);
            true
        } else {
            false
        }
    }

    /// Clock-driven soft drop.
    pub fn tick(&mut self) {
        if self.state == GameState::Running {
            self.move_down();
        }
    }

    /// Runs a tick if the drop clock is due at `now`.
    pub fn update(&mut self, now: Instant) -> bool {
        if self.state != GameState::Running || !self.clock.poll(now) {
            return false;
        }
        self.move_down_at(now);
        true
    }

    fn shift(&mut self, dx: i16) -> bool {
        if self.state != GameState::Running {
            return false;
        }
        let Some(candidate) = self.current_piece.as_ref().map(|piece| piece.moved(dx, 0)) else {
            return false;
        };
        if self.try_place(candidate) {
            self.events.push(GameEvent::PieceMoved);
            true
        } else {
            false
        }
    }

    /// Commits `candidate` only if it fits; the current piece is untouched otherwise.
    fn try_place(&mut self, candidate: Piece) -> bool {
        if piece_collides(&candidate, &self.grid) {
            return false;
        }
        self.current_piece = Some(candidate);
        true
    }

    fn lock_piece(&mut self) {
        let Some(piece) = self.current_piece.take() else {
            return;
        };
        for block in piece.blocks() {
            if block.y >= 0 && block.y < GRID_HEIGHT as i16 {
                self.grid.set_occupant(block.x, block.y, piece.color);
            }
        }
        self.events.push(GameEvent::PieceLocked);
    }

    fn clear_lines(&mut self, now: Instant) {
        let cleared = self.grid.clear_full_rows();
        if cleared.is_empty() {
            return;
        }
        self.events.push(GameEvent::LinesCleared(cleared.len() as u32));

        for _ in &cleared {
            if self.progression.award_row() {
                self.events.push(GameEvent::LevelUp(self.progression.level()));
                self.clock.reschedule(self.progression.drop_interval(), now);
            }
        }
    }

    fn lock_and_spawn(&mut self, now: Instant) {
        self.lock_piece();
        self.clear_lines(now);
        self.spawn_next_piece();
    }

    fn spawn_next_piece(&mut self) {
        let piece = self.factory.spawn();
        let blocked = piece_collides(&piece, &self.grid);
        self.current_piece = Some(piece);

        if blocked {
            self.state = GameState::GameOver;
            self.clock.cancel();
            self.events.push(GameEvent::GameOver {
                final_score: self.progression.score(),
            });
        } else {
            self.events.push(GameEvent::PieceSpawned);
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn score(&self) -> u32 {
        self.progression.score()
    }

    pub fn level(&self) -> u32 {
        self.progression.level()
    }

    pub fn drop_interval_ms(&self) -> u64 {
        self.progression.drop_interval_ms()
    }

    pub fn clock(&self) -> &DropClock {
        &self.clock
    }

    /// How long the frontend may wait for input before the next gravity tick.
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.clock.time_until_tick(now)
    }

    /// Absolute cells of the falling piece, for overlay rendering.
    pub fn falling_cells(&self) -> Vec<Position> {
        self.current_piece.as_ref().map(Piece::blocks).unwrap_or_default()
    }

    pub fn falling_color(&self) -> Option<PieceColor> {
        self.current_piece.as_ref().map(|piece| piece.color)
    }

    /// Returns the visual grid state with the current piece overlaid
    pub fn render_grid(&self) -> Vec<Vec<CellState>> {
        let mut visual_grid = self.grid.rows().to_vec();

        if let Some(piece) = &self.current_piece {
            for block in piece.blocks() {
                if block.y >= 0
                    && block.y < GRID_HEIGHT as i16
                    && block.x >= 0
                    && block.x < GRID_WIDTH as i16
                {
                    visual_grid[block.y as usize][block.x as usize] =
                        CellState::Filled(piece.color);
                }
            }
        }

        visual_grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

pub mod test_helpers {
    use super::*;

    pub const FILLER: PieceColor = PieceColor::Red;

    pub fn empty_grid() -> Grid {
        Grid::new()
    }

    pub fn fill_row(grid: &mut Grid, y: usize) {
        for x in 0..GRID_WIDTH {
            grid.set_occupant(x as i16, y as i16, FILLER);
        }
    }

    pub fn fill_row_with_gap(grid: &mut Grid, y: usize, gap_x: usize) {
        for x in 0..GRID_WIDTH {
            if x != gap_x {
                grid.set_occupant(x as i16, y as i16, FILLER);
            }
        }
    }
}
