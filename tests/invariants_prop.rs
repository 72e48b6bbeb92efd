//! Invariants that must hold over any command sequence:
//! - A running game's falling piece never overlaps the board or its walls.
//! - Score is a multiple of 100 and `level == 1 + score / 1000`.
//! - The drop interval always matches the level.
//! - The board stays 20 x 10.
//!
//! Boards pre-filled with a one-column well keep lines clearing, so the
//! score laws are exercised away from zero and across level boundaries.

use proptest::prelude::*;
use tetrion::collision::piece_collides;
use tetrion::game::{test_helpers::fill_row_with_gap, Game, GameEvent, GameState};
use tetrion::grid::{GRID_HEIGHT, GRID_WIDTH};
use tetrion::piece::{Piece, TetrominoType};
use tetrion::progression::{drop_interval_ms, Progression};

#[derive(Clone, Copy, Debug)]
enum Command {
    Left,
    Right,
    Down,
    Rotate,
    Column(i16),
    Drop,
    Pause,
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => Just(Command::Left),
        3 => Just(Command::Right),
        6 => Just(Command::Down),
        3 => Just(Command::Rotate),
        2 => (-2i16..12).prop_map(Command::Column),
        2 => Just(Command::Drop),
        1 => Just(Command::Pause),
    ]
}

fn apply(game: &mut Game, command: Command) {
    match command {
        Command::Left => {
            game.move_left();
        }
        Command::Right => {
            game.move_right();
        }
        Command::Down => {
            game.move_down();
        }
        Command::Rotate => {
            game.rotate();
        }
        Command::Column(x) => {
            game.target_column(x);
        }
        Command::Drop => while game.move_down() {},
        Command::Pause => game.toggle_pause(),
    }
}

/// Running game whose bottom `rows` rows are full except for column `well`.
fn game_with_well(seed: u64, rows: usize, well: usize, cleared_before: u32) -> Game {
    let mut game = Game::with_seed(seed);
    for y in GRID_HEIGHT - rows..GRID_HEIGHT {
        fill_row_with_gap(&mut game.grid, y, well);
    }
    game.progression = Progression::from_score(cleared_before * 100);
    game.start();
    game
}

fn assert_invariants(game: &Game) {
    if game.state == GameState::Running {
        let piece = game.current_piece.as_ref().expect("running game has a piece");
        assert!(!piece_collides(piece, &game.grid));
    }

    let score = game.score();
    assert_eq!(score % 100, 0);
    assert_eq!(game.level(), 1 + score / 1000);
    assert_eq!(game.drop_interval_ms(), drop_interval_ms(game.level()));

    let rows = game.grid.rows();
    assert_eq!(rows.len(), GRID_HEIGHT);
    assert!(rows.iter().all(|row| row.len() == GRID_WIDTH));
}

#[test]
fn dropping_until_game_over_keeps_invariants() {
    let mut game = Game::with_seed(20261017);
    game.start();

    for _ in 0..5_000 {
        if game.is_game_over() {
            break;
        }
        game.move_down();
        assert_invariants(&game);
    }

    assert!(game.is_game_over());
    assert!(!game.clock().is_running());
}

#[test]
fn laws_hold_while_clearing_across_a_level() {
    let mut game = game_with_well(3, 4, 9, 7);
    game.current_piece = Some(Piece::new_at(TetrominoType::I, 9, 0).rotated());
    game.take_events();

    while game.move_down() {
        assert_invariants(&game);
    }
    assert_invariants(&game);

    assert_eq!(game.score(), 1100);
    assert_eq!(game.level(), 2);
    let events = game.take_events();
    assert!(events.contains(&GameEvent::LinesCleared(4)));
    assert!(events.contains(&GameEvent::LevelUp(2)));
}

proptest! {
    #[test]
    fn random_play_respects_invariants(
        seed in any::<u64>(),
        commands in prop::collection::vec(command(), 1..400),
    ) {
        let mut game = Game::with_seed(seed);
        game.start();
        assert_invariants(&game);

        for command in commands {
            apply(&mut game, command);
            assert_invariants(&game);
        }
    }

    #[test]
    fn play_over_a_well_respects_invariants(
        seed in any::<u64>(),
        rows in 1usize..=12,
        well in 0usize..GRID_WIDTH,
        cleared_before in 0u32..40,
        commands in prop::collection::vec(command(), 1..300),
    ) {
        let mut game = game_with_well(seed, rows, well, cleared_before);
        assert_invariants(&game);

        for command in commands {
            apply(&mut game, command);
            assert_invariants(&game);
        }
        prop_assert!(game.score() >= cleared_before * 100);
    }

    #[test]
    fn paused_game_ignores_movement(
        seed in any::<u64>(),
        commands in prop::collection::vec(command(), 1..50),
    ) {
        let mut game = Game::with_seed(seed);
        game.start();
        game.toggle_pause();
        let piece = game.current_piece.clone();
        let grid = game.grid.clone();

        for command in commands {
            if let Command::Pause = command {
                continue;
            }
            apply(&mut game, command);
        }

        prop_assert_eq!(game.state, GameState::Paused);
        prop_assert_eq!(game.current_piece, piece);
        prop_assert_eq!(game.grid, grid);
    }
}
