use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::{
    io::{self, stdout, Stdout},
    time::{Duration, Instant},
};

use tetrion::game::{Game, GameEvent, GameState};
use tetrion::grid::{CellState, GRID_HEIGHT, GRID_WIDTH};
use tetrion::piece::PieceColor;

// ============================================================================
// Configuration
// ============================================================================

/// Falling-block puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(name = "tetrion", version, about)]
struct Args {
    /// Seed for the piece sequence. Random when omitted.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Ignore mouse clicks on the board.
    #[arg(long, default_value_t = false)]
    no_mouse: bool,
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = "  ";
const INFO_WIDTH: u16 = 14;
// Upper bound on the input wait while no drop clock is armed.
const IDLE_POLL: Duration = Duration::from_millis(250);

fn piece_color(color: PieceColor) -> Color {
    match color {
        PieceColor::Cyan => Color::Cyan,
        PieceColor::Blue => Color::Blue,
        PieceColor::Orange => Color::Rgb(255, 165, 0),
        PieceColor::Yellow => Color::Yellow,
        PieceColor::Green => Color::Green,
        PieceColor::Purple => Color::Magenta,
        PieceColor::Red => Color::Red,
    }
}

// ============================================================================
// Session
// ============================================================================

/// What the renderer knows about the game, fed by engine notifications.
struct Session {
    game: Game,
    seed: Option<u64>,
    final_score: Option<u32>,
}

impl Session {
    fn new(seed: Option<u64>) -> Self {
        let game = match seed {
            Some(seed) => Game::with_seed(seed),
            None => Game::new(),
        };
        Self {
            game,
            seed,
            final_score: None,
        }
    }

    fn restart(&mut self) {
        // Under --seed, successive games use seed, seed + 1, ...
        *self = Self::new(self.seed.map(|seed| seed.wrapping_add(1)));
        self.game.start();
    }

    fn drain_events(&mut self) {
        for event in self.game.take_events() {
            if let GameEvent::GameOver { final_score } = event {
                self.final_score = Some(final_score);
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, session: &Session) {
    let area = frame.size();
    let game = &session.game;

    render_game(frame, game, area);
    match game.state {
        GameState::Idle => render_idle(frame, area),
        GameState::Running => {}
        GameState::Paused => render_paused(frame, area),
        GameState::GameOver => {
            render_game_over(frame, session.final_score.unwrap_or(game.score()), area)
        }
    }
}

/// Board and info panel rectangles for a terminal of size `area`.
fn game_layout(area: Rect) -> (Rect, Rect) {
    let grid_display_width = (GRID_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = GRID_HEIGHT as u16 + 2;
    let main_area = centered_rect(grid_display_width + INFO_WIDTH, grid_display_height, area);

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(INFO_WIDTH),
    ])
    .split(main_area);

    (horizontal[0], horizontal[1])
}

fn render_game(frame: &mut Frame, game: &Game, area: Rect) {
    let (grid_area, info_area) = game_layout(area);
    render_grid(frame, game, grid_area);
    render_info(frame, game, info_area);

    let controls_y = grid_area.y + grid_area.height;
    if controls_y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→/AD: Move | ↓/S: Drop | ↑/W: Rotate | Click: Column | P: Pause | Q/ESC: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        let controls_area = Rect {
            x: area.x,
            y: controls_y,
            width: area.width,
            height: 1,
        };
        frame.render_widget(controls, controls_area);
    }
}

fn render_grid(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetrion ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match cell {
                    CellState::Empty => Span::raw(EMPTY_CHAR),
                    CellState::Filled(color) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(piece_color(*color)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", game.score())),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", game.level())),
        Line::from(""),
        Line::from(Span::styled("Speed", Style::default().fg(Color::Cyan))),
        Line::from(format!("{} ms", game.drop_interval_ms())),
    ];

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_popup<'a>(frame: &mut Frame, area: Rect, title: &'a str, text: Vec<Line<'a>>) {
    let height = text.len() as u16 + 2;
    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(paragraph, centered_rect(24, height, area));
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn render_idle(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("TETRION", Style::default().fg(Color::Cyan))),
        Line::from(""),
        hint("Press Enter to start"),
        hint("Press ESC to quit"),
    ];
    render_popup(frame, area, " Ready ", text);
}

fn render_paused(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("PAUSED", Style::default().fg(Color::Yellow))),
        Line::from(""),
        hint("Press P to continue"),
        hint("Press ESC to quit"),
    ];
    render_popup(frame, area, " Paused ", text);
}

fn render_game_over(frame: &mut Frame, final_score: u32, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {final_score}")),
        Line::from(""),
        hint("Press R to play again"),
        hint("Press ESC to quit"),
    ];
    render_popup(frame, area, " Game Over ", text);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Input
// ============================================================================

/// Board column under a terminal cell, if the click landed inside the board.
fn clicked_column(mouse: &MouseEvent, screen: Rect) -> Option<i16> {
    let (grid_area, _) = game_layout(screen);
    let inner = Block::default().borders(Borders::ALL).inner(grid_area);
    let inside_x = mouse.column >= inner.x && mouse.column < inner.x + inner.width;
    let inside_y = mouse.row >= inner.y && mouse.row < inner.y + inner.height;
    if !inside_x || !inside_y {
        return None;
    }
    Some(((mouse.column - inner.x) / CELL_WIDTH) as i16)
}

enum Flow {
    Continue,
    Quit,
}

fn handle_key(session: &mut Session, code: KeyCode) -> Flow {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
        KeyCode::Char('r') | KeyCode::Char('R') => {
            if session.game.is_game_over() {
                session.restart();
            }
        }
        KeyCode::Enter => session.game.start(),
        KeyCode::Char('p') | KeyCode::Char('P') => session.game.toggle_pause(),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
            session.game.move_left();
        }
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
            session.game.move_right();
        }
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
            session.game.move_down();
        }
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
            session.game.rotate();
        }
        _ => {}
    }
    Flow::Continue
}

// ============================================================================
// Main Loop
// ============================================================================

fn run(terminal: &mut Tui, args: &Args) -> Result<()> {
    let mut session = Session::new(args.seed);

    loop {
        terminal.draw(|frame| render(frame, &session))?;

        let timeout = session
            .game
            .time_until_tick(Instant::now())
            .unwrap_or(IDLE_POLL);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Flow::Quit = handle_key(&mut session, key.code) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse)
                    if !args.no_mouse
                        && mouse.kind == MouseEventKind::Down(MouseButton::Left) =>
                {
                    if let Some(column) = clicked_column(&mouse, terminal.size()?) {
                        session.game.target_column(column);
                    }
                }
                _ => {}
            }
        }

        session.game.update(Instant::now());
        session.drain_events();
    }
}

// ============================================================================
// Terminal Setup
// ============================================================================

type Tui = Terminal<CrosstermBackend<Stdout>>;
type Step = Box<dyn FnOnce() -> io::Result<()>>;

/// Raw mode, alternate screen and optional mouse capture. Anything already
/// switched on is switched back off if a later step fails.
fn setup_terminal(mouse: bool) -> Result<Tui> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let terminal = enter_screen(mouse).and_then(|()| {
        Terminal::new(CrosstermBackend::new(stdout())).context("failed to create terminal")
    });
    if terminal.is_err() {
        // The setup error is the one reported.
        let _ = restore_terminal(mouse);
    }
    terminal
}

fn enter_screen(mouse: bool) -> Result<()> {
    stdout()
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    if mouse {
        stdout()
            .execute(EnableMouseCapture)
            .context("failed to enable mouse capture")?;
    }
    Ok(())
}

fn restore_terminal(mouse: bool) -> Result<()> {
    let mut steps: Vec<Step> = Vec::new();
    if mouse {
        steps.push(Box::new(|| stdout().execute(DisableMouseCapture).map(|_| ())));
    }
    steps.push(Box::new(disable_raw_mode));
    steps.push(Box::new(|| stdout().execute(LeaveAlternateScreen).map(|_| ())));
    run_all(steps).context("failed to restore terminal")
}

/// Runs every step even after a failure; returns the first error.
fn run_all(steps: Vec<Step>) -> io::Result<()> {
    let mut first_error = None;
    for step in steps {
        if let Err(err) = step() {
            first_error.get_or_insert(err);
        }
    }
    first_error.map_or(Ok(()), Err)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mouse = !args.no_mouse;

    let mut terminal = setup_terminal(mouse)?;
    let result = run(&mut terminal, &args);
    let restored = restore_terminal(mouse);

    result.and(restored)
}
