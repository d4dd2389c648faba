use anyhow::Result;
use clap::Parser;
use maze_escape_core::{
    Direction, Position,
    session::{Command, Mode, Session, SessionConfig, SessionState, SessionView},
};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    time::{Duration, Instant},
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maze width in cells
    #[arg(long, default_value_t = 39)]
    width: usize,
    /// Maze height in cells
    #[arg(long, default_value_t = 29)]
    height: usize,
    /// Seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,
    /// Play the pursuit variant (enemy and shotgun) instead of key
    /// collection
    #[arg(short, long)]
    pursuit: bool,
    /// Milliseconds between simulation ticks
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Only draw cells within this distance of the player
    #[arg(long)]
    visibility: Option<usize>,
}

struct App {
    /// The core game session.
    session: Session,
    /// Flag to control the main loop.
    should_quit: bool,
}

impl App {
    fn new(args: &Args) -> Result<Self> {
        let config = SessionConfig {
            width: args.width,
            height: args.height,
            mode: if args.pursuit {
                Mode::Pursuit
            } else {
                Mode::KeyHunt
            },
            seed: args.seed,
            visibility_radius: args.visibility,
            ..SessionConfig::default()
        };
        let session = Session::new(config)?;

        Ok(App {
            session,
            should_quit: false,
        })
    }

    /// Translates a key press into a session command.
    fn handle_key(&mut self, code: KeyCode) {
        let command = match code {
            KeyCode::Up | KeyCode::Char('w') => Some(Command::Move(Direction::Up)),
            KeyCode::Down | KeyCode::Char('s') => Some(Command::Move(Direction::Down)),
            KeyCode::Left | KeyCode::Char('a') => Some(Command::Move(Direction::Left)),
            KeyCode::Right | KeyCode::Char('d') => Some(Command::Move(Direction::Right)),
            KeyCode::Char(' ') | KeyCode::Char('f') => Some(Command::Fire),
            KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
            _ => None,
        };
        if let Some(command) = command {
            self.session.handle_command(command);
        }
        if self.session.state() == SessionState::Quit {
            self.should_quit = true;
        }
    }

    /// Handles one step of the simulation.
    fn tick(&mut self) {
        self.session.tick();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Build the session before touching the terminal so generation errors
    // print as plain diagnostics.
    let mut app = App::new(&args)?;

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));
    restore_terminal(&mut terminal)?;

    result
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Runs the main loop of the TUI application.
fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if crossterm::event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, app: &App) {
    let view = app.session.view();

    let main_layout = Layout::vertical([
        Constraint::Min(3),    // Area for the maze
        Constraint::Length(3), // Area for inventory and status
        Constraint::Length(1), // Area for help
    ])
    .split(frame.area());

    render_maze(frame, main_layout[0], &view);
    render_status(frame, main_layout[1], &view);

    let help_text = Paragraph::new("Move: arrows/wasd  Fire: space  Quit: q")
        .alignment(Alignment::Center);
    frame.render_widget(help_text, main_layout[2]);
}

/// Whether a cell is within the configured visibility radius of the
/// player. An unset radius shows everything.
fn cell_visible(view: &SessionView, cell: Position) -> bool {
    match view.visibility_radius {
        Some(radius) => view.player.position.chebyshev_distance(cell) <= radius,
        None => true,
    }
}

/// Renders the maze, entities and collectibles onto the frame.
fn render_maze(frame: &mut Frame, area: Rect, view: &SessionView) {
    let grid = view.grid;
    let mut lines: Vec<Line> = Vec::with_capacity(grid.height());

    for y in 0..grid.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(grid.width());
        for x in 0..grid.width() {
            let cell = Position::new(x, y);

            if cell == view.player.position {
                spans.push(Span::styled("@", Style::default().fg(Color::Red).bold()));
                continue;
            }
            if !cell_visible(view, cell) {
                spans.push(Span::raw(" "));
                continue;
            }

            let span = if view.enemy.map(|e| e.position) == Some(cell) {
                Span::styled("G", Style::default().fg(Color::Magenta).bold())
            } else if view.key == Some(cell) {
                Span::styled("k", Style::default().fg(Color::Yellow))
            } else if view.shotgun == Some(cell) {
                Span::styled("s", Style::default().fg(Color::Cyan))
            } else if view.exit == cell {
                Span::styled("E", Style::default().fg(Color::Green).bold())
            } else if grid.is_passage(x, y) {
                Span::raw(" ")
            } else {
                Span::styled("#", Style::default().fg(Color::DarkGray))
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let maze_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Maze Escape").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(maze_paragraph, area);
}

/// Renders the inventory line and the session outcome.
fn render_status(frame: &mut Frame, area: Rect, view: &SessionView) {
    let mut spans = vec![Span::raw(match view.mode {
        Mode::KeyHunt => "Find the key, then escape.  ",
        Mode::Pursuit => "Escape before you are caught.  ",
    })];

    match view.mode {
        Mode::KeyHunt => {
            if view.player.has_key {
                spans.push(Span::styled("key ✓", Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw("key ✗"));
            }
        }
        Mode::Pursuit => {
            if view.player.has_shotgun {
                spans.push(Span::styled(
                    format!("shotgun ✓  ammo {}", view.player.ammo),
                    Style::default().fg(Color::Cyan),
                ));
            } else {
                spans.push(Span::raw("shotgun ✗"));
            }
        }
    }

    let outcome = match view.state {
        SessionState::Active => None,
        SessionState::Escaped => Some(Span::styled(
            "  You escaped the maze!",
            Style::default().fg(Color::Green).bold(),
        )),
        SessionState::Caught => Some(Span::styled(
            "  You were caught!",
            Style::default().fg(Color::Red).bold(),
        )),
        SessionState::Quit => None,
    };
    if let Some(outcome) = outcome {
        spans.push(outcome);
    }

    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}
