use anyhow::{Context, Result};
use clap::Parser;
use diamond_world_core::{
    Position,
    board::{Board, CellType, GameObject, GameObjectKind},
    game::{Game, GameConfig, TurnResult, load_game_from_string},
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
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Map file to load
    #[arg(short, long, value_name = "MAP_FILE", default_value = "maps/arena01.txt")]
    map: PathBuf,

    /// Seed for diamond respawns and rival bots
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Number of turns before the game ends
    #[arg(long, default_value_t = 300)]
    max_turns: u32,

    /// Inventory size for every bot (bots default to 5 when unset)
    #[arg(long)]
    inventory_size: Option<u32>,

    /// Milliseconds between turns
    #[arg(long, default_value_t = 250)]
    tick_ms: u64,

    /// Log file; the terminal is owned by the UI
    #[arg(long, value_name = "LOG_FILE", default_value = "diamond_world.log")]
    log_file: PathBuf,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        GameConfig {
            seed: self.seed,
            max_turns: self.max_turns,
            inventory_size: self.inventory_size,
            ..GameConfig::default()
        }
    }
}

struct App {
    /// The running game.
    game: Game,
    /// Flag to control the main loop.
    should_quit: bool,
    /// Flag to control if the game is over.
    game_over: bool,
}

impl App {
    fn new(map_file: &Path, config: GameConfig) -> Result<Self> {
        let file_string = std::fs::read_to_string(map_file)
            .with_context(|| format!("Failed to read map file {}", map_file.display()))?;
        let game = load_game_from_string(&file_string, config).context("Failed to load map")?;

        Ok(App {
            game,
            should_quit: false,
            game_over: false,
        })
    }

    /// Handles one turn of the game.
    fn tick(&mut self) {
        if self.game_over {
            return;
        }
        if self.game.process_turn() == TurnResult::Finished {
            self.game_over = true;
        }
    }

    /// Sets the quit flag.
    fn quit(&mut self) {
        self.should_quit = true;
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();
    if !args.map.exists() {
        return Err(anyhow::anyhow!(
            "Map file does not exist: {}",
            args.map.display()
        ));
    }

    let _guard = setup_logging(&args.log_file)?;

    let mut app = App::new(&args.map, args.game_config())?;
    tracing::info!(map = %args.map.display(), seed = args.seed, "game loaded");

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut app, Duration::from_millis(args.tick_ms));
    restore_terminal(&mut terminal)?;

    result
}

/// Routes tracing output to a file; `RUST_LOG` overrides the default `info` level.
fn setup_logging(log_file: &Path) -> Result<WorkerGuard> {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = log_file
        .file_name()
        .context("Log file path has no file name")?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(guard)
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
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),
                    _ => {}
                }
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
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(70), // Board
            Constraint::Percentage(20), // Scoreboard
            Constraint::Percentage(10), // Status/help
        ])
        .split(frame.area());

    render_board(frame, main_layout[0], app.game.board());
    render_scoreboard(frame, main_layout[1], app.game.board());

    let status = if app.game_over {
        format!(
            "Game over after {} turns. Press 'q' or 'Esc' to quit.",
            app.game.turn()
        )
    } else {
        format!(
            "Turn {}/{}. Press 'q' or 'Esc' to quit.",
            app.game.turn(),
            app.game.config().max_turns
        )
    };
    let help_text = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Renders name, position, load and score for every bot.
fn render_scoreboard(frame: &mut Frame, area: Rect, board: &Board) {
    let rows: Vec<ListItem> = board
        .bots()
        .filter_map(|bot| {
            let props = bot.bot_properties()?;
            let text = format!(
                "{:<10} Pos: ({}, {}) Carrying: {}/{} Score: {}",
                props.name,
                bot.position.x,
                bot.position.y,
                props.diamonds,
                props.capacity(),
                props.score
            );
            Some(ListItem::new(Line::from(Span::styled(text, bot_style(bot)))))
        })
        .collect();

    let scoreboard =
        List::new(rows).block(Block::default().borders(Borders::ALL).title("Scoreboard"));
    frame.render_widget(scoreboard, area);
}

fn bot_style(bot: &GameObject) -> Style {
    match bot.bot_properties() {
        Some(props) if props.name.starts_with("greedy") => Style::default().fg(Color::Red).bold(),
        _ => Style::default().fg(Color::Magenta).bold(),
    }
}

/// Picks the glyph for the most important object on a tile.
fn object_span(objects: &[&GameObject]) -> Option<Span<'static>> {
    if let Some(bot) = objects.iter().find(|obj| obj.is_bot()) {
        return Some(Span::styled("@", bot_style(bot)));
    }
    if let Some(props) = objects.iter().find_map(|obj| obj.diamond_properties()) {
        let color = if props.value() > 1 {
            Color::Red
        } else {
            Color::Cyan
        };
        return Some(Span::styled("*", Style::default().fg(color)));
    }
    objects.iter().find_map(|obj| match obj.kind {
        GameObjectKind::RedButton => Some(Span::styled(
            "B",
            Style::default().fg(Color::LightRed).bold(),
        )),
        GameObjectKind::Base { .. } => Some(Span::styled("H", Style::default().fg(Color::Green))),
        _ => None,
    })
}

/// Renders the board onto the frame.
fn render_board(frame: &mut Frame, area: Rect, board: &Board) {
    let terrain = board.terrain();
    let mut lines: Vec<Line> = Vec::with_capacity(board.height());

    for y in 0..board.height() {
        let mut spans: Vec<Span> = Vec::with_capacity(board.width());
        for x in 0..board.width() {
            let pos = Position::new(x as i32, y as i32);
            let objects: Vec<&GameObject> = board.objects_at(pos).collect();

            let span = object_span(&objects).unwrap_or_else(|| match terrain.get(pos) {
                Some(CellType::Wall) => Span::styled("#", Style::default().fg(Color::DarkGray)),
                Some(CellType::Floor) | None => Span::raw("."),
            });
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let board_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Diamond World").borders(Borders::ALL))
        .alignment(Alignment::Center);

    frame.render_widget(board_paragraph, area);
}
