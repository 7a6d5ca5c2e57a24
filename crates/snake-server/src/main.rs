//! Bootstrap (spec §4.J): wires components A-I together — loads the user
//! directory, constructs one [`Game`] per configured field id, binds the
//! listener, and spawns the acceptor (component H) and one tick scheduler
//! (component I) per game. Grounded on the teacher's `main.rs` headless/TUI
//! branch (`crates/server/src/main.rs`), with the packet-loss simulation
//! flags dropped (no UDP transport to simulate loss on) and the users-file /
//! field-id flags added in their place.

mod acceptor;
mod config;
mod connection;
mod events;
mod gamelog;
mod scheduler;
mod tui;
mod visibility;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

use snake::{Game, GameConfig, UserDirectory};

use acceptor::Acceptor;
use config::ServerConfig;
use events::ServerEvent;
use gamelog::GameLog;

#[derive(Parser)]
#[command(name = "snake-server", about = "Snake-arena game server")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = 2000)]
    port: u16,

    #[arg(long, default_value = "users.txt")]
    users_file: String,

    #[arg(long, help = "Run without the status TUI, logging to stderr instead")]
    headless: bool,

    #[arg(long, help = "Append a JSON entry every 16 ticks to this file")]
    game_log: Option<String>,

    #[arg(long = "field", help = "Field (game) id to host; repeatable, defaults to a single field 0")]
    fields: Vec<u32>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServerConfig {
        bind: args.bind,
        port: args.port,
        users_file: args.users_file,
        headless: args.headless,
        game_log: args.game_log,
        field_ids: if args.fields.is_empty() { vec![0] } else { args.fields },
    };

    if config.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let runtime = tokio::runtime::Runtime::new().context("failed to start the tokio runtime")?;
    runtime.block_on(run(config))
}

async fn run(config: ServerConfig) -> Result<()> {
    let users = Arc::new(
        UserDirectory::load(&config.users_file)
            .with_context(|| format!("failed to load users file {:?}", config.users_file))?,
    );

    let game_log = match &config.game_log {
        Some(path) => Some(Arc::new(Mutex::new(
            GameLog::open(path).with_context(|| format!("failed to open game log {path:?}"))?,
        ))),
        None => None,
    };

    let mut acceptor = Acceptor::new(users);
    let mut games = Vec::new();
    for &id in &config.field_ids {
        let game = Arc::new(Game::new(id, GameConfig::default()));
        acceptor
            .add_game(game.clone())
            .context("duplicate field id in --field configuration")?;
        games.push(game);
    }
    let acceptor = Arc::new(acceptor);

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    log::info!("snake-arena server listening on {bind_addr}");

    let (events_tx, events_rx) = mpsc::unbounded_channel();

    for game in &games {
        tokio::spawn(scheduler::run(game.clone(), game_log.clone()));
    }
    tokio::spawn(acceptor.clone().serve(listener, events_tx));

    if config.headless {
        std::future::pending::<()>().await
    } else {
        run_with_tui(games, events_rx).await?;
    }

    Ok(())
}

async fn run_with_tui(games: Vec<Arc<Game>>, mut events_rx: mpsc::UnboundedReceiver<ServerEvent>) -> Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut log_lines: Vec<String> = Vec::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(100));

    loop {
        redraw.tick().await;

        while let Ok(event) = events_rx.try_recv() {
            log_lines.push(format_event(&event));
            if log_lines.len() > 200 {
                log_lines.remove(0);
            }
        }

        if event::poll(Duration::from_millis(0)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }

        let statuses: Vec<tui::GameStatus> = games
            .iter()
            .map(|g| {
                let field = g.get_current_field();
                tui::GameStatus {
                    field: g.id,
                    tick: field.tick,
                    live_snakes: field.live_snakes().count(),
                    foods: field.foods.len(),
                    players: g.player_stats(),
                }
            })
            .collect();

        terminal.draw(|frame| tui::render(frame, &statuses, &log_lines))?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;
    Ok(())
}

fn format_event(event: &ServerEvent) -> String {
    match event {
        ServerEvent::ClientConnected { addr, login, player_id } => {
            format!("{login} (player {player_id}) connected from {addr}")
        }
        ServerEvent::ClientDisconnected { addr, login, reason } => {
            format!("{} {} ({addr})", login.as_deref().unwrap_or("?"), reason.as_str())
        }
        ServerEvent::ConnectionDenied { addr, reason } => format!("denied {addr}: {reason}"),
        ServerEvent::GameStarted { field } => format!("field {field} started"),
        ServerEvent::Error { message } => format!("error: {message}"),
    }
}
