//! `sprintboard`: terminal kanban board.
//!
//! Runs the board against an in-process task service that fails a share of
//! requests, so rollbacks and undo can be watched live. Configuration via
//! CLI flags, environment variables, or config file
//! (`~/.config/sprintboard/config.toml`).
//!
//! ```bash
//! # Default: 10% of requests fail, 300ms latency
//! cargo run --bin sprintboard
//!
//! # Every request fails, reproducibly
//! cargo run --bin sprintboard -- --failure-rate 1 --seed 7
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing_appender::non_blocking::WorkerGuard;

use sprintboard::app::{App, Command};
use sprintboard::board::{BoardEvent, Reconciler};
use sprintboard::config::{CliArgs, ClientConfig};
use sprintboard::remote::simulated::SimulatedRemote;
use sprintboard::ui::{self, BoardView};

type Board = Reconciler<SimulatedRemote>;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file; the terminal belongs to the board.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(
        failure_rate = config.failure_rate,
        latency_ms = config.latency.as_millis(),
        seed = ?config.seed,
        "sprintboard starting"
    );

    let remote = SimulatedRemote::demo()
        .with_injector(config.failure_injector())
        .with_latency(config.latency);
    let board = Arc::new(Reconciler::new(remote, config.event_buffer));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &board, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    board.close();
    tracing::info!("sprintboard exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("sprintboard.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Main loop: draw, drain board events, read one key.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    board: &Arc<Board>,
    config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new().with_show_ids(config.show_ids);
    let mut events = board.subscribe();

    let loader = Arc::clone(board);
    tokio::spawn(async move {
        // Failure is reported through BoardEvent::LoadFailed.
        let _ = loader.load().await;
    });

    loop {
        drain_board_events(&mut app, &mut events, board);

        let undo = board.pending_undo();
        board.read(|store| {
            let view = BoardView {
                store,
                undo,
                now: Instant::now(),
            };
            terminal
                .draw(|frame| ui::draw(frame, &mut app, &view))
                .map(|_| ())
        })?;

        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(command) = app.handle_key_event(key) {
                dispatch(board, command);
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Apply all pending board events to the app without blocking.
fn drain_board_events(app: &mut App, rx: &mut broadcast::Receiver<BoardEvent>, board: &Board) {
    loop {
        match rx.try_recv() {
            Ok(event) => app.apply_event(&event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "board events dropped, resyncing view state");
                app.load = board.load_state();
                app.undo_offer = board.pending_undo().map(|p| p.task_id);
            }
            Err(broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed) => {
                return;
            }
        }
    }
}

/// Run a board operation on its own task so input is never blocked.
fn dispatch(board: &Arc<Board>, command: Command) {
    let board = Arc::clone(board);
    tokio::spawn(async move {
        let result = match command {
            Command::Move { id, status } => board.move_task(&id, status).await,
            Command::Undo => board.undo().await.map(|_| ()),
            Command::Create(new) => board.create_task(new).await.map(|_| ()),
            Command::Delete(id) => board.delete_task(&id).await,
        };
        // Failures already reached the user as notices.
        if let Err(e) = result {
            tracing::debug!(error = %e, "board operation failed");
        }
    });
}
