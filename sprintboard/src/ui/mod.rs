//! Terminal UI rendering.

pub mod board_panel;
pub mod input;
pub mod status_bar;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};
use tokio::time::Instant;

use crate::app::App;
use crate::board::{PendingUndo, TaskStore};

/// Read-only board state for one frame.
#[derive(Debug)]
pub struct BoardView<'a> {
    /// The task store, borrowed for the duration of the frame.
    pub store: &'a TaskStore,
    /// The live undo entry, if any.
    pub undo: Option<PendingUndo>,
    /// Frame time, for the undo countdown.
    pub now: Instant,
}

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App, view: &BoardView<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(input::panel_height(app)),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    board_panel::render(frame, chunks[0], app, view);
    input::render_panel(frame, chunks[1], app);
    status_bar::render(frame, chunks[2], app, view);
    input::render_input(frame, chunks[3], app);
}
