//! The three board columns.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use sprintboard_proto::task::{Task, TaskStatus};

use super::{BoardView, theme};
use crate::app::App;
use crate::board::LoadState;

/// Render the board, or the loading/error/empty state in its place.
pub fn render(frame: &mut Frame, area: Rect, app: &mut App, view: &BoardView<'_>) {
    let load = app.load.clone();
    match load {
        LoadState::Loading => {
            render_message(frame, area, Line::styled("Loading tasks...", theme::dimmed()));
        }
        LoadState::Failed(message) => {
            let line = Line::styled(message, theme::error());
            render_message(frame, area, line);
        }
        LoadState::Ready if view.store.is_empty() => {
            let line = Line::styled(
                "No tasks yet. Type `new <title>` then `submit` to add one.",
                theme::dimmed(),
            );
            render_message(frame, area, line);
        }
        LoadState::Ready => render_columns(frame, area, app, view),
    }
}

fn render_message(frame: &mut Frame, area: Rect, line: Line<'_>) {
    let block = Block::default()
        .title("Board")
        .borders(Borders::ALL)
        .border_style(theme::normal());
    let paragraph = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_columns(frame: &mut Frame, area: Rect, app: &mut App, view: &BoardView<'_>) {
    let show_ids = app.show_ids;
    let visible = app.visible(view.store);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for (status, chunk) in TaskStatus::ALL.into_iter().zip(chunks.iter()) {
        let items: Vec<ListItem> = visible
            .iter()
            .filter(|t| t.status == status)
            .map(|t| task_item(t, show_ids))
            .collect();
        let count = items.len();

        let block = Block::default()
            .title(Line::styled(
                format!("{} ({count})", status.heading()),
                theme::column_title(status),
            ))
            .borders(Borders::ALL)
            .border_style(theme::normal().fg(theme::column_color(status)));

        if items.is_empty() {
            let empty = Paragraph::new(Line::styled("(empty)", theme::dimmed())).block(block);
            frame.render_widget(empty, *chunk);
        } else {
            frame.render_widget(List::new(items).block(block), *chunk);
        }
    }
}

fn task_item(task: &Task, show_ids: bool) -> ListItem<'static> {
    let (badge, badge_style) = theme::priority_badge(task.priority);
    let mut spans = vec![
        Span::styled(badge, badge_style),
        Span::raw(" "),
        Span::styled(task.title.clone(), theme::normal()),
    ];
    if task.id.is_temporary() {
        spans.push(Span::styled(" (saving...)", theme::dimmed()));
    } else if show_ids {
        spans.push(Span::styled(format!(" #{}", task.id), theme::dimmed()));
    }
    ListItem::new(Line::from(spans))
}
