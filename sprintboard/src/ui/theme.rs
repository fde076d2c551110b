//! Colors and styles for the board.

use ratatui::style::{Color, Modifier, Style};

use sprintboard_proto::task::{Priority, TaskStatus};

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Warning color (undo affordance).
pub const WARNING: Color = Color::Yellow;

/// Error color (notices, load failure).
pub const ERROR: Color = Color::Red;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (ids, hints, placeholders).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused borders).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Style for failure text.
#[must_use]
pub fn error() -> Style {
    Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
}

/// Style for the undo affordance.
#[must_use]
pub fn warning() -> Style {
    Style::default().fg(WARNING).add_modifier(Modifier::BOLD)
}

/// Title color of a column.
#[must_use]
pub const fn column_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Blue,
        TaskStatus::InProgress => Color::Yellow,
        TaskStatus::Done => Color::Green,
    }
}

/// Style for a column title (bold, column colored).
#[must_use]
pub fn column_title(status: TaskStatus) -> Style {
    Style::default()
        .fg(column_color(status))
        .add_modifier(Modifier::BOLD)
}

/// Badge text and style for a priority.
#[must_use]
pub fn priority_badge(priority: Priority) -> (&'static str, Style) {
    match priority {
        Priority::Low => ("[L]", Style::default().fg(Color::DarkGray)),
        Priority::Medium => ("[M]", Style::default().fg(Color::LightBlue)),
        Priority::High => ("[H]", Style::default().fg(Color::LightRed)),
    }
}

/// Style for the status bar background.
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}
