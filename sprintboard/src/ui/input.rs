//! Command input box, creation form and help panel.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::{App, Draft};

/// Command reference shown by `help`.
pub const HELP_LINES: [&str; 7] = [
    "move <id> <todo|inprogress|done>   move a task (undo within 5s: `undo` or Ctrl+Z)",
    "new [title]  title <text>  desc <text>  priority <low|medium|high>  submit  cancel",
    "rm <id>                            delete a task",
    "search [text]                      filter titles (empty clears)",
    "filter <all|low|medium|high>       filter by priority",
    "ids                                toggle task ids",
    "help  quit                         Esc clears input or closes the form",
];

/// Height the optional panel between board and status bar needs.
#[must_use]
pub fn panel_height(app: &App) -> u16 {
    if app.draft.is_some() {
        5
    } else if app.show_help {
        9
    } else {
        0
    }
}

/// Render the creation form or the help panel, whichever is open.
pub fn render_panel(frame: &mut Frame, area: Rect, app: &App) {
    if let Some(draft) = &app.draft {
        render_draft(frame, area, draft);
    } else if app.show_help {
        let lines: Vec<Line> = HELP_LINES
            .iter()
            .map(|l| Line::styled(*l, theme::dimmed()))
            .collect();
        let block = Block::default().title("Help").borders(Borders::ALL);
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }
}

fn render_draft(frame: &mut Frame, area: Rect, draft: &Draft) {
    let field = |name: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<9}"), theme::dimmed()),
            Span::styled(value, theme::normal()),
        ])
    };
    let lines = vec![
        field("title", draft.title.clone()),
        field("desc", draft.description.clone()),
        field("priority", draft.priority.to_string()),
    ];
    let block = Block::default()
        .title("New task (submit / cancel)")
        .borders(Borders::ALL)
        .border_style(theme::highlighted());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Render the input box with a block cursor.
pub fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let mut display_text = app.input.clone();
    if app.cursor_position >= display_text.len() {
        display_text.push('█');
    } else {
        display_text.insert(app.cursor_position, '█');
    }

    let block = Block::default()
        .title("Command (type `help`)")
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    let paragraph = Paragraph::new(Line::styled(display_text, theme::normal())).block(block);
    frame.render_widget(paragraph, area);
}
