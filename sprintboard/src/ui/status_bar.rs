//! Status bar rendering.

use std::time::Duration;

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{BoardView, theme};
use crate::app::App;

/// Render the status bar: filter, undo affordance, latest notice.
pub fn render(frame: &mut Frame, area: Rect, app: &App, view: &BoardView<'_>) {
    let mut spans = vec![
        Span::styled("Sprint Board", theme::bold()),
        Span::raw(" | "),
        Span::styled(format!("filter: {}", app.filter.priority), theme::dimmed()),
    ];

    let search = app.filter.search.trim();
    if !search.is_empty() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(format!("search: \"{search}\""), theme::dimmed()));
    }

    let offer = view
        .undo
        .as_ref()
        .filter(|p| app.undo_offer.as_ref() == Some(&p.task_id));
    if let Some(pending) = offer {
        let left = pending.expires_at.saturating_duration_since(view.now);
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!(
                "Moved {} from {}. Undo ({}s): Ctrl+Z",
                pending.task_id,
                pending.previous_status.heading(),
                whole_seconds(left)
            ),
            theme::warning(),
        ));
    }

    if let Some(notice) = app.latest_notice() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(notice.to_string(), theme::error()));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}

/// Seconds remaining, rounded up.
fn whole_seconds(left: Duration) -> u64 {
    left.as_secs() + u64::from(left.subsec_nanos() > 0)
}
