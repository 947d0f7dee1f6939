//! Logs panel component
//!
//! Shows the newest entries of the tracing log captured by `TuiLogLayer`,
//! color-coded by severity.

use crate::logging::LogEntry;
use crate::tui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Render the last entries that fit in `area`; `total` is the buffer size
pub fn render(f: &mut Frame, area: Rect, entries: &[LogEntry], total: usize, theme: &Theme) {
    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S ").to_string(),
                    Style::default().fg(theme.muted),
                ),
                Span::styled(
                    format!("{:<5} ", entry.level.as_str()),
                    Style::default().fg(theme.log_level(entry.level)),
                ),
                Span::styled(entry.message.as_str(), Style::default().fg(theme.foreground)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Logs ({}) ", total))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(list, area);
}

/// Number of entries that fit inside a bordered panel of `area`
pub fn visible_rows(area: Rect) -> usize {
    area.height.saturating_sub(2) as usize
}
