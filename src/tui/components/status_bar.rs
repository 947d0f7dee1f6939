// Status bar component
//
// Key hints at the bottom. Hints depend on whether a panel is open so the
// user always sees what the arrows and Enter do right now.

use crate::session::Panel;
use crate::tui::app::App;
use crate::tui::layout::Breakpoint;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// (key, action) pairs for the current state
pub fn hints(app: &App) -> Vec<(&'static str, &'static str)> {
    match app.session.active_panel() {
        Some(Panel::TargetPicker) => vec![("↑↓", "move"), ("Enter", "set target"), ("Esc", "close")],
        Some(Panel::FeaturePicker) => vec![("↑↓", "move"), ("Space", "toggle"), ("Esc", "close")],
        Some(Panel::Importance) => vec![("↑↓", "move"), ("Esc", "close")],
        None if app.session.report().is_none() => {
            vec![("o", "open"), ("?", "help"), ("q", "quit")]
        }
        None => vec![
            ("o", "open"),
            ("t", "target"),
            ("f", "features"),
            ("i", "importance"),
            ("r", "recalibrate"),
            ("d", "download"),
            ("y", "copy"),
            ("?", "help"),
            ("q", "quit"),
        ],
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let compact = !Breakpoint::from_width(area.width).at_least(Breakpoint::Normal);

    let mut spans = vec![Span::raw(" ")];
    for (key, action) in hints(app) {
        spans.push(Span::styled(key, Style::default().fg(theme.highlight)));
        if !compact {
            spans.push(Span::styled(
                format!(" {}", action),
                Style::default().fg(theme.muted),
            ));
        }
        spans.push(Span::raw("  "));
    }

    let selected = app.session.selected_columns().len();
    if app.session.report().is_some() && !compact {
        let target = app.session.selected_target().unwrap_or("-");
        spans.push(Span::styled(
            format!("│ target {} · {} features", target, selected),
            Style::default().fg(theme.foreground),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
