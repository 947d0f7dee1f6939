// Title bar component
//
// Renders the app name, the loaded dataset and a spinner while a request runs.

use crate::session::Phase;
use crate::tui::app::App;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Status word shown after the dataset name
pub fn phase_label(app: &App) -> String {
    let spinner = app.spinner();
    match app.session.phase() {
        Phase::Empty => "no dataset".to_string(),
        Phase::Analyzing => format!("{} analyzing", spinner),
        Phase::Ready if app.downloading => format!("{} downloading", spinner),
        Phase::Ready => "ready".to_string(),
        Phase::Recalibrating => format!("{} recalibrating", spinner),
    }
}

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let dataset = app
        .session
        .file()
        .map(|file| file.name().to_string())
        .unwrap_or_else(|| "-".to_string());

    let phase_style = if app.session.is_busy() || app.downloading {
        Style::default().fg(theme.warning)
    } else {
        Style::default().fg(theme.muted)
    };

    let line = Line::from(vec![
        Span::styled(
            " healdash ",
            Style::default()
                .fg(theme.title)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(theme.border)),
        Span::styled(dataset, Style::default().fg(theme.foreground)),
        Span::styled(" │ ", Style::default().fg(theme.border)),
        Span::styled(phase_label(app), phase_style),
        Span::styled(" │ ", Style::default().fg(theme.border)),
        Span::styled(app.service_url.as_str(), Style::default().fg(theme.muted)),
    ]);

    f.render_widget(Paragraph::new(line), area);
}
