// UI rendering - draws one dashboard frame from App state
//
// Rendering is read-only: nothing here mutates the session. Overlays are
// drawn last in fixed order (panel dropdown, modal, toast) so the modal
// always sits above an open panel.

use super::app::App;
use super::components::{logs_panel, status_bar, title_bar};
use super::layout::{centered_rect, Breakpoint, DashboardAreas};
use super::modal::{Modal, HELP_ENTRIES};
use crate::session::{Panel, Phase, Report, INSIGHT_LOG_CAPACITY};
use crate::util::fit_width;
use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Wrap},
    Frame,
};
use serde_json::Value;

/// Widest a preview cell may get before it is cut
const PREVIEW_CELL_WIDTH: usize = 14;

/// Main UI render function - called on every frame
pub fn draw(f: &mut Frame, app: &App) {
    let bg_block = Block::default().style(Style::default().bg(app.theme.background));
    f.render_widget(bg_block, f.area());

    let areas = DashboardAreas::compute(f.area(), app.settings.preview_rows);

    title_bar::render(f, areas.title, app);
    match app.session.report() {
        Some(report) => {
            render_stats(f, areas.stats, app, report);
            render_diagnostics(f, areas.diagnostics, app, report);
            render_preview(f, areas.preview, app, report);
        }
        None => {
            // Empty placeholder spans the whole left column
            let left = Rect {
                height: areas.stats.height + areas.diagnostics.height + areas.preview.height,
                ..areas.stats
            };
            render_empty(f, left, app);
        }
    }
    render_insights(f, areas.insights, app);

    let entries = app.log_buffer.tail(logs_panel::visible_rows(areas.logs));
    logs_panel::render(f, areas.logs, &entries, app.log_buffer.len(), &app.theme);
    status_bar::render(f, areas.status, app);

    if app.session.active_panel().is_some() {
        render_panel(f, app);
    }
    if let Some(modal) = &app.modal {
        render_modal(f, app, modal);
    }
    if let Some(toast) = &app.toast {
        toast.render(f, f.area(), &app.theme);
    }
}

fn bordered(title: &str, app: &App) -> Block<'static> {
    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border))
}

fn render_empty(f: &mut Frame, area: Rect, app: &App) {
    let text = if app.session.is_busy() {
        format!("{} Analyzing dataset...", app.spinner())
    } else {
        "No dataset loaded.\n\nPress o to open a CSV file.".to_string()
    };
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.muted))
        .block(bordered("Dataset", app));
    f.render_widget(paragraph, area);
}

fn render_stats(f: &mut Frame, area: Rect, app: &App, report: &Report) {
    let theme = &app.theme;
    let stats = &report.stats;
    let label = Style::default().fg(theme.muted);
    let value = Style::default()
        .fg(theme.foreground)
        .add_modifier(Modifier::BOLD);

    let mut accuracy = vec![
        Span::styled("Accuracy ", label),
        Span::styled(report.accuracy_label(), value),
        Span::styled("   Target ", label),
        Span::styled(stats.target_used.as_str(), value),
    ];
    if report.leakage_suspected() {
        accuracy.push(Span::styled(
            "   ⚠ possible target leakage",
            Style::default().fg(theme.warning),
        ));
    }

    let lines = vec![
        Line::from(accuracy),
        Line::from(vec![
            Span::styled("Rows ", label),
            Span::styled(stats.rows.to_string(), value),
            Span::styled("   Missing ", label),
            Span::styled(
                format!("{} → {}", stats.missing_before, stats.missing_after),
                value,
            ),
            Span::styled("   Healed ", label),
            Span::styled(report.total_healed().to_string(), value),
        ]),
        Line::from(vec![
            Span::styled("Features ", label),
            Span::styled(
                format!(
                    "{} of {}",
                    app.session.selected_columns().len(),
                    report.column_diagnostics.len()
                ),
                value,
            ),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(bordered("Stats", app)), area);
}

fn render_diagnostics(f: &mut Frame, area: Rect, app: &App, report: &Report) {
    let theme = &app.theme;
    let target = app.session.selected_target();
    let wide = Breakpoint::from_width(area.width).at_least(Breakpoint::Wide);

    let header = Row::new(["", "Column", "Type", "Unique", "Missing"])
        .style(Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = report
        .column_diagnostics
        .iter()
        .map(|col| {
            let marker = if target == Some(col.identifier.as_str()) {
                "◎"
            } else if app.session.is_selected(&col.identifier) {
                "●"
            } else {
                "○"
            };
            let mut name = col.label.clone();
            if wide && col.label != col.identifier {
                name = format!("{} ({})", col.label, col.identifier);
            }
            let mut unique = Cell::from(col.cardinality.to_string());
            if col.is_potential_id(report.stats.rows) {
                unique = Cell::from(format!("{} ID?", col.cardinality))
                    .style(Style::default().fg(theme.warning));
            }
            Row::new(vec![
                Cell::from(marker),
                Cell::from(name),
                Cell::from(col.kind.clone()),
                unique,
                Cell::from(format!("{:.1}%", col.missing_pct)),
            ])
            .style(Style::default().fg(theme.foreground))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(2),
            Constraint::Min(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(bordered("Columns", app));
    f.render_widget(table, area);
}

fn preview_cell(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    fit_width(&text, PREVIEW_CELL_WIDTH)
}

fn render_preview(f: &mut Frame, area: Rect, app: &App, report: &Report) {
    let theme = &app.theme;
    let columns: Vec<&str> = report.column_ids().collect();
    if report.preview_rows.is_empty() || columns.is_empty() {
        let empty = Paragraph::new("No preview rows")
            .style(Style::default().fg(theme.muted))
            .block(bordered("Preview", app));
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(
        columns
            .iter()
            .map(|c| fit_width(c, PREVIEW_CELL_WIDTH))
            .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = report
        .preview_rows
        .iter()
        .take(app.settings.preview_rows)
        .map(|row| {
            Row::new(
                columns
                    .iter()
                    .map(|c| row.get(*c).map(preview_cell).unwrap_or_default())
                    .collect::<Vec<_>>(),
            )
            .style(Style::default().fg(theme.foreground))
        })
        .collect();

    let widths = vec![Constraint::Length(PREVIEW_CELL_WIDTH as u16); columns.len()];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(bordered("Preview", app));
    f.render_widget(table, area);
}

fn render_insights(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let log = app.session.insight_log();

    if log.is_empty() {
        let empty = Paragraph::new("Insights appear after the first analysis.")
            .style(Style::default().fg(theme.muted))
            .wrap(Wrap { trim: true })
            .block(bordered("Insights", app));
        f.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line> = Vec::new();
    for entry in log.iter() {
        let color = theme.trend(entry.trend);
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ", entry.trend),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(entry.diff_label.as_str(), Style::default().fg(color)),
            Span::styled(
                format!("  {}", entry.timestamp),
                Style::default().fg(theme.muted),
            ),
        ]));
        lines.push(Line::styled(
            entry.message.as_str(),
            Style::default().fg(theme.foreground),
        ));
        lines.push(Line::raw(""));
    }

    let mut title = format!("Insights {}/{}", log.len(), INSIGHT_LOG_CAPACITY);
    if app.session.phase() == Phase::Recalibrating {
        title.push(' ');
        title.push(app.spinner());
    }
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(bordered(&title, app));
    f.render_widget(paragraph, area);
}

/// Dropdown for the open auxiliary panel
fn render_panel(f: &mut Frame, app: &App) {
    let Some(panel) = app.session.active_panel() else {
        return;
    };
    let theme = &app.theme;
    let items = app.panel_items();

    let list_items: Vec<ListItem> = items
        .iter()
        .map(|item| {
            let text = match panel {
                Panel::TargetPicker => {
                    let mark = if item.marked { "◎" } else { " " };
                    format!("{} {}", mark, item.identifier)
                }
                Panel::FeaturePicker => {
                    let mark = if item.marked { "[x]" } else { "[ ]" };
                    format!("{} {}", mark, item.identifier)
                }
                Panel::Importance => {
                    let score = item.score.unwrap_or(0.0);
                    // Ten-cell bar relative to a score of 1.0
                    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
                    format!(
                        "{:<18} {:<10} {:.3}",
                        fit_width(&item.identifier, 18),
                        "█".repeat(filled),
                        score
                    )
                }
            };
            let style = if panel == Panel::Importance && !item.marked {
                Style::default().fg(theme.muted)
            } else {
                Style::default().fg(theme.foreground)
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let height = (items.len() as u16 + 2).clamp(3, 20);
    let width = if panel == Panel::Importance { 46 } else { 36 };
    let area = centered_rect(width, height, f.area());

    let block = Block::default()
        .title(format!(" {} ", panel.title()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.highlight))
        .style(Style::default().bg(theme.background));

    let list = if list_items.is_empty() {
        List::new(vec![ListItem::new("No columns")])
    } else {
        List::new(list_items)
    }
    .block(block)
    .highlight_style(
        Style::default()
            .bg(theme.selected_bg)
            .fg(theme.selected_fg)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(app.cursor.min(items.len() - 1)));
    }

    f.render_widget(Clear, area);
    f.render_stateful_widget(list, area, &mut state);
}

fn render_modal(f: &mut Frame, app: &App, modal: &Modal) {
    let theme = &app.theme;
    let (lines, width, border): (Vec<Line>, u16, _) = match modal {
        Modal::Help => {
            let mut lines = vec![Line::raw("")];
            for (key, desc) in HELP_ENTRIES {
                lines.push(Line::from(vec![
                    Span::styled(format!("  {:<10}", key), Style::default().fg(theme.highlight)),
                    Span::styled(*desc, Style::default().fg(theme.foreground)),
                ]));
            }
            (lines, 52, theme.highlight)
        }
        Modal::Error(message) => (
            vec![
                Line::raw(""),
                Line::styled(message.as_str(), Style::default().fg(theme.foreground)),
                Line::raw(""),
                Line::styled("Enter / Esc to dismiss", Style::default().fg(theme.muted)),
            ],
            60,
            theme.error,
        ),
        Modal::OpenFile { input } => (
            vec![
                Line::raw(""),
                Line::from(vec![
                    Span::styled("Path: ", Style::default().fg(theme.muted)),
                    Span::styled(input.as_str(), Style::default().fg(theme.foreground)),
                    Span::styled("▏", Style::default().fg(theme.highlight)),
                ]),
                Line::raw(""),
                Line::styled("Enter to upload, Esc to cancel", Style::default().fg(theme.muted)),
            ],
            60,
            theme.highlight,
        ),
    };

    let height = lines.len() as u16 + 4;
    let area = centered_rect(width, height, f.area());
    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(modal.title())
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .style(Style::default().bg(theme.background)),
        );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}
