/// Responsive layout for the dashboard.
///
/// Single source of truth for width thresholds and region sizes, so render
/// code never hardcodes magic numbers.
use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// < 80 cols: panes stacked vertically
    Compact,
    /// 80-139 cols: side by side
    Normal,
    /// 140+ cols: side by side, extra columns in tables
    Wide,
}

impl Breakpoint {
    pub fn from_width(width: u16) -> Self {
        match width {
            0..=79 => Breakpoint::Compact,
            80..=139 => Breakpoint::Normal,
            _ => Breakpoint::Wide,
        }
    }

    /// Check if at least this breakpoint (inclusive)
    pub fn at_least(&self, min: Breakpoint) -> bool {
        self.ordinal() >= min.ordinal()
    }

    fn ordinal(&self) -> u8 {
        match self {
            Breakpoint::Compact => 0,
            Breakpoint::Normal => 1,
            Breakpoint::Wide => 2,
        }
    }
}

/// Stats block: three text lines plus borders
const STATS_HEIGHT: u16 = 5;
const LOGS_HEIGHT: u16 = 8;

/// Screen regions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardAreas {
    pub title: Rect,
    pub stats: Rect,
    pub diagnostics: Rect,
    pub preview: Rect,
    pub insights: Rect,
    pub logs: Rect,
    pub status: Rect,
}

impl DashboardAreas {
    /// Split `area` into dashboard regions. `preview_rows` is the number of
    /// data rows the preview table should fit.
    pub fn compute(area: Rect, preview_rows: usize) -> Self {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(10),
                Constraint::Length(LOGS_HEIGHT),
                Constraint::Length(1),
            ])
            .split(area);

        let direction = if Breakpoint::from_width(area.width).at_least(Breakpoint::Normal) {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let body = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
            .split(outer[1]);

        // Header row plus borders
        let preview_height = (preview_rows as u16).saturating_add(3);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(STATS_HEIGHT),
                Constraint::Min(5),
                Constraint::Length(preview_height),
            ])
            .split(body[0]);

        Self {
            title: outer[0],
            stats: left[0],
            diagnostics: left[1],
            preview: left[2],
            insights: body[1],
            logs: outer[2],
            status: outer[3],
        }
    }
}

/// Rect of `width` x `height` centered in `area`, clamped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
