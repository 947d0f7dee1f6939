// Theme system for the TUI
//
// Two built-in palettes, switchable at runtime with `c`.

use crate::logging::LogLevel;
use crate::session::Trend;
use ratatui::style::Color;

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeKind {
    #[default]
    Dark,
    Light,
}

impl ThemeKind {
    pub fn next(self) -> Self {
        match self {
            ThemeKind::Dark => ThemeKind::Light,
            ThemeKind::Light => ThemeKind::Dark,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeKind::Dark => "Dark",
            ThemeKind::Light => "Light",
        }
    }

    pub fn theme(&self) -> Theme {
        match self {
            ThemeKind::Dark => Theme::dark(),
            ThemeKind::Light => Theme::light(),
        }
    }
}

/// Complete theme definition with all UI colors
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    pub highlight: Color,
    pub title: Color,
    pub muted: Color,

    pub selected_bg: Color,
    pub selected_fg: Color,

    // Insight trends
    pub optimized: Color,
    pub degraded: Color,
    pub stable: Color,
    pub init: Color,

    pub warning: Color,
    pub error: Color,

    pub log_info: Color,
    pub log_debug: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::White,
            border: Color::Gray,
            highlight: Color::Cyan,
            title: Color::Cyan,
            muted: Color::DarkGray,

            selected_bg: Color::DarkGray,
            selected_fg: Color::Yellow,

            optimized: Color::Green,
            degraded: Color::Red,
            stable: Color::Blue,
            init: Color::Magenta,

            warning: Color::Yellow,
            error: Color::Red,

            log_info: Color::Blue,
            log_debug: Color::Gray,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::White,
            foreground: Color::Black,
            border: Color::DarkGray,
            highlight: Color::Blue,
            title: Color::Blue,
            muted: Color::Gray,

            selected_bg: Color::LightBlue,
            selected_fg: Color::Black,

            optimized: Color::Green,
            degraded: Color::Red,
            stable: Color::Blue,
            init: Color::Magenta,

            warning: Color::Rgb(184, 134, 11), // Dark goldenrod
            error: Color::Red,

            log_info: Color::Blue,
            log_debug: Color::DarkGray,
        }
    }

    pub fn trend(&self, trend: Trend) -> Color {
        match trend {
            Trend::Optimized => self.optimized,
            Trend::Degraded => self.degraded,
            Trend::Stable => self.stable,
            Trend::Init => self.init,
        }
    }

    pub fn log_level(&self, level: LogLevel) -> Color {
        match level {
            LogLevel::Error => self.error,
            LogLevel::Warn => self.warning,
            LogLevel::Info => self.log_info,
            LogLevel::Debug | LogLevel::Trace => self.log_debug,
        }
    }
}
