// Modal system for TUI overlays
//
// Modals capture all input until dismissed. Errors use a modal rather than a
// toast so a failed request cannot go unnoticed.

use crossterm::event::KeyCode;

/// Actions returned by modal input handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    /// Input consumed, no state change needed
    None,
    Close,
    /// Path typed into the open-file prompt
    Submit(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    /// Keyboard shortcuts
    Help,
    /// Blocking error notification
    Error(String),
    /// Path prompt for uploading a dataset
    OpenFile { input: String },
}

impl Modal {
    pub fn error(message: impl Into<String>) -> Self {
        Modal::Error(message.into())
    }

    pub fn open_file() -> Self {
        Modal::OpenFile {
            input: String::new(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Modal::Help => " Help ",
            Modal::Error(_) => " Error ",
            Modal::OpenFile { .. } => " Open dataset ",
        }
    }

    /// Handle keyboard input, return action for caller to execute
    pub fn handle_input(&mut self, key: KeyCode) -> ModalAction {
        match self {
            Modal::OpenFile { input } => match key {
                KeyCode::Esc => ModalAction::Close,
                KeyCode::Enter => {
                    let path = input.trim();
                    if path.is_empty() {
                        ModalAction::None
                    } else {
                        ModalAction::Submit(path.to_string())
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                    ModalAction::None
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    ModalAction::None
                }
                _ => ModalAction::None,
            },
            Modal::Help => match key {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => ModalAction::Close,
                _ => ModalAction::None,
            },
            Modal::Error(_) => match key {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => ModalAction::Close,
                _ => ModalAction::None,
            },
        }
    }
}

/// Help text lines: (key, description)
pub const HELP_ENTRIES: &[(&str, &str)] = &[
    ("o", "Open a dataset"),
    ("t", "Choose prediction target"),
    ("f", "Include / exclude features"),
    ("i", "Feature importance"),
    ("↑/↓ j/k", "Move inside the open panel"),
    ("Space", "Toggle the highlighted feature"),
    ("Enter", "Commit target / toggle feature"),
    ("r", "Recalibrate with the current selection"),
    ("d", "Download the cleaned dataset"),
    ("y", "Copy the insight log"),
    ("c", "Switch theme"),
    ("Esc", "Close panel"),
    ("?", "This help"),
    ("q", "Quit"),
];
