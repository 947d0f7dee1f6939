//! Session error types

use crate::service::ServiceError;
use std::fmt;

/// Client-side precondition that failed before any request went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// No file has been uploaded yet
    NoFile,
    /// No prediction target is selected
    NoTarget,
    /// No successful analysis yet, so there is nothing to download
    NoReport,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFile => write!(f, "Upload a dataset first"),
            Self::NoTarget => write!(f, "Select a target column first"),
            Self::NoReport => write!(f, "Run an analysis before downloading"),
        }
    }
}

/// Errors surfaced by session operations
#[derive(Debug)]
pub enum SessionError {
    /// A request is already in flight; the call was dropped
    Busy,
    /// Precondition failed; no request was issued
    Validation(Validation),
    /// The request failed; session state is unchanged apart from going idle
    Transport(ServiceError),
    /// A completion arrived with no matching request in flight
    NothingInFlight,
}

impl SessionError {
    /// Whether the user should see this in a blocking notification
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Transport(_))
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "A request is already running"),
            Self::Validation(v) => write!(f, "{}", v),
            Self::Transport(e) => write!(f, "Request failed: {}", e),
            Self::NothingInFlight => write!(f, "No request is in flight"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Validation> for SessionError {
    fn from(v: Validation) -> Self {
        Self::Validation(v)
    }
}

impl From<ServiceError> for SessionError {
    fn from(e: ServiceError) -> Self {
        Self::Transport(e)
    }
}
