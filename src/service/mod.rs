//! Analysis service abstraction
//!
//! The remote service owns all model training and data healing. The client
//! side only needs to ship a file plus a column selection and read back a
//! `Report`, so the boundary is a small trait.
//!
//! # Architecture
//!
//! ```text
//! AnalysisService trait
//! ├── HttpAnalysisService (multipart POST over reqwest::blocking)
//! └── test doubles (session tests)
//! ```
//!
//! Methods are blocking. The TUI runs them on `spawn_blocking` and feeds the
//! result back to the session through a channel.

mod http;

pub use http::HttpAnalysisService;

use crate::session::Report;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Errors from talking to the analysis service
#[derive(Debug)]
pub enum ServiceError {
    /// Connection refused, DNS failure, broken pipe...
    Network(String),
    /// No response within the configured timeout
    Timeout { secs: u64 },
    /// Non-success HTTP status
    Api { status: u16, message: String },
    /// Response body was not a report
    Decode(String),
    /// Local file I/O around a request (reading the upload, writing a download)
    Io(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Timeout { secs } => write!(f, "Service did not answer within {}s", secs),
            Self::Api { status, message } => write!(f, "Service error ({}): {}", status, message),
            Self::Decode(msg) => write!(f, "Malformed service response: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Source file handle. Cheap to clone; bytes are shared, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn read(path: &Path) -> Result<Self, ServiceError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ServiceError::Io(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File name without extension, used to name downloaded artifacts
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("dataset")
    }
}

// The byte payload is noise in logs and panics
impl fmt::Debug for SourceFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceFile")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One analyze/recalibrate call
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub file: SourceFile,
    /// Empty on the initial upload
    pub selected_columns: Vec<String>,
    /// Omitted on the initial upload
    pub target_column: Option<String>,
}

impl AnalysisRequest {
    /// `selected_columns` as the JSON array string the service expects
    pub fn selected_columns_json(&self) -> String {
        serde_json::to_string(&self.selected_columns).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Trait for analysis backends
///
/// Implementations must be `Send + Sync`: the TUI moves them onto the
/// blocking thread pool.
pub trait AnalysisService: Send + Sync {
    /// Human-readable name for logging
    fn name(&self) -> &str;

    /// Run analysis (first upload) or recalibration (later calls)
    fn analyze(&self, request: &AnalysisRequest) -> Result<Report, ServiceError>;

    /// Fetch the cleaned dataset produced by the last successful analysis
    fn download_cleaned(&self) -> Result<Vec<u8>, ServiceError>;
}

/// Fetch the cleaned dataset and write it to `out`, creating parent
/// directories. Returns the number of bytes written.
pub fn save_cleaned(service: &dyn AnalysisService, out: &Path) -> Result<usize, ServiceError> {
    let bytes = service.download_cleaned()?;
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| ServiceError::Io(format!("{}: {}", parent.display(), e)))?;
    }
    std::fs::write(out, &bytes)
        .map_err(|e| ServiceError::Io(format!("{}: {}", out.display(), e)))?;
    tracing::info!("Downloaded cleaned dataset to {}", out.display());
    Ok(bytes.len())
}
