use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Catalog ─────────────────────────────────────────
    #[error("Version catalog unavailable ({url}): {reason}")]
    CatalogUnavailable { url: String, reason: String },

    #[error("Version not found in catalog: {0}")]
    VersionNotFound(String),

    // ── Network ─────────────────────────────────────────
    #[error("Download failed for {url}: {reason}")]
    DownloadFailed { url: String, reason: String },

    // ── Java ────────────────────────────────────────────
    #[error("Java {major} runtime absent (installation triggered: {install_triggered})")]
    RuntimeAbsent { major: u32, install_triggered: bool },

    #[error("Java runtime version mismatch: expected {expected}, found {}", describe_major(.found))]
    RuntimeVersionMismatch { expected: u32, found: Option<u32> },

    #[error("Java {major} installation failed: {reason}")]
    InstallFailed { major: u32, reason: String },

    // ── Launch ──────────────────────────────────────────
    #[error("Launch failed: {0}")]
    LaunchError(String),

    #[error("Authentication failed for {0}")]
    AuthenticationFailed(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Config ──────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Wrap an IO failure together with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LauncherError::Io {
            path: path.into(),
            source,
        }
    }
}

fn describe_major(found: &Option<u32>) -> String {
    match found {
        Some(major) => major.to_string(),
        None => "unknown".into(),
    }
}
