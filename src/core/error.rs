use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the synchronization engine.
/// Every module returns `Result<T, SyncError>`.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Manifests ───────────────────────────────────────
    #[error("Manifest unavailable at {url}: {reason}")]
    ManifestUnavailable { url: String, reason: String },

    #[error("Manifest at {url} is malformed: {reason}")]
    ManifestMalformed { url: String, reason: String },

    #[error("Version {0} is not listed in the version index")]
    VersionNotFound(String),

    #[error("Invalid Maven coordinate: {0}")]
    InvalidMavenCoordinate(String),

    // ── Rules ───────────────────────────────────────────
    #[error("Platform rules for {0} produced no single decision")]
    RuleAmbiguous(String),

    // ── Artifacts ───────────────────────────────────────
    #[error("Download of {url} to {path:?} failed: {reason}")]
    DownloadFailed {
        path: PathBuf,
        url: String,
        reason: String,
    },

    #[error("Checksum mismatch for {path:?}: expected {expected}, got {actual}")]
    ChecksumMismatchAfterDownload {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Size mismatch for {path:?}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("{} artifact(s) could not be synchronized", failed.len())]
    Incomplete { failed: Vec<PathBuf> },

    #[error("Synchronization was cancelled")]
    Cancelled,

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Config ──────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl From<std::io::Error> for SyncError {
    fn from(source: std::io::Error) -> Self {
        SyncError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl SyncError {
    /// Whether the error belongs to a single artifact rather than the whole pass.
    pub fn is_artifact_level(&self) -> bool {
        matches!(
            self,
            SyncError::DownloadFailed { .. }
                | SyncError::ChecksumMismatchAfterDownload { .. }
                | SyncError::SizeMismatch { .. }
                | SyncError::HttpStatus { .. }
                | SyncError::Http(_)
                | SyncError::Zip(_)
                | SyncError::Io { .. }
        )
    }
}

// Frontends forward errors as plain strings.
impl serde::Serialize for SyncError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
