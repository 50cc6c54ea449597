// ─── Managed Remote File ───
// A local path bound to a remote source and an expected digest, with a
// single idempotent "ensure present and valid" operation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::checksum::Checksum;
use super::client::Fetcher;
use super::extract::{extract_archive, missing_entries, ExtractionDirective};
use crate::core::error::{SyncError, SyncResult};

/// Knobs that change how `sync` treats an artifact.
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    /// Fail when the downloaded byte count differs from the declared size.
    pub enforce_size: bool,
    /// On a cache hit, re-extract archives whose natives are missing.
    pub repair_natives: bool,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            enforce_size: true,
            repair_natives: true,
        }
    }
}

/// Result of a single `sync` call.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Local content already matched; nothing was transferred.
    AlreadyValid,
    /// Content was (re)downloaded and verified.
    Downloaded,
    DownloadFailed(SyncError),
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, SyncOutcome::DownloadFailed(_))
    }
}

/// One artifact to materialize on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedRemoteFile {
    pub local_path: PathBuf,
    pub url: String,
    pub checksum: Checksum,
    /// Declared size in bytes, informational unless the policy enforces it.
    pub size: Option<u64>,
    pub extraction: Option<ExtractionDirective>,
}

impl ManagedRemoteFile {
    pub fn new(local_path: PathBuf, url: impl Into<String>, checksum: Checksum) -> Self {
        Self {
            local_path,
            url: url.into(),
            checksum,
            size: None,
            extraction: None,
        }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    pub fn with_extraction(mut self, directive: ExtractionDirective) -> Self {
        self.extraction = Some(directive);
        self
    }

    /// Short label for progress reporting.
    pub fn label(&self) -> String {
        self.local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.url.clone())
    }

    /// Ensure the file is present and valid, downloading only when needed.
    pub async fn sync(&self, fetcher: &dyn Fetcher, policy: SyncPolicy) -> SyncOutcome {
        match self.try_sync(fetcher, policy).await {
            Ok(outcome) => outcome,
            Err(e) => SyncOutcome::DownloadFailed(e),
        }
    }

    async fn try_sync(&self, fetcher: &dyn Fetcher, policy: SyncPolicy) -> SyncResult<SyncOutcome> {
        if self.checksum.verify_file(&self.local_path).await? {
            if policy.repair_natives {
                self.repair_extraction().await?;
            }
            debug!("Cache hit: {:?}", self.local_path);
            return Ok(SyncOutcome::AlreadyValid);
        }

        if let Some(parent) = self.local_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SyncError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let written = fetcher
            .download_to(&self.url, &self.local_path)
            .await
            .map_err(|e| match e {
                SyncError::Io { .. } => e,
                other => SyncError::DownloadFailed {
                    path: self.local_path.clone(),
                    url: self.url.clone(),
                    reason: other.to_string(),
                },
            })?;

        self.verify_download(written, policy).await?;

        if let Some(directive) = &self.extraction {
            self.extract(directive.clone()).await?;
        }

        info!("Downloaded {} -> {:?}", self.url, self.local_path);
        Ok(SyncOutcome::Downloaded)
    }

    /// Verify freshly written bytes; a bad file is removed so the next pass
    /// does not mistake it for a partial cache.
    async fn verify_download(&self, written: u64, policy: SyncPolicy) -> SyncResult<()> {
        if policy.enforce_size {
            if let Some(expected) = self.size {
                if expected != written {
                    discard(&self.local_path).await;
                    return Err(SyncError::SizeMismatch {
                        path: self.local_path.clone(),
                        expected,
                        actual: written,
                    });
                }
            }
        }

        if let Some(expected) = self.checksum.expected() {
            let actual = self
                .checksum
                .digest_file(&self.local_path)
                .await?
                .unwrap_or_default();
            if !actual.eq_ignore_ascii_case(expected) {
                discard(&self.local_path).await;
                return Err(SyncError::ChecksumMismatchAfterDownload {
                    path: self.local_path.clone(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        Ok(())
    }

    async fn extract(&self, directive: ExtractionDirective) -> SyncResult<usize> {
        let archive = self.local_path.clone();
        tokio::task::spawn_blocking(move || extract_archive(&archive, &directive))
            .await
            .map_err(|e| SyncError::Other(format!("extraction task failed: {e}")))?
    }

    async fn repair_extraction(&self) -> SyncResult<()> {
        let Some(directive) = &self.extraction else {
            return Ok(());
        };

        let archive = self.local_path.clone();
        let wanted = directive.clone();
        let missing = tokio::task::spawn_blocking(move || missing_entries(&archive, &wanted))
            .await
            .map_err(|e| SyncError::Other(format!("natives check failed: {e}")))??;

        if missing > 0 {
            warn!(
                "{} native entries from {:?} missing in {:?}, re-extracting",
                missing, self.local_path, directive.target_dir
            );
            self.extract(directive.clone()).await?;
        }
        Ok(())
    }
}

async fn discard(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        debug!("Could not remove rejected download {:?}: {}", path, e);
    }
}
