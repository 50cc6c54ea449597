// ─── Sync Orchestrator ───
// Top-level entry point: manifest → resolvers → bounded parallel sync.
//
// Manifest-level failures abort the pass. Artifact failures are collected
// while the rest of the queue drains, then reported together.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::core::config::SyncConfig;
use crate::core::downloader::{Fetcher, HttpFetcher, ManagedRemoteFile, SyncOutcome};
use crate::core::error::{SyncError, SyncResult};
use crate::core::platform::PlatformDescriptor;
use crate::core::resolve::{AssetResolver, GameJarResolver, LibraryResolver};
use crate::core::version::ManifestRepository;

/// Observer for `(completed, total, label)` updates. Called from the
/// synchronizing task as each artifact finishes.
pub trait ProgressSink: Send + Sync {
    fn report(&self, completed: usize, total: usize, label: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn report(&self, completed: usize, total: usize, label: &str) {
        self(completed, total, label)
    }
}

/// Discards all progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _completed: usize, _total: usize, _label: &str) {}
}

/// Cooperative cancellation: no new artifacts start once set; in-flight
/// transfers finish normally.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ArtifactFailure {
    pub path: PathBuf,
    pub url: String,
    pub error: SyncError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Complete,
    Partial { failed: usize },
    Cancelled,
}

/// Aggregate result of one synchronization pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Local paths confirmed present and valid.
    pub verified: Vec<PathBuf>,
    pub downloaded: usize,
    pub already_valid: usize,
    pub failures: Vec<ArtifactFailure>,
    /// Artifacts never started because the pass was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.verified.len() + self.failures.len() + self.skipped
    }

    pub fn status(&self) -> SyncStatus {
        if self.cancelled {
            SyncStatus::Cancelled
        } else if self.failures.is_empty() {
            SyncStatus::Complete
        } else {
            SyncStatus::Partial {
                failed: self.failures.len(),
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status() == SyncStatus::Complete
    }

    /// The verified paths, or an error naming every artifact that failed.
    pub fn into_result(self) -> SyncResult<Vec<PathBuf>> {
        match self.status() {
            SyncStatus::Complete => Ok(self.verified),
            SyncStatus::Cancelled => Err(SyncError::Cancelled),
            SyncStatus::Partial { .. } => Err(SyncError::Incomplete {
                failed: self.failures.into_iter().map(|f| f.path).collect(),
            }),
        }
    }
}

enum Settled {
    Synced(PathBuf, SyncOutcome),
    Failed(ArtifactFailure),
    Skipped,
}

pub struct SyncOrchestrator {
    config: SyncConfig,
    fetcher: Arc<dyn Fetcher>,
    repository: ManifestRepository,
    cancel: CancelHandle,
}

impl SyncOrchestrator {
    /// Orchestrator over HTTP.
    pub fn new(config: SyncConfig) -> SyncResult<Self> {
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new()?);
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: SyncConfig, fetcher: Arc<dyn Fetcher>) -> SyncResult<Self> {
        config.validate()?;
        let repository = ManifestRepository::from_config(fetcher.clone(), &config);
        Ok(Self {
            config,
            fetcher,
            repository,
            cancel: CancelHandle::default(),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Shared manifest cache; repeated passes reuse fetched documents.
    pub fn repository(&self) -> &ManifestRepository {
        &self.repository
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Every artifact `version_id` needs on `platform`, one per local path.
    pub async fn resolve(
        &self,
        version_id: &str,
        platform: &PlatformDescriptor,
    ) -> SyncResult<Vec<ManagedRemoteFile>> {
        let root = &self.config.install_root;
        let manifest = self.repository.version_manifest(version_id).await?;
        let asset_index = self.repository.asset_index(&manifest, root).await?;

        let game = GameJarResolver::new(root, self.config.side)
            .with_mappings(self.config.include_mappings)
            .with_logging_config(self.config.include_logging_config)
            .resolve(&manifest);
        let libraries = LibraryResolver::new(root).resolve(&manifest, platform);
        let assets = AssetResolver::new(root)
            .with_resources_url(&self.config.resources_url)
            .resolve(&asset_index);

        let mut seen = HashSet::new();
        let files: Vec<_> = game
            .into_iter()
            .chain(libraries)
            .chain(assets)
            .filter(|f| seen.insert(f.local_path.clone()))
            .collect();

        info!(
            "Version {} needs {} artifacts on {}",
            version_id,
            files.len(),
            platform
        );
        Ok(files)
    }

    /// Resolve and synchronize `version_id`. `Err` only for manifest-level
    /// problems; artifact failures are in the report.
    pub async fn synchronize(
        &self,
        version_id: &str,
        platform: &PlatformDescriptor,
        progress: &dyn ProgressSink,
    ) -> SyncResult<SyncReport> {
        let files = self.resolve(version_id, platform).await?;
        let report = self.sync_files(files, progress).await;

        match report.status() {
            SyncStatus::Complete => info!(
                "{} synchronized: {} downloaded, {} already valid",
                version_id, report.downloaded, report.already_valid
            ),
            SyncStatus::Partial { failed } => warn!(
                "{} partially synchronized: {} of {} artifacts failed",
                version_id,
                failed,
                report.total()
            ),
            SyncStatus::Cancelled => warn!(
                "{} synchronization cancelled, {} artifacts not started",
                version_id, report.skipped
            ),
        }
        Ok(report)
    }

    /// Synchronize `files` with at most `worker_count` in flight.
    pub async fn sync_files(
        &self,
        files: Vec<ManagedRemoteFile>,
        progress: &dyn ProgressSink,
    ) -> SyncReport {
        let total = files.len();
        let completed = AtomicUsize::new(0);

        let settled: Vec<Settled> = stream::iter(files)
            .map(|file| {
                let completed = &completed;
                async move {
                    if self.cancel.is_cancelled() {
                        return Settled::Skipped;
                    }
                    let outcome = self.sync_with_retries(&file).await;
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.report(done, total, &file.label());

                    match outcome {
                        SyncOutcome::DownloadFailed(error) => {
                            warn!("Failed to sync {:?}: {}", file.local_path, error);
                            Settled::Failed(ArtifactFailure {
                                path: file.local_path,
                                url: file.url,
                                error,
                            })
                        }
                        ok => Settled::Synced(file.local_path, ok),
                    }
                }
            })
            .buffer_unordered(self.config.worker_count.max(1))
            .collect()
            .await;

        let mut report = SyncReport::default();
        for item in settled {
            match item {
                Settled::Synced(path, outcome) => {
                    if matches!(outcome, SyncOutcome::Downloaded) {
                        report.downloaded += 1;
                    } else {
                        report.already_valid += 1;
                    }
                    report.verified.push(path);
                }
                Settled::Failed(failure) => report.failures.push(failure),
                Settled::Skipped => report.skipped += 1,
            }
        }
        // A cancel that arrives after the last artifact started changes nothing.
        report.cancelled = report.skipped > 0;
        report
    }

    async fn sync_with_retries(&self, file: &ManagedRemoteFile) -> SyncOutcome {
        let policy = self.config.policy();
        let mut attempt = 0;
        loop {
            let outcome = file.sync(self.fetcher.as_ref(), policy).await;
            let SyncOutcome::DownloadFailed(error) = &outcome else {
                return outcome;
            };
            if attempt >= self.config.retries
                || !error.is_artifact_level()
                || self.cancel.is_cancelled()
            {
                return outcome;
            }
            attempt += 1;
            warn!(
                "Retrying {} ({}/{}): {}",
                file.label(),
                attempt,
                self.config.retries,
                error
            );
        }
    }
}
