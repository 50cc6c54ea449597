pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::config::{Side, SyncConfig};
pub use crate::core::downloader::{
    Checksum, ExtractionDirective, Fetcher, HttpFetcher, ManagedRemoteFile, SyncOutcome,
    SyncPolicy,
};
pub use crate::core::error::{SyncError, SyncResult};
pub use crate::core::platform::{evaluate, OsFamily, PlatformDescriptor, PlatformRule, RuleAction};
pub use crate::core::resolve::{AssetResolver, GameJarResolver, LibraryResolver};
pub use crate::core::sync::{
    CancelHandle, NoProgress, ProgressSink, SyncOrchestrator, SyncReport, SyncStatus,
};
pub use crate::core::version::{ManifestRepository, VersionIndex, VersionManifest};

/// Install structured logging for embedders that have none of their own.
/// Honors `RUST_LOG`; a second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,launcher_sync=debug")),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
        tracing::info!("tracing initialized twice");
    }
}
