// ─── Sync Configuration ───
// Inputs that tune a synchronization pass. Read-only: persisting it is the
// embedding application's job.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::assets::{ASSET_INDEX_FALLBACK_URL, RESOURCES_URL};
use crate::core::downloader::SyncPolicy;
use crate::core::error::{SyncError, SyncResult};
use crate::core::version::VERSION_INDEX_URL;

const APP_DIR_NAME: &str = "launcher-sync";

/// Which distribution's game jar is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Client,
    Server,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub install_root: PathBuf,
    /// Where raw version documents are kept. Defaults to `<install_root>/versions`.
    pub manifest_cache_dir: Option<PathBuf>,
    /// Parallel artifact transfers.
    pub worker_count: usize,
    /// Extra attempts per failed artifact.
    pub retries: u32,
    pub version_index_url: String,
    pub asset_index_fallback_url: String,
    pub resources_url: String,
    pub enforce_size: bool,
    pub repair_natives: bool,
    pub side: Side,
    pub include_mappings: bool,
    pub include_logging_config: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            install_root: default_install_root(),
            manifest_cache_dir: None,
            worker_count: 8,
            retries: 0,
            version_index_url: VERSION_INDEX_URL.to_string(),
            asset_index_fallback_url: ASSET_INDEX_FALLBACK_URL.to_string(),
            resources_url: RESOURCES_URL.to_string(),
            enforce_size: true,
            repair_natives: true,
            side: Side::Client,
            include_mappings: false,
            include_logging_config: true,
        }
    }
}

impl SyncConfig {
    pub fn for_root(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            ..Self::default()
        }
    }

    /// Read and validate a JSON config file. Missing fields take defaults.
    pub fn load(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| SyncError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SyncConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> SyncResult<()> {
        if self.worker_count == 0 {
            return Err(SyncError::InvalidConfig(
                "worker_count must be at least 1".into(),
            ));
        }
        if self.install_root.as_os_str().is_empty() {
            return Err(SyncError::InvalidConfig("install_root is empty".into()));
        }
        Ok(())
    }

    pub fn manifest_cache_dir(&self) -> PathBuf {
        self.manifest_cache_dir
            .clone()
            .unwrap_or_else(|| self.install_root.join("versions"))
    }

    pub fn policy(&self) -> SyncPolicy {
        SyncPolicy {
            enforce_size: self.enforce_size,
            repair_natives: self.repair_natives,
        }
    }
}

fn default_install_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
