// ─── Manifest Repository ───
// Fetches, persists and memoizes the version index, per-version manifests
// and asset indexes. Each key is fetched at most once per repository, even
// under concurrent callers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::manifest::{VersionIndex, VERSION_INDEX_URL};
use super::version_file::VersionManifest;
use crate::core::assets::{AssetIndexManifest, ASSET_INDEX_FALLBACK_URL};
use crate::core::config::SyncConfig;
use crate::core::downloader::{Checksum, Fetcher};
use crate::core::error::{SyncError, SyncResult};

const INDEX_FILE_NAME: &str = "version_manifest_v2.json";

type CellMap<T> = Mutex<HashMap<String, Arc<OnceCell<Arc<T>>>>>;

pub struct ManifestRepository {
    fetcher: Arc<dyn Fetcher>,
    index_url: String,
    asset_index_fallback_url: String,
    cache_dir: PathBuf,
    index: OnceCell<Arc<VersionIndex>>,
    manifests: CellMap<VersionManifest>,
    asset_indexes: CellMap<AssetIndexManifest>,
}

impl ManifestRepository {
    /// Repository against the official endpoints, caching raw documents in `cache_dir`.
    pub fn new(fetcher: Arc<dyn Fetcher>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            index_url: VERSION_INDEX_URL.to_string(),
            asset_index_fallback_url: ASSET_INDEX_FALLBACK_URL.to_string(),
            cache_dir: cache_dir.into(),
            index: OnceCell::new(),
            manifests: Mutex::new(HashMap::new()),
            asset_indexes: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(fetcher: Arc<dyn Fetcher>, config: &SyncConfig) -> Self {
        let mut repo = Self::new(fetcher, config.manifest_cache_dir());
        repo.index_url = config.version_index_url.clone();
        repo.asset_index_fallback_url = config.asset_index_fallback_url.clone();
        repo
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// The top-level version index.
    pub async fn version_index(&self) -> SyncResult<Arc<VersionIndex>> {
        self.index
            .get_or_try_init(|| async {
                info!("Fetching version index from {}", self.index_url);
                let index: VersionIndex = self
                    .load_document(
                        &self.index_url,
                        &Checksum::None,
                        &self.cache_dir.join(INDEX_FILE_NAME),
                    )
                    .await?;
                info!("Loaded {} versions from index", index.versions.len());
                Ok::<_, SyncError>(Arc::new(index))
            })
            .await
            .cloned()
    }

    /// The manifest for version `id`, fetched once and shared afterwards.
    pub async fn version_manifest(&self, id: &str) -> SyncResult<Arc<VersionManifest>> {
        let cell = cell_for(&self.manifests, id);
        let manifest = cell
            .get_or_try_init(|| async {
                let index = self.version_index().await?;
                let entry = index
                    .find(id)
                    .ok_or_else(|| SyncError::VersionNotFound(id.to_string()))?;

                info!("Fetching manifest for {}", id);
                let manifest: VersionManifest = self
                    .load_document(
                        &entry.url,
                        &Checksum::sha1_or_none(entry.sha1.as_deref()),
                        &self.cache_dir.join(format!("{id}.json")),
                    )
                    .await?;
                debug!(
                    "Manifest {} lists {} libraries",
                    manifest.id,
                    manifest.libraries.len()
                );
                Ok::<_, SyncError>(Arc::new(manifest))
            })
            .await?;
        Ok(manifest.clone())
    }

    /// The asset index referenced by `manifest`, also written to
    /// `<install_root>/assets/indexes/<id>.json`.
    pub async fn asset_index(
        &self,
        manifest: &VersionManifest,
        install_root: &Path,
    ) -> SyncResult<Arc<AssetIndexManifest>> {
        let reference = manifest.asset_index.as_ref().ok_or_else(|| {
            SyncError::ManifestMalformed {
                url: manifest.id.clone(),
                reason: "manifest has no assetIndex".into(),
            }
        })?;

        let url = match reference.url.as_deref().filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => {
                let sha1 = reference.sha1.as_deref().ok_or_else(|| {
                    SyncError::ManifestMalformed {
                        url: manifest.id.clone(),
                        reason: format!("asset index {} has neither url nor sha1", reference.id),
                    }
                })?;
                format!(
                    "{}/{}/{}.json",
                    self.asset_index_fallback_url.trim_end_matches('/'),
                    sha1,
                    reference.id
                )
            }
        };

        let cell = cell_for(&self.asset_indexes, &reference.id);
        let index = cell
            .get_or_try_init(|| async {
                info!("Fetching asset index {}", reference.id);
                let dest = install_root
                    .join("assets")
                    .join("indexes")
                    .join(format!("{}.json", reference.id));
                let index: AssetIndexManifest = self
                    .load_document(
                        &url,
                        &Checksum::sha1_or_none(reference.sha1.as_deref()),
                        &dest,
                    )
                    .await?;
                debug!("Asset index {} lists {} objects", reference.id, index.objects.len());
                Ok::<_, SyncError>(Arc::new(index))
            })
            .await?;
        Ok(index.clone())
    }

    /// Fetch `url`, check its digest, persist the raw bytes to `dest`, then parse.
    async fn load_document<T: DeserializeOwned>(
        &self,
        url: &str,
        checksum: &Checksum,
        dest: &Path,
    ) -> SyncResult<T> {
        let bytes = self
            .fetcher
            .fetch_bytes(url)
            .await
            .map_err(|e| SyncError::ManifestUnavailable {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !checksum.verify(&bytes) {
            return Err(SyncError::ManifestMalformed {
                url: url.to_string(),
                reason: format!("digest does not match {checksum}"),
            });
        }

        persist(dest, &bytes).await?;

        serde_json::from_slice(&bytes).map_err(|e| SyncError::ManifestMalformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn cell_for<T>(map: &CellMap<T>, key: &str) -> Arc<OnceCell<Arc<T>>> {
    let mut cells = map.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    cells.entry(key.to_string()).or_default().clone()
}

async fn persist(dest: &Path, bytes: &[u8]) -> SyncResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| SyncError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(dest, bytes)
        .await
        .map_err(|source| SyncError::Io {
            path: dest.to_path_buf(),
            source,
        })
}
