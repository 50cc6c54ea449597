// ─── Asset Resolution ───
// Content-addressed objects: storage location derives from the digest only.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::assets::{AssetIndexManifest, AssetObject, RESOURCES_URL};
use crate::core::downloader::{Checksum, ManagedRemoteFile};

pub struct AssetResolver {
    install_root: PathBuf,
    resources_url: String,
}

impl AssetResolver {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
            resources_url: RESOURCES_URL.to_string(),
        }
    }

    /// Serve objects from a mirror instead of the official CDN.
    pub fn with_resources_url(mut self, url: impl Into<String>) -> Self {
        self.resources_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.install_root.join("assets").join("objects")
    }

    /// One file per object in `index`. Names sharing a digest yield the same
    /// local path; de-duplication is left to the caller.
    pub fn resolve(&self, index: &AssetIndexManifest) -> Vec<ManagedRemoteFile> {
        let objects_dir = self.objects_dir();
        let files: Vec<_> = index
            .objects
            .iter()
            .filter_map(|(name, object)| {
                let file = self.object_file(&objects_dir, object);
                if file.is_none() {
                    warn!("Asset {} has unusable digest {:?}, skipping", name, object.hash);
                }
                file
            })
            .collect();

        debug!("Resolved {} asset objects", files.len());
        files
    }

    fn object_file(&self, objects_dir: &Path, object: &AssetObject) -> Option<ManagedRemoteFile> {
        let prefix = object.prefix()?;
        let hash = object.hash.to_ascii_lowercase();
        Some(
            ManagedRemoteFile::new(
                objects_dir.join(&prefix).join(&hash),
                format!("{}/{}/{}", self.resources_url, prefix, hash),
                Checksum::Sha1(hash),
            )
            .with_size(Some(object.size)),
        )
    }
}
