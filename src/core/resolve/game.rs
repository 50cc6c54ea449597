// ─── Game Jar Resolution ───
// The version's own jar, optional obfuscation mappings and the client
// logging configuration.

use std::path::PathBuf;

use tracing::warn;

use crate::core::config::Side;
use crate::core::downloader::ManagedRemoteFile;
use crate::core::version::{DistributionRole, Download, VersionManifest};

pub struct GameJarResolver {
    install_root: PathBuf,
    side: Side,
    include_mappings: bool,
    include_logging_config: bool,
}

impl GameJarResolver {
    pub fn new(install_root: impl Into<PathBuf>, side: Side) -> Self {
        Self {
            install_root: install_root.into(),
            side,
            include_mappings: false,
            include_logging_config: true,
        }
    }

    pub fn with_mappings(mut self, include: bool) -> Self {
        self.include_mappings = include;
        self
    }

    pub fn with_logging_config(mut self, include: bool) -> Self {
        self.include_logging_config = include;
        self
    }

    pub fn jar_path(&self) -> PathBuf {
        self.install_root.join("bin").join("minecraft.jar")
    }

    pub fn mappings_path(&self) -> PathBuf {
        self.install_root.join("bin").join("minecraft-mappings.jar")
    }

    pub fn resolve(&self, manifest: &VersionManifest) -> Vec<ManagedRemoteFile> {
        let (jar_role, mappings_role) = match self.side {
            Side::Client => (DistributionRole::Client, DistributionRole::ClientMappings),
            Side::Server => (DistributionRole::Server, DistributionRole::ServerMappings),
        };

        let mut files = Vec::new();

        match manifest.downloads.get(jar_role) {
            Some(download) => files.push(remote_file(self.jar_path(), download)),
            None => warn!("Version {} publishes no {:?} jar", manifest.id, jar_role),
        }

        if self.include_mappings {
            match manifest.downloads.get(mappings_role) {
                Some(download) => files.push(remote_file(self.mappings_path(), download)),
                None => warn!("Version {} publishes no {:?}", manifest.id, mappings_role),
            }
        }

        // The logging config only applies to the client.
        if self.include_logging_config && self.side == Side::Client {
            if let Some(config) = manifest.logging.as_ref().and_then(|l| l.client.as_ref()) {
                let path = self
                    .install_root
                    .join("assets")
                    .join("log_configs")
                    .join(&config.file.id);
                files.push(remote_file(path, &config.file.download()));
            }
        }

        files
    }
}

fn remote_file(path: PathBuf, download: &Download) -> ManagedRemoteFile {
    ManagedRemoteFile::new(path, &download.url, download.checksum()).with_size(download.size)
}
