// ─── Version Manifest ───
// The per-version document: downloads, libraries, asset index reference.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::downloader::Checksum;
use crate::core::maven::MavenArtifact;
use crate::core::platform::{evaluate, PlatformDescriptor, PlatformRule};

/// A fully parsed per-version manifest. Immutable once parsed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionManifest {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub downloads: VersionDownloads,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub java_version: Option<JavaVersion>,
    #[serde(default)]
    pub logging: Option<LoggingConfigs>,
    #[serde(default)]
    pub release_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub compliance_level: Option<u32>,
}

impl VersionManifest {
    /// Required runtime major version. Manifests predating the field ran on Java 8.
    pub fn required_java_major(&self) -> u32 {
        self.java_version
            .as_ref()
            .map(|j| j.major_version)
            .unwrap_or(8)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersion {
    #[serde(default)]
    pub component: Option<String>,
    pub major_version: u32,
}

/// Remote file descriptor. `size` is informational.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Download {
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl Download {
    pub fn checksum(&self) -> Checksum {
        Checksum::sha1_or_none(self.sha1.as_deref())
    }
}

/// Distribution roles a version publishes jars for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistributionRole {
    Client,
    Server,
    ClientMappings,
    ServerMappings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionDownloads {
    #[serde(default)]
    pub client: Option<Download>,
    #[serde(default)]
    pub server: Option<Download>,
    #[serde(default)]
    pub client_mappings: Option<Download>,
    #[serde(default)]
    pub server_mappings: Option<Download>,
}

impl VersionDownloads {
    pub fn get(&self, role: DistributionRole) -> Option<&Download> {
        match role {
            DistributionRole::Client => self.client.as_ref(),
            DistributionRole::Server => self.server.as_ref(),
            DistributionRole::ClientMappings => self.client_mappings.as_ref(),
            DistributionRole::ServerMappings => self.server_mappings.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfigs {
    #[serde(default)]
    pub client: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub argument: Option<String>,
    pub file: LoggingFile,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingFile {
    pub id: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    pub url: String,
}

impl LoggingFile {
    pub fn download(&self) -> Download {
        Download {
            url: self.url.clone(),
            sha1: self.sha1.clone(),
            size: self.size,
        }
    }
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Platform key (`windows`, `osx`, `macos`, `linux`) → classifier name.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
    #[serde(default)]
    pub rules: Vec<PlatformRule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: HashMap<String, LibraryArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryArtifact {
    /// Path relative to the libraries directory. Some third-party manifests
    /// omit it; it is then derived from the library coordinate.
    #[serde(default)]
    pub path: Option<String>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl LibraryArtifact {
    pub fn download(&self) -> Download {
        Download {
            url: self.url.clone(),
            sha1: self.sha1.clone(),
            size: self.size,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Library {
    /// Evaluate whether this library applies to `platform`.
    pub fn is_applicable(&self, platform: &PlatformDescriptor) -> bool {
        evaluate(&self.rules, platform)
    }

    /// Whether the library declares native bundling at all.
    pub fn declares_natives(&self) -> bool {
        self.natives.as_ref().is_some_and(|n| !n.is_empty())
    }

    /// Classifier name for `platform`, with `${arch}` expanded.
    ///
    /// macOS accepts both `macos` and `osx` keys, preferring `macos`.
    pub fn native_classifier(&self, platform: &PlatformDescriptor) -> Option<String> {
        let natives = self.natives.as_ref()?;
        platform
            .os
            .native_keys()
            .iter()
            .find_map(|key| natives.get(*key))
            .map(|classifier| classifier.replace("${arch}", platform.arch_bits()))
    }

    pub fn primary_artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    pub fn classifier_artifact(&self, classifier: &str) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.classifiers.get(classifier)
    }

    pub fn exclusions(&self) -> Vec<String> {
        self.extract
            .as_ref()
            .map(|e| e.exclude.clone())
            .unwrap_or_default()
    }

    /// Relative install path for `artifact`, falling back to the Maven layout
    /// of this library's coordinate.
    pub fn relative_path(
        &self,
        artifact: &LibraryArtifact,
        classifier: Option<&str>,
    ) -> Option<PathBuf> {
        if let Some(path) = artifact.path.as_deref().filter(|p| !p.is_empty()) {
            return Some(path.split('/').collect());
        }
        let coordinate = MavenArtifact::parse(&self.name).ok()?;
        let coordinate = match classifier {
            Some(c) => coordinate.with_classifier(c),
            None => coordinate,
        };
        Some(coordinate.local_path())
    }
}
