pub mod manifest;
pub mod repository;
pub mod version_file;

pub use manifest::{LatestVersions, VersionEntry, VersionIndex, VERSION_INDEX_URL};
pub use repository::ManifestRepository;
pub use version_file::{
    AssetIndexRef, DistributionRole, Download, JavaVersion, Library, LibraryArtifact,
    LibraryDownloads, LoggingConfig, VersionDownloads, VersionManifest,
};
