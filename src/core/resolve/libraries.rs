// ─── Library Resolution ───
// Turns the manifest's library list into artifacts for one platform.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::downloader::{ExtractionDirective, ManagedRemoteFile};
use crate::core::platform::PlatformDescriptor;
use crate::core::version::{Library, LibraryArtifact, VersionManifest};

pub struct LibraryResolver {
    install_root: PathBuf,
}

impl LibraryResolver {
    pub fn new(install_root: impl Into<PathBuf>) -> Self {
        Self {
            install_root: install_root.into(),
        }
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.install_root.join("libraries")
    }

    pub fn natives_dir(&self) -> PathBuf {
        self.install_root.join("bin").join("natives")
    }

    /// Every library artifact `platform` needs. Performs no I/O.
    pub fn resolve(
        &self,
        manifest: &VersionManifest,
        platform: &PlatformDescriptor,
    ) -> Vec<ManagedRemoteFile> {
        let mut files = Vec::new();

        for lib in &manifest.libraries {
            if !lib.is_applicable(platform) {
                debug!("Skipping library (OS rules): {}", lib.name);
                continue;
            }

            if let Some(artifact) = lib.primary_artifact() {
                if let Some(file) = self.library_file(lib, artifact, None) {
                    files.push(file);
                }
            }

            if lib.declares_natives() {
                if let Some(file) = self.native_file(lib, platform) {
                    files.push(file);
                }
            }
        }

        debug!(
            "Resolved {} library artifacts for {} on {}",
            files.len(),
            manifest.id,
            platform
        );
        files
    }

    fn native_file(&self, lib: &Library, platform: &PlatformDescriptor) -> Option<ManagedRemoteFile> {
        // No natives for this OS family is normal; only a dangling classifier is suspicious.
        let classifier = lib.native_classifier(platform)?;
        let Some(artifact) = lib.classifier_artifact(&classifier) else {
            warn!(
                "Library {} declares natives {} but has no such classifier, skipping",
                lib.name, classifier
            );
            return None;
        };

        let directive = ExtractionDirective::new(self.natives_dir(), lib.exclusions());
        self.library_file(lib, artifact, Some(&classifier))
            .map(|file| file.with_extraction(directive))
    }

    fn library_file(
        &self,
        lib: &Library,
        artifact: &LibraryArtifact,
        classifier: Option<&str>,
    ) -> Option<ManagedRemoteFile> {
        let Some(relative) = lib.relative_path(artifact, classifier) else {
            warn!("Library {} has no usable path, skipping", lib.name);
            return None;
        };
        let download = artifact.download();
        Some(
            ManagedRemoteFile::new(
                join_relative(&self.libraries_dir(), &relative),
                &download.url,
                download.checksum(),
            )
            .with_size(download.size),
        )
    }
}

fn join_relative(base: &Path, relative: &Path) -> PathBuf {
    let mut path = base.to_path_buf();
    path.extend(relative.components().filter(|c| {
        matches!(c, std::path::Component::Normal(_))
    }));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::Checksum;
    use crate::core::platform::OsFamily;

    const D1: &str = "1111111111111111111111111111111111111111";
    const D2: &str = "2222222222222222222222222222222222222222";

    fn manifest(libraries: serde_json::Value) -> VersionManifest {
        serde_json::from_value(serde_json::json!({
            "id": "1.20.1",
            "libraries": libraries
        }))
        .unwrap()
    }

    fn windows_only_library() -> serde_json::Value {
        serde_json::json!([{
            "name": "org.example:lib:1.0",
            "downloads": {
                "artifact": {
                    "path": "org/example/lib/1.0/lib-1.0.jar",
                    "sha1": D1,
                    "size": 10,
                    "url": "https://libraries.test/lib-1.0.jar"
                },
                "classifiers": {
                    "natives-windows": {
                        "path": "org/example/lib/1.0/lib-1.0-natives-windows.jar",
                        "sha1": D2,
                        "size": 20,
                        "url": "https://libraries.test/lib-1.0-natives-windows.jar"
                    }
                }
            },
            "natives": { "windows": "natives-windows" },
            "extract": { "exclude": ["META-INF/"] },
            "rules": [ { "action": "allow", "os": { "name": "windows" } } ]
        }])
    }

    #[test]
    fn windows_gets_artifact_and_natives() {
        let root = PathBuf::from("/mc");
        let resolver = LibraryResolver::new(&root);
        let windows = PlatformDescriptor::new(OsFamily::Windows, "10.0", "x86_64");

        let files = resolver.resolve(&manifest(windows_only_library()), &windows);
        assert_eq!(files.len(), 2);

        let primary = files.iter().find(|f| f.extraction.is_none()).unwrap();
        assert_eq!(primary.checksum, Checksum::Sha1(D1.into()));
        assert_eq!(
            primary.local_path,
            root.join("libraries/org/example/lib/1.0/lib-1.0.jar")
        );
        assert_eq!(primary.size, Some(10));

        let native = files.iter().find(|f| f.extraction.is_some()).unwrap();
        assert_eq!(native.checksum, Checksum::Sha1(D2.into()));
        let directive = native.extraction.as_ref().unwrap();
        assert_eq!(directive.target_dir, root.join("bin/natives"));
        assert_eq!(directive.exclude, vec!["META-INF/".to_string()]);
    }

    #[test]
    fn linux_gets_nothing_for_windows_only_library() {
        let resolver = LibraryResolver::new("/mc");
        let linux = PlatformDescriptor::new(OsFamily::Linux, "6.1", "x86_64");
        assert!(resolver
            .resolve(&manifest(windows_only_library()), &linux)
            .is_empty());
    }

    #[test]
    fn missing_classifier_is_skipped() {
        let resolver = LibraryResolver::new("/mc");
        let linux = PlatformDescriptor::new(OsFamily::Linux, "", "x86_64");
        let libraries = serde_json::json!([{
            "name": "org.example:natives-only:1.0",
            "downloads": { "classifiers": {} },
            "natives": { "linux": "natives-linux" }
        }]);
        assert!(resolver.resolve(&manifest(libraries), &linux).is_empty());
    }

    #[test]
    fn unruled_library_without_path_uses_coordinate() {
        let resolver = LibraryResolver::new("/mc");
        let mac = PlatformDescriptor::new(OsFamily::MacOs, "14.2", "aarch64");
        let libraries = serde_json::json!([{
            "name": "net.fabricmc:intermediary:1.20.1",
            "downloads": {
                "artifact": { "url": "https://maven.test/intermediary-1.20.1.jar" }
            }
        }]);

        let files = resolver.resolve(&manifest(libraries), &mac);
        assert_eq!(files.len(), 1);
        assert_eq!(
            files[0].local_path,
            PathBuf::from("/mc/libraries/net/fabricmc/intermediary/1.20.1/intermediary-1.20.1.jar")
        );
        assert_eq!(files[0].checksum, Checksum::None);
    }

    #[test]
    fn traversal_in_manifest_path_is_contained() {
        let resolver = LibraryResolver::new("/mc");
        let linux = PlatformDescriptor::new(OsFamily::Linux, "", "x86_64");
        let libraries = serde_json::json!([{
            "name": "evil:lib:1.0",
            "downloads": {
                "artifact": { "path": "../../etc/lib.jar", "url": "https://x/lib.jar" }
            }
        }]);

        let files = resolver.resolve(&manifest(libraries), &linux);
        assert_eq!(files[0].local_path, PathBuf::from("/mc/libraries/etc/lib.jar"));
    }
}
