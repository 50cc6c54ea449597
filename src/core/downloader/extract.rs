// ─── Native Archive Extraction ───
// Unpacks native-classifier jars into the shared natives directory.

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::core::error::{SyncError, SyncResult};

/// Entries under this prefix carry jar metadata and are never unpacked.
const RESERVED_METADATA_PREFIX: &str = "META-INF/";

/// Where and how a downloaded archive is unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionDirective {
    pub target_dir: PathBuf,
    /// Relative entry patterns to skip. A trailing `/` excludes a whole
    /// directory; otherwise the pattern is a glob over the entry name.
    pub exclude: Vec<String>,
}

impl ExtractionDirective {
    pub fn new(target_dir: PathBuf, exclude: Vec<String>) -> Self {
        Self {
            target_dir,
            exclude,
        }
    }

    /// Whether the archive entry `name` should be skipped.
    pub fn skips(&self, name: &str) -> bool {
        name.starts_with(RESERVED_METADATA_PREFIX)
            || self
                .exclude
                .iter()
                .any(|pattern| matches_pattern(name, pattern))
    }
}

fn matches_pattern(name: &str, pattern: &str) -> bool {
    if pattern.ends_with('/') {
        return name.starts_with(pattern);
    }
    if name == pattern {
        return true;
    }
    match glob::Pattern::new(pattern) {
        Ok(glob) => glob.matches(name),
        Err(e) => {
            debug!("Ignoring invalid exclusion pattern {:?}: {}", pattern, e);
            false
        }
    }
}

fn open_archive(archive: &Path) -> SyncResult<ZipArchive<File>> {
    let file = File::open(archive).map_err(|source| SyncError::Io {
        path: archive.to_path_buf(),
        source,
    })?;
    Ok(ZipArchive::new(file)?)
}

/// Unpack `archive` according to `directive`. Blocking; returns the number
/// of files written.
pub fn extract_archive(archive: &Path, directive: &ExtractionDirective) -> SyncResult<usize> {
    let mut zip = open_archive(archive)?;
    let mut written = 0;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let name = entry.name().to_string();
        if directive.skips(&name) {
            continue;
        }

        let Some(relative) = entry.enclosed_name() else {
            warn!("Skipping archive entry with unsafe path {:?} in {:?}", name, archive);
            continue;
        };
        let out = directive.target_dir.join(relative);

        if entry.is_dir() {
            create_dir(&out)?;
            continue;
        }

        if let Some(parent) = out.parent() {
            create_dir(parent)?;
        }
        let mut file = File::create(&out).map_err(|source| SyncError::Io {
            path: out.clone(),
            source,
        })?;
        std::io::copy(&mut entry, &mut file).map_err(|source| SyncError::Io {
            path: out.clone(),
            source,
        })?;
        written += 1;
    }

    debug!(
        "Extracted {} entries from {:?} into {:?}",
        written, archive, directive.target_dir
    );
    Ok(written)
}

/// Count the unpackable file entries of `archive` that are absent from the
/// target directory or differ in size.
pub fn missing_entries(archive: &Path, directive: &ExtractionDirective) -> SyncResult<usize> {
    let mut zip = open_archive(archive)?;
    let mut missing = 0;

    for i in 0..zip.len() {
        let entry = zip.by_index(i)?;
        if entry.is_dir() || directive.skips(entry.name()) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let present = std::fs::metadata(directive.target_dir.join(relative))
            .map(|meta| meta.is_file() && meta.len() == entry.size())
            .unwrap_or(false);
        if !present {
            missing += 1;
        }
    }

    Ok(missing)
}

fn create_dir(path: &Path) -> SyncResult<()> {
    std::fs::create_dir_all(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn write_test_archive(path: &Path, entries: &[(&str, &[u8])]) {
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, body) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(name.trim_end_matches('/'), SimpleFileOptions::default())
                .unwrap();
        } else {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(body).unwrap();
        }
    }
    writer.finish().unwrap();
}
