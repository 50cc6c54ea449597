// ─── Checksum Verifier ───
// Computes and compares content digests under a closed set of algorithms.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use md5::Md5;
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::core::error::{SyncError, SyncResult};

const READ_CHUNK: usize = 64 * 1024;

/// Expected digest of a managed file.
///
/// `None` is reserved for artifacts whose manifest carries no digest; it
/// accepts any existing file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Checksum {
    None,
    Md5(String),
    Sha1(String),
    Sha256(String),
}

impl Checksum {
    /// Build a SHA-1 checksum from an optional manifest field.
    pub fn sha1_or_none(value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Checksum::Sha1(v.trim().to_ascii_lowercase()),
            _ => Checksum::None,
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Checksum::None => "none",
            Checksum::Md5(_) => "md5",
            Checksum::Sha1(_) => "sha1",
            Checksum::Sha256(_) => "sha256",
        }
    }

    /// The expected hex digest, if any.
    pub fn expected(&self) -> Option<&str> {
        match self {
            Checksum::None => None,
            Checksum::Md5(v) | Checksum::Sha1(v) | Checksum::Sha256(v) => Some(v),
        }
    }

    fn hasher(&self) -> Option<Hasher> {
        match self {
            Checksum::None => None,
            Checksum::Md5(_) => Some(Hasher::Md5(Md5::new())),
            Checksum::Sha1(_) => Some(Hasher::Sha1(Sha1::new())),
            Checksum::Sha256(_) => Some(Hasher::Sha256(Sha256::new())),
        }
    }

    /// Hex digest of `bytes` under this algorithm. `None` for `Checksum::None`.
    pub fn compute(&self, bytes: &[u8]) -> Option<String> {
        let mut hasher = self.hasher()?;
        hasher.update(bytes);
        Some(hasher.finalize_hex())
    }

    /// Whether `bytes` match the expected digest.
    pub fn verify(&self, bytes: &[u8]) -> bool {
        match (self.expected(), self.compute(bytes)) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(&actual),
            _ => true,
        }
    }

    /// Stream `path` through the hasher and return its hex digest. Hashing
    /// runs on the blocking pool so it never stalls the async workers.
    pub async fn digest_file(&self, path: &Path) -> SyncResult<Option<String>> {
        let Some(hasher) = self.hasher() else {
            return Ok(None);
        };

        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || hash_file(hasher, &owned))
            .await
            .map_err(|e| SyncError::Other(format!("hashing task failed: {e}")))?
            .map(Some)
    }

    /// Whether the file at `path` exists and matches the expected digest.
    pub async fn verify_file(&self, path: &Path) -> SyncResult<bool> {
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(SyncError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let Some(expected) = self.expected() else {
            return Ok(true);
        };
        let actual = self.digest_file(path).await?.unwrap_or_default();
        Ok(actual.eq_ignore_ascii_case(expected))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected() {
            Some(v) => write!(f, "{}:{}", self.algorithm(), v),
            None => write!(f, "none"),
        }
    }
}

fn hash_file(mut hasher: Hasher, path: &Path) -> SyncResult<String> {
    let io_err = |source: std::io::Error| SyncError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize_hex())
}

enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
}

impl Hasher {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Hasher::Md5(h) => h.update(bytes),
            Hasher::Sha1(h) => h.update(bytes),
            Hasher::Sha256(h) => h.update(bytes),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Md5(h) => hex::encode(h.finalize()),
            Hasher::Sha1(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const HELLO_MD5: &str = "5d41402abc4b2a76b9719d911017c592";

    #[test]
    fn known_digests() {
        assert_eq!(
            Checksum::Sha1(String::new()).compute(b"hello").as_deref(),
            Some(HELLO_SHA1)
        );
        assert_eq!(
            Checksum::Sha256(String::new()).compute(b"hello").as_deref(),
            Some(HELLO_SHA256)
        );
        assert_eq!(
            Checksum::Md5(String::new()).compute(b"hello").as_deref(),
            Some(HELLO_MD5)
        );
    }

    #[test]
    fn verify_ignores_hex_case() {
        let sum = Checksum::Sha1(HELLO_SHA1.to_uppercase());
        assert!(sum.verify(b"hello"));
        assert!(!sum.verify(b"hello!"));
    }

    #[test]
    fn none_always_matches() {
        assert!(Checksum::None.verify(b"anything"));
        assert_eq!(Checksum::None.compute(b"x"), None);
    }

    #[test]
    fn sha1_or_none_handles_missing_digest() {
        assert_eq!(Checksum::sha1_or_none(None), Checksum::None);
        assert_eq!(Checksum::sha1_or_none(Some("  ")), Checksum::None);
        assert_eq!(
            Checksum::sha1_or_none(Some("ABC")),
            Checksum::Sha1("abc".into())
        );
    }

    #[tokio::test]
    async fn verify_file_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");

        assert!(!Checksum::None.verify_file(&path).await.unwrap());
        assert!(!Checksum::Sha1(HELLO_SHA1.into())
            .verify_file(&path)
            .await
            .unwrap());

        tokio::fs::write(&path, b"hello").await.unwrap();
        assert!(Checksum::None.verify_file(&path).await.unwrap());
        assert!(Checksum::Sha1(HELLO_SHA1.into())
            .verify_file(&path)
            .await
            .unwrap());
        assert!(!Checksum::Sha256(HELLO_SHA1.into())
            .verify_file(&path)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn file_digest_spans_multiple_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.bin");
        let bytes: Vec<u8> = (0..READ_CHUNK * 3 + 17).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &bytes).await.unwrap();

        for checksum in [
            Checksum::Md5(String::new()),
            Checksum::Sha1(String::new()),
            Checksum::Sha256(String::new()),
        ] {
            assert_eq!(
                checksum.digest_file(&path).await.unwrap(),
                checksum.compute(&bytes)
            );
        }
        assert_eq!(Checksum::None.digest_file(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_file_digest_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Checksum::Sha1(String::new())
            .digest_file(&dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
