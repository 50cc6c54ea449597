use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::error::{SyncError, SyncResult};
use crate::core::http::build_http_client;

/// Transfer primitive used by manifests and managed files.
///
/// Timeouts and connection policy belong to the implementation; callers
/// only see success or a `SyncError`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a (small) document fully into memory.
    async fn fetch_bytes(&self, url: &str) -> SyncResult<Vec<u8>>;

    /// Stream `url` to `dest`, replacing whatever is there. Returns bytes written.
    async fn download_to(&self, url: &str, dest: &Path) -> SyncResult<u64>;
}

/// `reqwest`-backed fetcher.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> SyncResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str) -> SyncResult<reqwest::Response> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str) -> SyncResult<Vec<u8>> {
        let bytes = self.get(url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Writes to `<dest>.part` and renames once the body is complete, so an
    /// interrupted transfer never leaves a truncated file at `dest`. The part
    /// file is removed on every failure.
    async fn download_to(&self, url: &str, dest: &Path) -> SyncResult<u64> {
        let response = self.get(url).await?;
        let part = part_path(dest);

        let result = match write_part(response, &part).await {
            Ok(written) => tokio::fs::rename(&part, dest)
                .await
                .map(|_| written)
                .map_err(|source| SyncError::Io {
                    path: dest.to_path_buf(),
                    source,
                }),
            Err(e) => Err(e),
        };

        match result {
            Ok(written) => {
                debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&part).await {
                    if cleanup.kind() != std::io::ErrorKind::NotFound {
                        warn!("Could not remove partial download {:?}: {}", part, cleanup);
                    }
                }
                Err(e)
            }
        }
    }
}

/// Stream the response body into `part`. The handle is closed on return,
/// before any rename.
async fn write_part(response: reqwest::Response, part: &Path) -> SyncResult<u64> {
    let io_err = |source: std::io::Error| SyncError::Io {
        path: part.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(part).await.map_err(io_err)?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(io_err)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_err)?;
    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
