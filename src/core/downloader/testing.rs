// In-memory fetcher used by unit tests across the crate.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::client::Fetcher;
use crate::core::error::{SyncError, SyncResult};

#[derive(Default)]
pub struct MemoryFetcher {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    failing: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), body.into());
    }

    pub fn fail(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    async fn lookup(&self, url: &str) -> SyncResult<Vec<u8>> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.lock().unwrap().contains(url) {
            return Err(SyncError::Other(format!("connection refused: {url}")));
        }

        self.documents
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| SyncError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

#[async_trait]
impl Fetcher for MemoryFetcher {
    async fn fetch_bytes(&self, url: &str) -> SyncResult<Vec<u8>> {
        self.lookup(url).await
    }

    async fn download_to(&self, url: &str, dest: &Path) -> SyncResult<u64> {
        let body = self.lookup(url).await?;
        tokio::fs::write(dest, &body).await?;
        Ok(body.len() as u64)
    }
}
