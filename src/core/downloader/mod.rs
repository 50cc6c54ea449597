pub mod checksum;
pub mod client;
pub mod extract;
pub mod remote_file;

#[cfg(test)]
pub(crate) mod testing;

pub use checksum::Checksum;
pub use client::{Fetcher, HttpFetcher};
pub use extract::ExtractionDirective;
pub use remote_file::{ManagedRemoteFile, SyncOutcome, SyncPolicy};
