// ─── Launcher Sync Core ───
// Manifest-driven resolution and synchronization of a game installation.
//
// Architecture:
//   core/
//     version/    — Version index, per-version manifests, single-flight repository
//     platform/   — Platform descriptor + declarative OS rules
//     maven/      — Coordinate parsing for path fallback
//     assets/     — Asset index data model
//     resolve/    — Libraries, natives, assets and game jars → managed files
//     downloader/ — Checksums, transfer primitive, managed files, extraction
//     sync/       — Bounded parallel orchestration + progress
//     config      — Sync configuration
//     error       — Crate-wide error type

pub mod assets;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod maven;
pub mod platform;
pub mod resolve;
pub mod sync;
pub mod version;
