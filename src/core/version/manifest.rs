// ─── Version Index ───
// The top-level document listing every published version.

use chrono::{DateTime, Utc};
use serde::Deserialize;

pub const VERSION_INDEX_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level version index (`version_manifest_v2.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct VersionIndex {
    #[serde(default)]
    pub latest: Option<LatestVersions>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the index.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    pub url: String,
    #[serde(default)]
    pub release_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub compliance_level: Option<u32>,
}

impl VersionIndex {
    /// Find a specific version entry by ID (e.g. "1.20.4").
    pub fn find(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// All release versions, in index order (newest first upstream).
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }

    pub fn latest_release(&self) -> Option<&VersionEntry> {
        self.latest.as_ref().and_then(|l| self.find(&l.release))
    }

    pub fn latest_snapshot(&self) -> Option<&VersionEntry> {
        self.latest.as_ref().and_then(|l| self.find(&l.snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VersionIndex {
        serde_json::from_value(serde_json::json!({
            "latest": { "release": "1.20.4", "snapshot": "24w03a" },
            "versions": [
                {
                    "id": "24w03a",
                    "type": "snapshot",
                    "url": "https://example.com/24w03a.json",
                    "time": "2024-01-17T13:27:41+00:00",
                    "releaseTime": "2024-01-17T13:20:35+00:00",
                    "sha1": "def456",
                    "complianceLevel": 1
                },
                {
                    "id": "1.20.4",
                    "type": "release",
                    "url": "https://example.com/1.20.4.json",
                    "releaseTime": "2023-12-07T12:56:20+00:00",
                    "sha1": "abc123",
                    "complianceLevel": 1
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn deserialize_index_entry() {
        let index = sample();
        let entry = index.find("1.20.4").unwrap();
        assert_eq!(entry.version_type, "release");
        assert_eq!(entry.sha1.as_deref(), Some("abc123"));
        assert_eq!(entry.compliance_level, Some(1));
        assert_eq!(
            entry.release_time.unwrap().to_rfc3339(),
            "2023-12-07T12:56:20+00:00"
        );
    }

    #[test]
    fn releases_and_latest() {
        let index = sample();
        let releases: Vec<_> = index.releases().iter().map(|v| v.id.as_str()).collect();
        assert_eq!(releases, vec!["1.20.4"]);
        assert_eq!(index.latest_release().unwrap().id, "1.20.4");
        assert_eq!(index.latest_snapshot().unwrap().id, "24w03a");
        assert!(index.find("0.0.1").is_none());
    }
}
