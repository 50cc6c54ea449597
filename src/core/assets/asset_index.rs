use std::collections::HashMap;

use serde::Deserialize;

/// Content CDN serving asset objects by `<2-hex>/<digest>`.
pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Fallback location for asset indexes whose manifest omits a URL.
pub const ASSET_INDEX_FALLBACK_URL: &str = "https://launchermeta.mojang.com/v1/packages";

/// Top-level asset index JSON structure.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexManifest {
    pub objects: HashMap<String, AssetObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// Whether the digest is usable as a storage key: at least two
    /// characters, all ASCII hex.
    pub fn has_valid_digest(&self) -> bool {
        self.hash.len() >= 2 && self.hash.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Storage subdirectory: the first two lowercase hex characters of the
    /// digest. `None` unless the whole digest is hex.
    pub fn prefix(&self) -> Option<String> {
        if !self.has_valid_digest() {
            return None;
        }
        Some(self.hash[..2].to_ascii_lowercase())
    }
}
