pub mod asset_index;

pub use asset_index::{AssetIndexManifest, AssetObject, ASSET_INDEX_FALLBACK_URL, RESOURCES_URL};
