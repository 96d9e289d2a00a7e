use std::fmt;

use crate::path::AssetPath;

/// Name of a cache entry on disk.
///
/// Built from the asset's file stem (readable), a CRC-32 of the full
/// normalized path (so `a/kick.wav` and `b/kick.wav` differ) and the peak
/// resolution (so changing it never serves stale frames).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

const STEM_MAX: usize = 48;

impl CacheKey {
    pub fn for_asset(asset: &AssetPath, resolution: u32) -> Self {
        let stem: String = asset
            .file_stem()
            .unwrap_or("asset")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .take(STEM_MAX)
            .collect();
        let digest = crc32fast::hash(asset.as_str().as_bytes());
        Self(format!("{stem}-{digest:08x}-r{resolution}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the entry inside the cache root.
    pub fn file_name(&self) -> String {
        format!("{}.peaks", self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
