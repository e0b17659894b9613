//! Stable asset identity and the index of already built bundles.

use crate::fs::{self, FileSystem};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// Maps an asset name to the identifier its built bundle is named after.
pub trait AssetIdentity {
    fn stable_id(&self, asset_name: &str) -> String;
}

/// Identity derived from the asset name alone: the first 16 bytes of its
/// SHA-256, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashedAssetIds;

impl AssetIdentity for HashedAssetIds {
    fn stable_id(&self, asset_name: &str) -> String {
        let digest = Sha256::digest(asset_name.as_bytes());
        hex::encode(&digest[..16])
    }
}

/// Explicit ids (e.g. engine GUIDs) with a hashed fallback for unlisted assets.
#[derive(Debug, Clone, Default)]
pub struct GuidTable {
    guids: HashMap<String, String>,
}

impl GuidTable {
    pub fn new(guids: HashMap<String, String>) -> Self {
        Self { guids }
    }
}

impl AssetIdentity for GuidTable {
    fn stable_id(&self, asset_name: &str) -> String {
        match self.guids.get(asset_name) {
            Some(guid) => guid.clone(),
            None => HashedAssetIds.stable_id(asset_name),
        }
    }
}

/// Lookup of built bundle sizes by stable id.
pub trait BuiltArtifactIndex {
    fn artifact_size(&self, stable_id: &str) -> Option<u64>;
}

impl BuiltArtifactIndex for HashMap<String, u64> {
    fn artifact_size(&self, stable_id: &str) -> Option<u64> {
        self.get(stable_id).copied()
    }
}

/// The bundles present in one output directory, keyed by file stem.
#[derive(Debug, Clone, Default)]
pub struct ArtifactDirectory {
    sizes: HashMap<String, u64>,
}

impl ArtifactDirectory {
    /// List `dir` (non-recursively) for files ending in `extension`.
    /// A missing directory yields an empty index.
    pub fn scan<F: FileSystem + ?Sized>(fs: &F, dir: &str, extension: &str) -> fs::Result<Self> {
        let mut sizes = HashMap::new();
        if fs.exists(dir)? {
            for entry in fs.list(dir)? {
                if entry.is_dir {
                    continue;
                }
                if let Some(stem) = entry.name.strip_suffix(extension) {
                    let stat = fs.stat(&fs::join(dir, &entry.name))?;
                    sizes.insert(stem.to_string(), stat.size);
                }
            }
        }
        debug!("Indexed {} bundles in {}", sizes.len(), dir);
        Ok(Self { sizes })
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl BuiltArtifactIndex for ArtifactDirectory {
    fn artifact_size(&self, stable_id: &str) -> Option<u64> {
        self.sizes.get(stable_id).copied()
    }
}
