//! Catalog persistence.
//!
//! Catalogs are stored as a flat list of records, either as pretty JSON or
//! as bincode (chosen by a `.bin` extension). Loaded lists are validated
//! before use, and a catalog file that does not exist yet loads as a
//! root-only catalog.

use crate::catalog::{Catalog, CatalogItem};
use crate::fs::{FileSystem, FsError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};
use tree_model::TreeError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Binary codec error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("Invalid catalog: {0}")]
    Hierarchy(#[from] TreeError),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Binary,
}

impl CatalogFormat {
    pub fn for_path(path: &str) -> Self {
        if path.ends_with(".bin") {
            CatalogFormat::Binary
        } else {
            CatalogFormat::Json
        }
    }
}

/// Loads and saves one catalog file.
pub struct CatalogStore<'a, F: FileSystem + ?Sized> {
    fs: &'a F,
    path: String,
    format: CatalogFormat,
}

impl<'a, F: FileSystem + ?Sized> CatalogStore<'a, F> {
    pub fn new(fs: &'a F, path: impl Into<String>) -> Self {
        let path = path.into();
        let format = CatalogFormat::for_path(&path);
        Self { fs, path, format }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn load<P>(&self) -> Result<Catalog<P>>
    where
        P: DeserializeOwned + Default,
    {
        if !self.fs.exists(&self.path)? {
            debug!("No catalog at {}, starting with a root-only catalog", self.path);
            return Ok(Catalog::new());
        }

        let bytes = self.fs.read(&self.path)?;
        let items: Vec<CatalogItem<P>> = match self.format {
            CatalogFormat::Json => serde_json::from_slice(&bytes)?,
            CatalogFormat::Binary => bincode::deserialize(&bytes)?,
        };
        let catalog = Catalog::from_items(items)?;
        debug!("Loaded {} records from {}", catalog.len(), self.path);
        Ok(catalog)
    }

    pub fn save<P: Serialize>(&self, catalog: &Catalog<P>) -> Result<()> {
        let bytes = match self.format {
            CatalogFormat::Json => serde_json::to_vec_pretty(catalog)?,
            CatalogFormat::Binary => bincode::serialize(catalog)?,
        };
        self.fs.write(&self.path, &bytes)?;
        info!("Saved {} records to {}", catalog.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SceneCatalog, TextureCatalog, TextureItem};
    use crate::fs::InMemoryFs;

    fn sample() -> TextureCatalog {
        let mut a = TextureItem::asset(0, "Textures/a.png");
        a.payload.use_placeholder = true;
        a.payload.ref_scenes.extend([-1, 0, 3]);
        a.payload.placeholder_path = Some("Placeholders/Textures/a-0.png".to_string());
        let mut b = TextureItem::asset(0, "Textures/b.png");
        b.payload.width = 256;
        TextureCatalog::from_assets(CatalogItem::root(), vec![a, b])
    }

    #[test]
    fn test_missing_file_loads_root_only() {
        let fs = InMemoryFs::new();
        let store = CatalogStore::new(&fs, "data/textures.json");
        let catalog: TextureCatalog = store.load().unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.root().name, "Root");
    }

    #[test]
    fn test_json_round_trip() {
        let fs = InMemoryFs::new();
        let store = CatalogStore::new(&fs, "data/textures.json");
        store.save(&sample()).unwrap();

        let text = String::from_utf8(fs.read("data/textures.json").unwrap()).unwrap();
        assert!(text.contains("\"usePlaceholder\": true"));

        let loaded: TextureCatalog = store.load().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_binary_round_trip() {
        let fs = InMemoryFs::new();
        let store = CatalogStore::new(&fs, "data/textures.bin");
        store.save(&sample()).unwrap();

        let loaded: TextureCatalog = store.load().unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_load_rejects_malformed_hierarchy() {
        let fs = InMemoryFs::new();
        fs.write(
            "scenes.json",
            br#"[
                {"id": 0, "depth": -1, "name": "Root", "payload": {"builtArtifactSizeBytes": 0}},
                {"id": 1, "depth": 2, "name": "a.unity", "payload": {"builtArtifactSizeBytes": 0}}
            ]"#,
        )
        .unwrap();

        let store = CatalogStore::new(&fs, "scenes.json");
        let result: Result<SceneCatalog> = store.load();
        assert!(matches!(
            result,
            Err(StoreError::Hierarchy(TreeError::MalformedHierarchy { index: 1, .. }))
        ));
    }

    #[test]
    fn test_load_rejects_root_with_other_id() {
        let fs = InMemoryFs::new();
        fs.write(
            "scenes.json",
            br#"[
                {"id": 5, "depth": -1, "name": "Root", "payload": {"builtArtifactSizeBytes": 0}},
                {"id": 1, "depth": 0, "name": "a.unity", "payload": {"builtArtifactSizeBytes": 0}}
            ]"#,
        )
        .unwrap();

        let store = CatalogStore::new(&fs, "scenes.json");
        let result: Result<SceneCatalog> = store.load();
        assert!(matches!(
            result,
            Err(StoreError::Hierarchy(TreeError::MalformedHierarchy {
                index: 0,
                violation: tree_model::HierarchyViolation::RootId { id: 5 },
            }))
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let fs = InMemoryFs::new();
        fs.write("t.json", b"not json").unwrap();
        let store = CatalogStore::new(&fs, "t.json");
        let result: Result<TextureCatalog> = store.load();
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
