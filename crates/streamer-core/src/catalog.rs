//! Catalog records for the two tracked asset kinds.
//!
//! A catalog is stored as a flat, depth-tagged, pre-order list with the
//! synthetic root first. Structural edits go through [`TreeModel`]; the
//! catalog itself only offers lookups and annotation edits by name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tree_model::{ItemId, ROOT_DEPTH, ROOT_ID, TreeError, TreeItem, TreeModel, validate_depths};

/// Name given to the synthetic root of every catalog.
pub const ROOT_NAME: &str = "Root";

/// One record of a catalog: tree bookkeeping plus a kind-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem<P> {
    pub id: ItemId,
    pub depth: i32,
    pub name: String,
    pub payload: P,
}

impl<P: Default> CatalogItem<P> {
    /// The synthetic root record.
    pub fn root() -> Self {
        Self {
            id: ROOT_ID,
            depth: ROOT_DEPTH,
            name: ROOT_NAME.to_string(),
            payload: P::default(),
        }
    }

    /// A top-level asset record with an empty payload.
    pub fn asset(id: ItemId, name: impl Into<String>) -> Self {
        Self {
            id,
            depth: 0,
            name: name.into(),
            payload: P::default(),
        }
    }
}

impl<P> TreeItem for CatalogItem<P> {
    fn id(&self) -> ItemId {
        self.id
    }

    fn set_id(&mut self, id: ItemId) {
        self.id = id;
    }

    fn depth(&self) -> i32 {
        self.depth
    }

    fn set_depth(&mut self, depth: i32) {
        self.depth = depth;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Payload of a texture-kind item.
///
/// `use_placeholder` is the user annotation; everything else is recomputed
/// by synchronization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextureInfo {
    pub runtime_memory_bytes: u64,
    pub width: u32,
    pub height: u32,
    /// Indices of the containers referencing this texture. `-1` means the
    /// texture was found inside an already built bundle.
    pub ref_scenes: BTreeSet<i32>,
    pub use_placeholder: bool,
    pub placeholder_path: Option<String>,
    pub built_artifact_size_bytes: u64,
}

/// Payload of a scene-kind item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneInfo {
    pub built_artifact_size_bytes: u64,
}

pub type TextureItem = CatalogItem<TextureInfo>;
pub type SceneItem = CatalogItem<SceneInfo>;

/// A validated flat catalog. The first record is always the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Catalog<P> {
    items: Vec<CatalogItem<P>>,
}

pub type TextureCatalog = Catalog<TextureInfo>;
pub type SceneCatalog = Catalog<SceneInfo>;

impl<P: Default> Catalog<P> {
    /// A catalog holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            items: vec![CatalogItem::root()],
        }
    }

    /// Build a flat catalog from a root and a list of asset records,
    /// assigning dense ids `1..=N` in order.
    pub fn from_assets(root: CatalogItem<P>, assets: impl IntoIterator<Item = CatalogItem<P>>) -> Self {
        let mut items = vec![CatalogItem {
            id: ROOT_ID,
            depth: ROOT_DEPTH,
            ..root
        }];
        for (offset, mut asset) in assets.into_iter().enumerate() {
            asset.id = offset as ItemId + 1;
            asset.depth = 0;
            items.push(asset);
        }
        Self { items }
    }
}

impl<P: Default> Default for Catalog<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Catalog<P> {
    /// Wrap a persisted list, checking the depth invariants.
    pub fn from_items(items: Vec<CatalogItem<P>>) -> Result<Self, TreeError> {
        validate_depths(&items)?;
        Ok(Self { items })
    }

    /// Rebuild a catalog from a model, e.g. after a move.
    pub fn from_model(model: TreeModel<CatalogItem<P>>) -> Self {
        Self {
            items: model.into_list(),
        }
    }

    pub fn into_model(self) -> Result<TreeModel<CatalogItem<P>>, TreeError> {
        TreeModel::new(self.items)
    }

    pub fn root(&self) -> &CatalogItem<P> {
        &self.items[0]
    }

    /// All records, root first.
    pub fn items(&self) -> &[CatalogItem<P>] {
        &self.items
    }

    /// Every record except the root.
    pub fn assets(&self) -> &[CatalogItem<P>] {
        &self.items[1..]
    }

    /// Number of records excluding the root.
    pub fn len(&self) -> usize {
        self.items.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<&CatalogItem<P>> {
        self.assets().iter().find(|item| item.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut CatalogItem<P>> {
        self.items[1..].iter_mut().find(|item| item.name == name)
    }

    /// Apply `f` to every non-root payload.
    pub fn map_payloads(mut self, mut f: impl FnMut(&str, &mut P)) -> Self {
        for item in &mut self.items[1..] {
            f(&item.name, &mut item.payload);
        }
        self
    }
}

impl TextureCatalog {
    /// Set or clear the placeholder annotation. Returns `false` if no item
    /// has that name.
    pub fn set_use_placeholder(&mut self, name: &str, enabled: bool) -> bool {
        match self.get_mut(name) {
            Some(item) => {
                item.payload.use_placeholder = enabled;
                true
            }
            None => false,
        }
    }

    /// Names of the items marked for placeholder substitution, in catalog order.
    pub fn placeholder_names(&self) -> impl Iterator<Item = &str> {
        self.assets()
            .iter()
            .filter(|item| item.payload.use_placeholder)
            .map(|item| item.name.as_str())
    }

    pub fn status(&self) -> TextureStatus {
        let mut status = TextureStatus {
            total: self.len(),
            ..Default::default()
        };
        for item in self.assets().iter().filter(|item| item.payload.use_placeholder) {
            status.placeholders += 1;
            status.placeholder_bundle_bytes += item.payload.built_artifact_size_bytes;
        }
        status
    }
}

impl SceneCatalog {
    pub fn status(&self) -> SceneStatus {
        SceneStatus {
            scenes: self.len(),
            bundle_bytes: self
                .assets()
                .iter()
                .map(|item| item.payload.built_artifact_size_bytes)
                .sum(),
        }
    }
}

/// Summary line for the texture catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureStatus {
    pub placeholders: usize,
    pub total: usize,
    pub placeholder_bundle_bytes: u64,
}

impl fmt::Display for TextureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} textures use placeholders, bundles: {}",
            self.placeholders,
            self.total,
            format_bytes(self.placeholder_bundle_bytes)
        )
    }
}

/// Summary line for the scene catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SceneStatus {
    pub scenes: usize,
    pub bundle_bytes: u64,
}

impl fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scenes, bundles: {}",
            self.scenes,
            format_bytes(self.bundle_bytes)
        )
    }
}

/// Human readable byte count (`512 B`, `1.5 KB`, `3.2 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(name: &str, use_placeholder: bool, size: u64) -> TextureItem {
        let mut item = TextureItem::asset(0, name);
        item.payload.use_placeholder = use_placeholder;
        item.payload.built_artifact_size_bytes = size;
        item
    }

    #[test]
    fn test_new_catalog_is_root_only() {
        let catalog = TextureCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.root().id, ROOT_ID);
        assert_eq!(catalog.root().depth, ROOT_DEPTH);
        assert_eq!(catalog.root().name, ROOT_NAME);
    }

    #[test]
    fn test_from_assets_assigns_dense_ids() {
        let catalog = TextureCatalog::from_assets(
            CatalogItem::root(),
            vec![texture("a.png", false, 0), texture("b.png", false, 0)],
        );
        let ids: Vec<_> = catalog.items().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(catalog.assets().iter().all(|item| item.depth == 0));
    }

    #[test]
    fn test_from_items_rejects_bad_hierarchy() {
        let items = vec![TextureItem::asset(0, "not a root")];
        assert!(TextureCatalog::from_items(items).is_err());
    }

    #[test]
    fn test_set_use_placeholder_by_name() {
        let mut catalog =
            TextureCatalog::from_assets(CatalogItem::root(), vec![texture("a.png", false, 0)]);

        assert!(catalog.set_use_placeholder("a.png", true));
        assert!(catalog.get("a.png").unwrap().payload.use_placeholder);
        assert!(!catalog.set_use_placeholder("missing.png", true));
        assert_eq!(catalog.placeholder_names().collect::<Vec<_>>(), vec!["a.png"]);
    }

    #[test]
    fn test_texture_status() {
        let catalog = TextureCatalog::from_assets(
            CatalogItem::root(),
            vec![
                texture("a.png", true, 2048),
                texture("b.png", false, 4096),
                texture("c.png", true, 1024),
            ],
        );
        let status = catalog.status();
        assert_eq!(status.placeholders, 2);
        assert_eq!(status.total, 3);
        assert_eq!(status.placeholder_bundle_bytes, 3072);
        assert_eq!(status.to_string(), "2/3 textures use placeholders, bundles: 3.0 KB");
    }

    #[test]
    fn test_scene_status() {
        let mut scene = SceneItem::asset(0, "Scenes/Main.unity");
        scene.payload.built_artifact_size_bytes = 100;
        let catalog = SceneCatalog::from_assets(CatalogItem::root(), vec![scene]);
        assert_eq!(catalog.status().to_string(), "1 scenes, bundles: 100 B");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_model_round_trip() {
        let catalog = TextureCatalog::from_assets(
            CatalogItem::root(),
            vec![texture("a.png", true, 1), texture("b.png", false, 2)],
        );
        let model = catalog.clone().into_model().unwrap();
        assert_eq!(model.len(), 3);
        assert_eq!(TextureCatalog::from_model(model), catalog);
    }

    #[test]
    fn test_json_shape_is_flat_list() {
        let catalog =
            TextureCatalog::from_assets(CatalogItem::root(), vec![texture("a.png", true, 0)]);
        let json = serde_json::to_value(&catalog).unwrap();
        assert!(json.is_array());
        assert_eq!(json[1]["name"], "a.png");
        assert_eq!(json[1]["payload"]["usePlaceholder"], true);
    }
}
