//! SyncEngine: rebuilds a catalog from the external sources of truth.
//!
//! A sync pass works as follows:
//!
//! 1. Seed a working set with every asset of the current catalog, all untouched
//! 2. Run the dependency visitor, then the built-bundle visitor. Each visit
//!    creates or touches the named asset, refreshes its live stats and adds
//!    the container index to its reference set
//! 3. For touched assets, look up the built bundle size and the placeholder file
//! 4. Drop untouched assets, renumber the rest `1..=N` and prepend the root
//!
//! The pass is all-or-nothing: a visitor failure returns an error and the
//! caller keeps its current catalog. User annotations are carried over as is.

use crate::artifacts::{AssetIdentity, BuiltArtifactIndex};
use crate::catalog::{CatalogItem, SceneCatalog, SceneItem, TextureCatalog, TextureItem};
use crate::placeholder::PlaceholderLayout;
use crate::visitor::{AssetVisitor, ContainerEntry, VisitSink, VisitorError};

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Visitor failed: {0}")]
    Visitor(#[from] VisitorError),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Live statistics of a texture as the engine sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextureStats {
    pub runtime_memory_bytes: u64,
    pub width: u32,
    pub height: u32,
}

/// Reads texture statistics. `None` when the asset cannot be inspected.
pub trait AssetInspector {
    fn inspect(&self, asset_name: &str) -> Option<TextureStats>;
}

impl AssetInspector for HashMap<String, TextureStats> {
    fn inspect(&self, asset_name: &str) -> Option<TextureStats> {
        self.get(asset_name).copied()
    }
}

/// What changed between the input and output catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Assets seen for the first time
    pub added: Vec<String>,
    /// Assets no visitor reported
    pub removed: Vec<String>,
    /// Assets carried over from the input catalog
    pub retained: usize,
    /// Assets the inspector could not read
    pub uninspected: Vec<String>,
}

impl SyncReport {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub catalog: TextureCatalog,
    pub report: SyncReport,
}

/// Collaborators for one texture sync pass.
pub struct SyncEngine<'a> {
    pub dependencies: &'a dyn AssetVisitor,
    pub artifacts: &'a dyn AssetVisitor,
    pub inspector: &'a dyn AssetInspector,
    pub identity: &'a dyn AssetIdentity,
    pub artifact_index: &'a dyn BuiltArtifactIndex,
    pub layout: &'a PlaceholderLayout,
    /// Placeholder files currently on disk
    pub existing_placeholders: &'a HashSet<String>,
}

impl SyncEngine<'_> {
    pub fn synchronize(&self, current: &TextureCatalog) -> Result<SyncOutcome> {
        let mut working = WorkingSet::seed(current, self.inspector);

        self.dependencies.visit_all(&mut working)?;
        self.artifacts.visit_all(&mut working)?;

        let mut report = SyncReport {
            uninspected: std::mem::take(&mut working.uninspected),
            ..Default::default()
        };
        let mut survivors = Vec::with_capacity(working.entries.len());

        for entry in working.entries {
            if !entry.touched {
                debug!("Dropping unreferenced asset {}", entry.item.name);
                report.removed.push(entry.item.name);
                continue;
            }

            let mut item = entry.item;
            let stable_id = self.identity.stable_id(&item.name);
            item.payload.built_artifact_size_bytes =
                self.artifact_index.artifact_size(&stable_id).unwrap_or(0);

            let placeholder = self.layout.forward(&item.name);
            item.payload.placeholder_path = self
                .existing_placeholders
                .contains(&placeholder)
                .then_some(placeholder);

            if entry.seeded {
                report.retained += 1;
            } else {
                report.added.push(item.name.clone());
            }
            survivors.push(item);
        }

        info!(
            "Synchronized textures: {} kept, {} added, {} removed",
            report.retained,
            report.added.len(),
            report.removed.len()
        );

        Ok(SyncOutcome {
            catalog: TextureCatalog::from_assets(current.root().clone(), survivors),
            report,
        })
    }
}

struct Entry {
    item: TextureItem,
    touched: bool,
    seeded: bool,
}

/// Name-keyed working map that remembers insertion order.
struct WorkingSet<'i> {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    inspector: &'i dyn AssetInspector,
    uninspected: Vec<String>,
}

impl<'i> WorkingSet<'i> {
    fn seed(current: &TextureCatalog, inspector: &'i dyn AssetInspector) -> Self {
        let mut working = Self {
            entries: Vec::with_capacity(current.len()),
            by_name: HashMap::with_capacity(current.len()),
            inspector,
            uninspected: Vec::new(),
        };

        for item in current.assets() {
            if working.by_name.contains_key(&item.name) {
                warn!("Duplicate catalog entry {}, keeping the first", item.name);
                continue;
            }
            let mut item = item.clone();
            item.depth = 0;
            item.payload.ref_scenes.clear();
            working.by_name.insert(item.name.clone(), working.entries.len());
            working.entries.push(Entry {
                item,
                touched: false,
                seeded: true,
            });
        }
        working
    }
}

impl VisitSink for WorkingSet<'_> {
    fn visit(&mut self, container_index: i32, asset_name: &str) {
        let slot = match self.by_name.get(asset_name) {
            Some(&slot) => slot,
            None => {
                let slot = self.entries.len();
                self.by_name.insert(asset_name.to_string(), slot);
                self.entries.push(Entry {
                    item: CatalogItem::asset(0, asset_name),
                    touched: false,
                    seeded: false,
                });
                slot
            }
        };

        let entry = &mut self.entries[slot];
        if !entry.touched {
            // Stats only depend on the asset, read them once per pass.
            match self.inspector.inspect(asset_name) {
                Some(stats) => {
                    entry.item.payload.runtime_memory_bytes = stats.runtime_memory_bytes;
                    entry.item.payload.width = stats.width;
                    entry.item.payload.height = stats.height;
                }
                None => {
                    warn!("Cannot inspect {}, keeping previous stats", asset_name);
                    self.uninspected.push(asset_name.to_string());
                }
            }
            entry.touched = true;
        }
        entry.item.payload.ref_scenes.insert(container_index);
    }

    fn progress(&mut self, done: usize, total: usize, label: &str) {
        debug!("Visiting {}/{}: {}", done, total, label);
    }
}

/// Rebuild the scene catalog from the enabled containers, in order.
pub fn sync_scenes(
    containers: &[ContainerEntry],
    identity: &dyn AssetIdentity,
    artifact_index: &dyn BuiltArtifactIndex,
) -> SceneCatalog {
    let scenes = containers.iter().filter(|c| c.enabled).map(|container| {
        let mut item = SceneItem::asset(0, container.path.as_str());
        item.payload.built_artifact_size_bytes = artifact_index
            .artifact_size(&identity.stable_id(&container.path))
            .unwrap_or(0);
        item
    });
    let catalog = SceneCatalog::from_assets(CatalogItem::root(), scenes);
    info!("Synchronized {} scenes", catalog.len());
    catalog
}
