//! A project on disk: configuration, catalogs and the commands run on them.
//!
//! Methods that write catalogs or files expect the caller to hold the
//! project's [`CatalogLock`].

use crate::build_runner::ExternalBuild;
use crate::config::{Config, Paths};
use crate::inspector::ImageInspector;
use crate::lock::CatalogLock;
use crate::native_fs::NativeFs;
use crate::placeholder_writer::ImagePlaceholderWriter;

use anyhow::{Context, Result, anyhow, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use streamer_core::bundles::{self, BuildOutcome};
use streamer_core::catalog::{CatalogItem, SceneStatus, TextureStatus, format_bytes};
use streamer_core::fs::walk_files;
use streamer_core::reconcile::{ApplyReport, ReconcilePlan, apply_plan, reconcile, refresh_placeholder_paths};
use streamer_core::{
    ArtifactDirectory, AssetKind, BundleVisitor, Catalog, CatalogStore, ContainerVisitor, DependencyManifest,
    GuidTable, KindRules, PlaceholderLayout, SceneCatalog, SceneItem, SyncEngine, SyncReport, TextureCatalog,
    TextureItem, sync_scenes,
};
use tracing::info;
use tree_model::{Column, ROOT_ID, Row, SortDirection, SortSpec, TreeModel, compare_by};

pub struct Project {
    root: PathBuf,
    config: Config,
    paths: Paths,
    fs: NativeFs,
}

/// Result of a placeholder update.
#[derive(Debug)]
pub struct PlaceholderRun {
    pub plan: ReconcilePlan,
    /// `None` for a dry run
    pub applied: Option<ApplyReport>,
}

/// How to present a catalog as rows.
#[derive(Debug, Clone)]
pub struct TreeQuery<C> {
    pub search: Option<String>,
    pub sort: Vec<SortSpec<C>>,
    pub expand_all: bool,
}

impl<C> Default for TreeQuery<C> {
    fn default() -> Self {
        Self {
            search: None,
            sort: Vec::new(),
            expand_all: false,
        }
    }
}

impl<C> TreeQuery<C> {
    /// The search text, if it is non-empty.
    fn active_search(&self) -> Option<&str> {
        self.search.as_deref().filter(|search| !search.is_empty())
    }
}

impl Project {
    pub fn open(root: PathBuf) -> Result<Self> {
        let config = Config::load(&root)?;
        Ok(Self::with_config(root, config))
    }

    pub fn with_config(root: PathBuf, config: Config) -> Self {
        let paths = config.paths();
        let fs = NativeFs::new(root.clone());
        Self {
            root,
            config,
            paths,
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn lock(&self) -> Result<CatalogLock> {
        Ok(CatalogLock::acquire(&self.root.join(&self.paths.lock))?)
    }

    fn rules(&self) -> KindRules {
        KindRules::new(&self.config.texture_extensions, &self.config.scene_extensions)
    }

    fn layout(&self) -> PlaceholderLayout {
        PlaceholderLayout::new(self.paths.placeholders.as_str())
    }

    pub fn manifest(&self) -> Result<DependencyManifest> {
        DependencyManifest::load(&self.fs, &self.config.manifest)
            .with_context(|| format!("Failed to load dependency manifest {}", self.config.manifest))
    }

    pub fn load_textures(&self) -> Result<TextureCatalog> {
        CatalogStore::new(&self.fs, self.paths.texture_catalog.as_str())
            .load()
            .with_context(|| format!("Failed to load {}", self.paths.texture_catalog))
    }

    pub fn save_textures(&self, catalog: &TextureCatalog) -> Result<()> {
        CatalogStore::new(&self.fs, self.paths.texture_catalog.as_str()).save(catalog)?;
        Ok(())
    }

    pub fn load_scenes(&self) -> Result<SceneCatalog> {
        CatalogStore::new(&self.fs, self.paths.scene_catalog.as_str())
            .load()
            .with_context(|| format!("Failed to load {}", self.paths.scene_catalog))
    }

    pub fn save_scenes(&self, catalog: &SceneCatalog) -> Result<()> {
        CatalogStore::new(&self.fs, self.paths.scene_catalog.as_str()).save(catalog)?;
        Ok(())
    }

    fn existing_placeholders(&self) -> Result<HashSet<String>> {
        Ok(walk_files(&self.fs, &self.paths.placeholders)?.into_iter().collect())
    }

    /// Rebuild the texture catalog from the manifest and the built bundles.
    pub fn sync_textures(&self) -> Result<SyncReport> {
        let manifest = self.manifest()?;
        let rules = self.rules();
        let identity = GuidTable::new(manifest.guids.clone());
        let artifact_index =
            ArtifactDirectory::scan(&self.fs, &self.paths.texture_bundles, &self.config.bundle_extension)?;
        let existing_placeholders = self.existing_placeholders()?;
        let inspector = ImageInspector::new(self.root.clone());

        let dependencies = ContainerVisitor {
            manifest: &manifest,
            rules: &rules,
            kind: AssetKind::Texture,
        };
        let artifacts = BundleVisitor {
            manifest: &manifest,
            rules: &rules,
            kind: AssetKind::Texture,
        };

        let current = self.load_textures()?;
        let outcome = SyncEngine {
            dependencies: &dependencies,
            artifacts: &artifacts,
            inspector: &inspector,
            identity: &identity,
            artifact_index: &artifact_index,
            layout: &self.layout(),
            existing_placeholders: &existing_placeholders,
        }
        .synchronize(&current)?;

        self.save_textures(&outcome.catalog)?;
        Ok(outcome.report)
    }

    /// Rebuild the scene catalog from the enabled containers.
    pub fn sync_scenes(&self) -> Result<SceneCatalog> {
        let manifest = self.manifest()?;
        let identity = GuidTable::new(manifest.guids.clone());
        let artifact_index =
            ArtifactDirectory::scan(&self.fs, &self.paths.scene_bundles, &self.config.bundle_extension)?;

        let catalog = sync_scenes(&manifest.containers, &identity, &artifact_index);
        self.save_scenes(&catalog)?;
        Ok(catalog)
    }

    /// Create and delete placeholder files to match the annotations.
    pub fn update_placeholders(&self, dry_run: bool) -> Result<PlaceholderRun> {
        let layout = self.layout();
        let catalog = self.load_textures()?;
        let existing = self.existing_placeholders()?;
        let plan = reconcile(&catalog, existing.iter().map(String::as_str), &layout);

        if dry_run {
            return Ok(PlaceholderRun { plan, applied: None });
        }

        let writer = ImagePlaceholderWriter::new(self.root.clone(), self.config.placeholder_max_size);
        let applied = apply_plan(&plan, &layout, &self.fs, &writer);

        let present = self.existing_placeholders()?;
        self.save_textures(&refresh_placeholder_paths(catalog, &layout, &present))?;
        Ok(PlaceholderRun {
            plan,
            applied: Some(applied),
        })
    }

    fn build_command(&self) -> Result<ExternalBuild> {
        ExternalBuild::new(&self.config.build_command, self.root.clone())
            .ok_or_else(|| anyhow!("No build_command configured in streamer.yaml"))
    }

    /// Build one bundle per placeholder texture, then re-sync textures.
    pub fn build_texture_bundles(&self) -> Result<BuildOutcome> {
        let command = self.build_command()?;
        let manifest = self.manifest()?;
        let identity = GuidTable::new(manifest.guids.clone());
        let catalog = self.load_textures()?;

        let outcome = bundles::build_texture_bundles(
            &catalog,
            &identity,
            &self.fs,
            &self.paths.texture_bundles,
            &self.config.bundle_extension,
            &self.config.platform,
            &command,
        )?;
        self.sync_textures()?;
        Ok(outcome)
    }

    /// Build the placeholder bundle and scene bundles, then re-sync scenes.
    pub fn build_scene_bundles(&self, force_rebuild: bool) -> Result<BuildOutcome> {
        let command = self.build_command()?;
        let manifest = self.manifest()?;
        let identity = GuidTable::new(manifest.guids.clone());
        let textures = self.load_textures()?;

        let outcome = bundles::build_scene_bundles(
            &manifest.containers,
            &textures,
            &identity,
            &self.fs,
            &self.paths.scene_bundles,
            &self.paths.lookup,
            &self.config.bundle_extension,
            &self.config.platform,
            force_rebuild,
            &command,
        )?;
        self.sync_scenes()?;
        Ok(outcome)
    }

    pub fn status(&self) -> Result<(TextureStatus, SceneStatus)> {
        Ok((self.load_textures()?.status(), self.load_scenes()?.status()))
    }

    /// Set the placeholder annotation on the named textures. Returns the
    /// names that are not in the catalog.
    pub fn mark(&self, names: &[String], enabled: bool) -> Result<Vec<String>> {
        let mut catalog = self.load_textures()?;
        let unknown: Vec<String> = names
            .iter()
            .filter(|name| !catalog.set_use_placeholder(name, enabled))
            .cloned()
            .collect();
        self.save_textures(&catalog)?;
        Ok(unknown)
    }

    /// Move textures under `parent` (a texture name, or the root's name) at `index`.
    pub fn move_textures(&self, parent: &str, index: usize, names: &[String]) -> Result<()> {
        let catalog = self.load_textures()?;
        let resolve = |name: &str| -> Result<i32> {
            if name == catalog.root().name {
                return Ok(ROOT_ID);
            }
            catalog
                .get(name)
                .map(|item| item.id)
                .ok_or_else(|| anyhow!("No texture named {}", name))
        };

        let parent_id = resolve(parent)?;
        let ids = names
            .iter()
            .map(|name| resolve(name))
            .collect::<Result<Vec<_>>>()?;

        let mut model = catalog.into_model()?;
        model.move_elements(parent_id, index, &ids)?;
        self.save_textures(&Catalog::from_model(model))?;
        info!("Moved {} textures under {}", ids.len(), parent);
        Ok(())
    }

    pub fn texture_rows<C: Column<TextureItem>>(&self, query: &TreeQuery<C>) -> Result<Vec<String>> {
        let model = self.load_textures()?.into_model()?;
        Ok(render(&model, query, describe_texture))
    }

    pub fn scene_rows<C: Column<SceneItem>>(&self, query: &TreeQuery<C>) -> Result<Vec<String>> {
        let model = self.load_scenes()?.into_model()?;
        Ok(render(&model, query, |scene| {
            format_bytes(scene.payload.built_artifact_size_bytes)
        }))
    }
}

fn rows_for<P, C: Column<CatalogItem<P>>>(
    model: &TreeModel<CatalogItem<P>>,
    query: &TreeQuery<C>,
) -> Vec<Row> {
    let expanded: HashSet<i32> = if query.expand_all {
        model.descendants_that_have_children(ROOT_ID).into_iter().collect()
    } else {
        HashSet::new()
    };
    let is_expanded = |id: i32| expanded.contains(&id);
    match query.active_search() {
        _ if query.sort.is_empty() => model.build_rows(query.active_search(), is_expanded),
        Some(search) => model.search_sorted_by(search, |a, b| compare_by(&query.sort, a, b)),
        None => model.sorted_rows(&query.sort, is_expanded),
    }
}

fn render<P, C: Column<CatalogItem<P>>>(
    model: &TreeModel<CatalogItem<P>>,
    query: &TreeQuery<C>,
    describe: impl Fn(&CatalogItem<P>) -> String,
) -> Vec<String> {
    rows_for(model, query)
        .into_iter()
        .filter_map(|row| {
            let item = model.get(row.id)?;
            let marker = match (row.has_children, query.expand_all) {
                (false, _) => ' ',
                (true, true) => '-',
                (true, false) => '+',
            };
            let indent = "  ".repeat(row.depth.max(0) as usize);
            let mut line = format!("{}{} {}  {}", indent, marker, item.name, describe(item));
            // Search rows are flattened, name the parent they came from
            let parent = query
                .active_search()
                .and_then(|_| model.ancestors(row.id).last().copied())
                .filter(|&id| id != ROOT_ID)
                .and_then(|id| model.get(id));
            if let Some(parent) = parent {
                line.push_str(&format!("  (in {})", parent.name));
            }
            Some(line.trim_end().to_string())
        })
        .collect()
}

fn describe_texture(item: &TextureItem) -> String {
    let payload = &item.payload;
    let mut text = format!(
        "{}x{}  {}  bundle {}  scenes {}",
        payload.width,
        payload.height,
        format_bytes(payload.runtime_memory_bytes),
        format_bytes(payload.built_artifact_size_bytes),
        payload.ref_scenes.len()
    );
    if payload.use_placeholder {
        text.push_str("  [placeholder]");
    }
    text
}

/// Parse `column[:asc|:desc]` entries separated by commas.
pub fn parse_sort<C: FromStr<Err = String>>(spec: &str) -> Result<Vec<SortSpec<C>>> {
    spec.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| -> Result<SortSpec<C>> {
            let (column, direction) = match part.split_once(':') {
                Some((column, "asc")) => (column, SortDirection::Ascending),
                Some((column, "desc")) => (column, SortDirection::Descending),
                Some((_, other)) => bail!("unknown sort direction '{}'", other),
                None => (part, SortDirection::Ascending),
            };
            let column = column.parse::<C>().map_err(|e| anyhow!(e))?;
            Ok(SortSpec { column, direction })
        })
        .collect()
}
