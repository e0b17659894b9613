//! Bundle build planning.
//!
//! Builds themselves are delegated to an external [`BuildCommand`]; this
//! module decides which bundles to request, which stale outputs to prune and
//! what the scene lookup table contains.

use crate::artifacts::AssetIdentity;
use crate::catalog::TextureCatalog;
use crate::fs::{self, FileSystem, FsError};
use crate::visitor::ContainerEntry;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Stem of the bundle holding every placeholder-substituted texture.
pub const PLACEHOLDER_BUNDLE: &str = "Placeholders";

/// Companion file the build tool writes next to each bundle.
pub const MANIFEST_SUFFIX: &str = ".manifest";

/// File name of the scene lookup table.
pub const SCENE_LOOKUP_FILE: &str = "scenes";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Cannot launch build command: {0}")]
    Launch(String),

    #[error("Build command failed: {0}")]
    Failed(String),

    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),
}

pub type Result<T> = std::result::Result<T, BuildError>;

/// One bundle to build: its file name and the assets it packs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSpec {
    pub name: String,
    pub assets: Vec<String>,
}

/// Everything an external build needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub output_dir: String,
    pub platform: String,
    pub force_rebuild: bool,
    pub bundles: Vec<BundleSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Files the build produced
    pub produced: Vec<String>,
    /// Files removed before building
    pub pruned: Vec<String>,
}

/// An opaque external build step.
pub trait BuildCommand {
    /// Run the build, returning the produced file paths.
    fn build(&self, request: &BuildRequest) -> Result<Vec<String>>;
}

/// One bundle per placeholder-substituted texture, named after its stable id.
pub fn texture_bundles(
    catalog: &TextureCatalog,
    identity: &dyn AssetIdentity,
    extension: &str,
) -> Vec<BundleSpec> {
    catalog
        .placeholder_names()
        .map(|name| BundleSpec {
            name: format!("{}{}", identity.stable_id(name), extension),
            assets: vec![name.to_string()],
        })
        .collect()
}

/// Files in `existing` that belong to a bundle not in `keep`, together with
/// their manifests.
pub fn stale_bundle_files(existing: &[String], keep: &[BundleSpec], extension: &str) -> Vec<String> {
    let wanted: HashSet<&str> = keep.iter().map(|bundle| bundle.name.as_str()).collect();
    let present: HashSet<&str> = existing.iter().map(String::as_str).collect();

    let mut stale = Vec::new();
    for path in existing {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        if !file_name.ends_with(extension) || wanted.contains(file_name) {
            continue;
        }
        stale.push(path.clone());
        let manifest = format!("{}{}", path, MANIFEST_SUFFIX);
        if present.contains(manifest.as_str()) {
            stale.push(manifest);
        }
    }
    stale
}

/// Prune stale texture bundles from `output_dir`, then build the rest.
pub fn build_texture_bundles<F: FileSystem + ?Sized>(
    catalog: &TextureCatalog,
    identity: &dyn AssetIdentity,
    fs: &F,
    output_dir: &str,
    extension: &str,
    platform: &str,
    command: &dyn BuildCommand,
) -> Result<BuildOutcome> {
    let bundles = texture_bundles(catalog, identity, extension);
    let existing = fs::walk_files(fs, output_dir)?;

    let mut outcome = BuildOutcome::default();
    for path in stale_bundle_files(&existing, &bundles, extension) {
        debug!("Pruning stale bundle file {}", path);
        fs.delete(&path)?;
        outcome.pruned.push(path);
    }

    if bundles.is_empty() {
        info!("No textures use placeholders, nothing to build");
        return Ok(outcome);
    }

    fs.mkdir(output_dir)?;
    let request = BuildRequest {
        output_dir: output_dir.to_string(),
        platform: platform.to_string(),
        force_rebuild: false,
        bundles,
    };
    outcome.produced = command.build(&request)?;
    info!(
        "Built {} texture bundles ({} files)",
        request.bundles.len(),
        outcome.produced.len()
    );
    Ok(outcome)
}

/// The placeholder bundle followed by one bundle per enabled scene.
pub fn scene_bundles(
    containers: &[ContainerEntry],
    textures: &TextureCatalog,
    identity: &dyn AssetIdentity,
    extension: &str,
) -> Vec<BundleSpec> {
    let mut bundles = vec![BundleSpec {
        name: format!("{}{}", PLACEHOLDER_BUNDLE, extension),
        assets: textures.placeholder_names().map(str::to_string).collect(),
    }];
    bundles.extend(containers.iter().filter(|c| c.enabled).map(|scene| BundleSpec {
        name: format!("{}{}", identity.stable_id(&scene.path), extension),
        assets: vec![scene.path.clone()],
    }));
    bundles
}

/// Lookup table mapping scene paths to bundle ids: the header `scenes`, the
/// number of lines that follow, then alternating path and id lines.
pub fn scene_lookup_table(containers: &[ContainerEntry], identity: &dyn AssetIdentity) -> String {
    let scenes: Vec<&ContainerEntry> = containers.iter().filter(|c| c.enabled).collect();
    let mut lines = Vec::with_capacity(2 + scenes.len() * 2);
    lines.push(SCENE_LOOKUP_FILE.to_string());
    lines.push((scenes.len() * 2).to_string());
    for scene in scenes {
        lines.push(scene.path.clone());
        lines.push(identity.stable_id(&scene.path));
    }
    lines.join("\n")
}

/// Build the placeholder bundle and every scene bundle, then write the lookup
/// table into `lookup_dir`.
#[allow(clippy::too_many_arguments)]
pub fn build_scene_bundles<F: FileSystem + ?Sized>(
    containers: &[ContainerEntry],
    textures: &TextureCatalog,
    identity: &dyn AssetIdentity,
    fs: &F,
    output_dir: &str,
    lookup_dir: &str,
    extension: &str,
    platform: &str,
    force_rebuild: bool,
    command: &dyn BuildCommand,
) -> Result<BuildOutcome> {
    fs.mkdir(output_dir)?;
    let request = BuildRequest {
        output_dir: output_dir.to_string(),
        platform: platform.to_string(),
        force_rebuild,
        bundles: scene_bundles(containers, textures, identity, extension),
    };
    let mut outcome = BuildOutcome {
        produced: command.build(&request)?,
        ..Default::default()
    };

    let lookup_path = fs::join(lookup_dir, SCENE_LOOKUP_FILE);
    fs.write(&lookup_path, scene_lookup_table(containers, identity).as_bytes())?;
    outcome.produced.push(lookup_path);

    info!(
        "Built {} scene bundles ({} files)",
        request.bundles.len(),
        outcome.produced.len()
    );
    Ok(outcome)
}
