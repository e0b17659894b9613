//! Visitors that report (container, asset) associations to the sync engine.
//!
//! The dependency graph itself is external. [`DependencyManifest`] is its
//! serialized form: the list of containers (scenes), the content of already
//! built bundles, and the direct dependency edges of every asset.

use crate::fs::{FileSystem, FsError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use thiserror::Error;
use tracing::debug;

/// Container index reported for assets found inside a built bundle.
pub const ARTIFACT_CONTAINER: i32 = -1;

#[derive(Debug, Error)]
pub enum VisitorError {
    #[error("Container has no dependency definition: {0}")]
    MissingContainer(String),

    #[error("Cannot read dependency manifest {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Filesystem error: {0}")]
    Fs(#[from] FsError),
}

pub type Result<T> = std::result::Result<T, VisitorError>;

/// Receiver of visitor output.
pub trait VisitSink {
    fn visit(&mut self, container_index: i32, asset_name: &str);

    /// Observability only: `done` of `total` units processed so far.
    fn progress(&mut self, _done: usize, _total: usize, _label: &str) {}
}

/// An external enumeration of asset references.
pub trait AssetVisitor {
    fn visit_all(&self, sink: &mut dyn VisitSink) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetKind {
    Texture,
    Scene,
    Other,
}

/// Classifies assets by file extension, case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRules {
    texture_extensions: Vec<String>,
    scene_extensions: Vec<String>,
}

impl KindRules {
    pub fn new(texture_extensions: &[String], scene_extensions: &[String]) -> Self {
        let normalize = |extensions: &[String]| {
            extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect()
        };
        Self {
            texture_extensions: normalize(texture_extensions),
            scene_extensions: normalize(scene_extensions),
        }
    }

    pub fn classify(&self, asset_name: &str) -> AssetKind {
        let file_name = asset_name.rsplit('/').next().unwrap_or(asset_name);
        let Some((_, extension)) = file_name.rsplit_once('.') else {
            return AssetKind::Other;
        };
        let extension = extension.to_lowercase();
        if self.texture_extensions.contains(&extension) {
            AssetKind::Texture
        } else if self.scene_extensions.contains(&extension) {
            AssetKind::Scene
        } else {
            AssetKind::Other
        }
    }
}

impl Default for KindRules {
    fn default() -> Self {
        let textures = ["png", "jpg", "jpeg", "tga", "psd", "tif", "tiff", "bmp", "gif", "exr", "hdr"];
        Self {
            texture_extensions: textures.iter().map(|ext| ext.to_string()).collect(),
            scene_extensions: vec!["unity".to_string()],
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// A top-level container, in build order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerEntry {
    pub path: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

/// The member assets of one built bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleContents {
    pub name: String,
    #[serde(default)]
    pub assets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyManifest {
    pub containers: Vec<ContainerEntry>,
    pub bundles: Vec<BundleContents>,
    /// Direct dependencies of each asset.
    pub dependencies: BTreeMap<String, Vec<String>>,
    /// Engine ids, where the exporter knows them.
    pub guids: HashMap<String, String>,
}

impl DependencyManifest {
    /// Parse YAML (or JSON, which YAML accepts).
    pub fn parse(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn load<F: FileSystem + ?Sized>(fs: &F, path: &str) -> Result<Self> {
        let bytes = fs.read(path)?;
        let text = String::from_utf8(bytes).map_err(|e| VisitorError::Unreadable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text).map_err(|e| VisitorError::Unreadable {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    /// Enabled containers with their index in the full container list.
    pub fn enabled_containers(&self) -> impl Iterator<Item = (usize, &ContainerEntry)> {
        self.containers.iter().enumerate().filter(|(_, c)| c.enabled)
    }

    /// Transitive dependencies of `root`, including `root` itself, in
    /// breadth-first discovery order.
    pub fn dependencies_of<'a>(&'a self, root: &'a str) -> Vec<&'a str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);

        while let Some(asset) = queue.pop_front() {
            if !seen.insert(asset) {
                continue;
            }
            order.push(asset);
            if let Some(deps) = self.dependencies.get(asset) {
                queue.extend(deps.iter().map(String::as_str));
            }
        }
        order
    }
}

/// Walks the enabled containers and reports every dependency of `kind`.
pub struct ContainerVisitor<'a> {
    pub manifest: &'a DependencyManifest,
    pub rules: &'a KindRules,
    pub kind: AssetKind,
}

impl AssetVisitor for ContainerVisitor<'_> {
    fn visit_all(&self, sink: &mut dyn VisitSink) -> Result<()> {
        let containers: Vec<_> = self.manifest.enabled_containers().collect();
        let total = containers.len();

        // Check every container before reporting anything.
        if let Some((_, missing)) = containers
            .iter()
            .find(|(_, c)| !self.manifest.dependencies.contains_key(&c.path))
        {
            return Err(VisitorError::MissingContainer(missing.path.clone()));
        }

        for (done, (index, container)) in containers.into_iter().enumerate() {
            sink.progress(done, total, &container.path);
            for asset in self.manifest.dependencies_of(&container.path) {
                if self.rules.classify(asset) == self.kind {
                    sink.visit(index as i32, asset);
                }
            }
        }
        sink.progress(total, total, "containers");
        debug!("Visited {} containers", total);
        Ok(())
    }
}

/// Walks the content of already built bundles, reporting every dependency
/// of `kind` with [`ARTIFACT_CONTAINER`].
pub struct BundleVisitor<'a> {
    pub manifest: &'a DependencyManifest,
    pub rules: &'a KindRules,
    pub kind: AssetKind,
}

impl AssetVisitor for BundleVisitor<'_> {
    fn visit_all(&self, sink: &mut dyn VisitSink) -> Result<()> {
        let total = self.manifest.bundles.len();
        for (done, bundle) in self.manifest.bundles.iter().enumerate() {
            sink.progress(done, total, &bundle.name);
            for member in &bundle.assets {
                for asset in self.manifest.dependencies_of(member) {
                    if self.rules.classify(asset) == self.kind {
                        sink.visit(ARTIFACT_CONTAINER, asset);
                    }
                }
            }
        }
        sink.progress(total, total, "bundles");
        debug!("Visited {} built bundles", total);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Records every visit in order.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub visits: Vec<(i32, String)>,
        pub progress_calls: usize,
    }

    impl VisitSink for Recorder {
        fn visit(&mut self, container_index: i32, asset_name: &str) {
            self.visits.push((container_index, asset_name.to_string()));
        }

        fn progress(&mut self, _done: usize, _total: usize, _label: &str) {
            self.progress_calls += 1;
        }
    }

    pub(crate) const MANIFEST: &str = r#"
containers:
  - path: Scenes/Main.unity
  - path: Scenes/Debug.unity
    enabled: false
  - path: Scenes/Level1.unity
bundles:
  - name: shared
    assets: [Materials/Rock.mat]
dependencies:
  Scenes/Main.unity: [Materials/Grass.mat, Textures/logo.png]
  Scenes/Debug.unity: [Textures/debug.png]
  Scenes/Level1.unity: [Materials/Grass.mat, Materials/Rock.mat]
  Materials/Grass.mat: [Textures/grass.png, Textures/grass_n.png]
  Materials/Rock.mat: [Textures/rock.TGA]
guids:
  Scenes/Main.unity: "11111111111111111111111111111111"
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = DependencyManifest::parse(MANIFEST).unwrap();
        assert_eq!(manifest.containers.len(), 3);
        assert!(!manifest.containers[1].enabled);
        assert_eq!(manifest.bundles[0].assets, vec!["Materials/Rock.mat"]);
        let enabled: Vec<_> = manifest.enabled_containers().map(|(i, _)| i).collect();
        assert_eq!(enabled, vec![0, 2]);
    }

    #[test]
    fn test_parse_json_manifest() {
        let manifest = DependencyManifest::parse(
            r#"{"containers": [{"path": "a.unity"}], "dependencies": {"a.unity": []}}"#,
        )
        .unwrap();
        assert!(manifest.containers[0].enabled);
        assert!(manifest.bundles.is_empty());
    }

    #[test]
    fn test_dependencies_are_transitive_and_include_self() {
        let manifest = DependencyManifest::parse(MANIFEST).unwrap();
        assert_eq!(
            manifest.dependencies_of("Scenes/Main.unity"),
            vec![
                "Scenes/Main.unity",
                "Materials/Grass.mat",
                "Textures/logo.png",
                "Textures/grass.png",
                "Textures/grass_n.png",
            ]
        );
        assert_eq!(manifest.dependencies_of("lonely.png"), vec!["lonely.png"]);
    }

    #[test]
    fn test_dependencies_tolerate_cycles() {
        let manifest = DependencyManifest::parse("dependencies: {a: [b], b: [a]}").unwrap();
        assert_eq!(manifest.dependencies_of("a"), vec!["a", "b"]);
    }

    #[test]
    fn test_classify() {
        let rules = KindRules::default();
        assert_eq!(rules.classify("Textures/rock.TGA"), AssetKind::Texture);
        assert_eq!(rules.classify("Scenes/Main.unity"), AssetKind::Scene);
        assert_eq!(rules.classify("Materials/Rock.mat"), AssetKind::Other);
        assert_eq!(rules.classify("png"), AssetKind::Other);
        assert_eq!(rules.classify("dir.png/readme"), AssetKind::Other);

        let custom = KindRules::new(&[".DDS".to_string()], &[]);
        assert_eq!(custom.classify("a.dds"), AssetKind::Texture);
    }

    #[test]
    fn test_container_visitor_reports_textures_by_index() {
        let manifest = DependencyManifest::parse(MANIFEST).unwrap();
        let rules = KindRules::default();
        let visitor = ContainerVisitor {
            manifest: &manifest,
            rules: &rules,
            kind: AssetKind::Texture,
        };

        let mut recorder = Recorder::default();
        visitor.visit_all(&mut recorder).unwrap();

        let expected: Vec<(i32, String)> = [
            (0, "Textures/logo.png"),
            (0, "Textures/grass.png"),
            (0, "Textures/grass_n.png"),
            (2, "Textures/grass.png"),
            (2, "Textures/grass_n.png"),
            (2, "Textures/rock.TGA"),
        ]
        .into_iter()
        .map(|(i, name)| (i, name.to_string()))
        .collect();
        assert_eq!(recorder.visits, expected);
        assert_eq!(recorder.progress_calls, 3);
    }

    #[test]
    fn test_container_visitor_fails_on_undefined_container() {
        let manifest =
            DependencyManifest::parse("containers: [{path: a.unity}, {path: b.unity}]\ndependencies: {a.unity: [x.png]}")
                .unwrap();
        let rules = KindRules::default();
        let visitor = ContainerVisitor {
            manifest: &manifest,
            rules: &rules,
            kind: AssetKind::Texture,
        };

        let mut recorder = Recorder::default();
        let err = visitor.visit_all(&mut recorder).unwrap_err();
        assert!(matches!(err, VisitorError::MissingContainer(path) if path == "b.unity"));
        assert!(recorder.visits.is_empty());
    }

    #[test]
    fn test_bundle_visitor_uses_sentinel() {
        let manifest = DependencyManifest::parse(MANIFEST).unwrap();
        let rules = KindRules::default();
        let visitor = BundleVisitor {
            manifest: &manifest,
            rules: &rules,
            kind: AssetKind::Texture,
        };

        let mut recorder = Recorder::default();
        visitor.visit_all(&mut recorder).unwrap();
        assert_eq!(
            recorder.visits,
            vec![(ARTIFACT_CONTAINER, "Textures/rock.TGA".to_string())]
        );
    }

    #[test]
    fn test_load_reports_unreadable() {
        use crate::fs::InMemoryFs;

        let fs = InMemoryFs::new();
        fs.write("deps.yaml", b"containers: 12").unwrap();
        assert!(matches!(
            DependencyManifest::load(&fs, "deps.yaml"),
            Err(VisitorError::Unreadable { .. })
        ));
        assert!(matches!(
            DependencyManifest::load(&fs, "missing.yaml"),
            Err(VisitorError::Fs(FsError::NotFound(_)))
        ));
    }
}
