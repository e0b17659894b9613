//! Project configuration loaded from `streamer.yaml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "streamer.yaml";

/// Environment variable naming the project root.
pub const PROJECT_ENV: &str = "STREAMER_PROJECT";

/// Project configuration. Every field has a default, so a missing or partial
/// file is fine. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding catalogs, placeholders and bundles
    pub data_dir: String,
    pub placeholder_dir: Option<String>,
    pub texture_bundle_dir: Option<String>,
    pub scene_bundle_dir: Option<String>,
    /// Directory the scene lookup table is written to
    pub lookup_dir: Option<String>,
    /// Catalog files; a `.bin` extension selects the binary format
    pub texture_catalog: Option<String>,
    pub scene_catalog: Option<String>,
    /// Exported dependency graph (YAML or JSON)
    pub manifest: String,
    /// Build target passed to the build command
    pub platform: String,
    pub bundle_extension: String,
    /// Longest side of a generated placeholder, in pixels
    pub placeholder_max_size: u32,
    pub texture_extensions: Vec<String>,
    pub scene_extensions: Vec<String>,
    /// Program and arguments of the external bundle build
    pub build_command: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: "Assets/AutoStreamerData".to_string(),
            placeholder_dir: None,
            texture_bundle_dir: None,
            scene_bundle_dir: None,
            lookup_dir: None,
            texture_catalog: None,
            scene_catalog: None,
            manifest: "streamer-deps.yaml".to_string(),
            platform: "StandaloneWindows64".to_string(),
            bundle_extension: ".abas".to_string(),
            placeholder_max_size: 32,
            texture_extensions: ["png", "jpg", "jpeg", "tga", "psd", "tif", "tiff", "bmp", "gif", "exr", "hdr"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            scene_extensions: vec!["unity".to_string()],
            build_command: Vec::new(),
        }
    }
}

/// Resolved project-relative locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub placeholders: String,
    pub texture_bundles: String,
    pub scene_bundles: String,
    pub lookup: String,
    pub texture_catalog: String,
    pub scene_catalog: String,
    pub lock: String,
}

impl Config {
    /// Load `streamer.yaml` from `root`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn paths(&self) -> Paths {
        let data = self.data_dir.trim_end_matches('/');
        let under = |value: &Option<String>, default: &str| {
            value
                .clone()
                .unwrap_or_else(|| format!("{}/{}", data, default))
        };
        // Bundles are kept apart per build target
        let per_platform = |dir: String| format!("{}/{}", dir.trim_end_matches('/'), self.platform);
        Paths {
            placeholders: under(&self.placeholder_dir, "Placeholders"),
            texture_bundles: per_platform(under(&self.texture_bundle_dir, "TextureABs")),
            scene_bundles: per_platform(under(&self.scene_bundle_dir, "SceneABs")),
            lookup: under(&self.lookup_dir, "autostreamerablut"),
            texture_catalog: under(&self.texture_catalog, "textures.json"),
            scene_catalog: under(&self.scene_catalog, "scenes.json"),
            lock: format!("{}/.streamer.lock", data),
        }
    }
}

/// Pick the project root: explicit argument, then `STREAMER_PROJECT`, then
/// the current directory.
pub fn resolve_project_root(arg: Option<PathBuf>) -> PathBuf {
    if let Some(path) = arg {
        return expand_tilde(&path.to_string_lossy());
    }
    match std::env::var(PROJECT_ENV) {
        Ok(value) if !value.is_empty() => expand_tilde(&value),
        _ => PathBuf::from("."),
    }
}

/// Expand ~ or ~/ prefix to the user's home directory.
fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"))
    } else if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path))
    } else {
        PathBuf::from(path)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}
