//! Deterministic mapping between asset names and placeholder file paths.
//!
//! `forward("Textures/grass.png")` under root `Placeholders` is
//! `Placeholders/Textures/grass-0.png`. The extension is everything from the
//! last `.` of the final path component, so names without an extension and
//! names ending in a dot map back exactly.

use thiserror::Error;

/// Marker inserted between an asset's stem and its extension.
pub const PLACEHOLDER_MARKER: &str = "-0";

/// A placeholder file path that no asset name maps to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathMappingError {
    #[error("{path} is not under placeholder directory {root}")]
    OutsideRoot { path: String, root: String },

    #[error("{path} has no '-0' marker before its extension")]
    MissingMarker { path: String },
}

impl PathMappingError {
    pub fn path(&self) -> &str {
        match self {
            PathMappingError::OutsideRoot { path, .. } => path,
            PathMappingError::MissingMarker { path } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderLayout {
    root: String,
    prefix: String,
}

impl PlaceholderLayout {
    pub fn new(root: impl Into<String>) -> Self {
        let root = root.into().trim_end_matches('/').to_string();
        let prefix = if root.is_empty() {
            String::new()
        } else {
            format!("{}/", root)
        };
        Self { root, prefix }
    }

    /// Directory every placeholder lives under.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn forward(&self, asset_name: &str) -> String {
        let (stem, extension) = split_extension(asset_name);
        format!("{}{}{}{}", self.prefix, stem, PLACEHOLDER_MARKER, extension)
    }

    pub fn inverse(&self, path: &str) -> Result<String, PathMappingError> {
        let relative = path
            .strip_prefix(&self.prefix)
            .ok_or_else(|| PathMappingError::OutsideRoot {
                path: path.to_string(),
                root: self.root.clone(),
            })?;

        let (stem, extension) = split_extension(relative);
        let stem = stem
            .strip_suffix(PLACEHOLDER_MARKER)
            .ok_or_else(|| PathMappingError::MissingMarker {
                path: path.to_string(),
            })?;

        Ok(format!("{}{}", stem, extension))
    }
}

/// Split a path into stem and extension (with its leading dot).
fn split_extension(path: &str) -> (&str, &str) {
    let file_start = path.rfind('/').map_or(0, |pos| pos + 1);
    match path[file_start..].rfind('.') {
        Some(dot) => path.split_at(file_start + dot),
        None => (path, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward() {
        let layout = PlaceholderLayout::new("Assets/AutoStreamerData/Placeholders/");
        assert_eq!(
            layout.forward("Assets/Textures/grass.png"),
            "Assets/AutoStreamerData/Placeholders/Assets/Textures/grass-0.png"
        );
        assert_eq!(layout.forward("noext"), "Assets/AutoStreamerData/Placeholders/noext-0");
    }

    #[test]
    fn test_split_extension_uses_final_component() {
        assert_eq!(split_extension("dir.v2/file"), ("dir.v2/file", ""));
        assert_eq!(split_extension("a/b.tar.gz"), ("a/b.tar", ".gz"));
        assert_eq!(split_extension("a/.hidden"), ("a/", ".hidden"));
        assert_eq!(split_extension("a/trailing."), ("a/trailing", "."));
    }

    #[test]
    fn test_inverse_rejects_foreign_paths() {
        let layout = PlaceholderLayout::new("P");
        assert!(matches!(
            layout.inverse("Other/a-0.png"),
            Err(PathMappingError::OutsideRoot { .. })
        ));
        let err = layout.inverse("P/a.png").unwrap_err();
        assert!(matches!(err, PathMappingError::MissingMarker { .. }));
        assert_eq!(err.path(), "P/a.png");
    }

    #[test]
    fn test_bijection_over_generated_names() {
        let layout = PlaceholderLayout::new("Assets/AutoStreamerData/Placeholders");
        let dirs = ["", "Textures/", "Art/Env/Rocks/", "weird.dir/", "a b/c-0/"];
        let stems = ["grass", "tex10", "rock-0", "x.y", "", "UPPER"];
        let extensions = [".png", ".PSD", ".tga", "", ".", ".tar.gz"];

        let mut checked = 0;
        for (i, dir) in dirs.iter().cycle().enumerate().take(100) {
            let stem = stems[i % stems.len()];
            let extension = extensions[(i / stems.len()) % extensions.len()];
            let name = format!("{}{}{}", dir, stem, extension);

            let path = layout.forward(&name);
            assert_eq!(layout.inverse(&path).unwrap(), name, "path: {}", path);
            checked += 1;
        }
        assert_eq!(checked, 100);
    }

    #[test]
    fn test_empty_root() {
        let layout = PlaceholderLayout::new("");
        assert_eq!(layout.forward("a.png"), "a-0.png");
        assert_eq!(layout.inverse("a-0.png").unwrap(), "a.png");
    }
}
