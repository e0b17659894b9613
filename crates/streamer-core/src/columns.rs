//! Sortable columns of the texture and scene tables.

use crate::catalog::{SceneItem, TextureItem};
use std::cmp::Ordering;
use std::str::FromStr;
use tree_model::{Column, natural_cmp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureColumn {
    AssetPath,
    RuntimeMemory,
    Width,
    Height,
    Placeholder,
    BuiltSize,
    RefScenes,
}

impl Column<TextureItem> for TextureColumn {
    fn compare(&self, a: &TextureItem, b: &TextureItem) -> Ordering {
        let (x, y) = (&a.payload, &b.payload);
        match self {
            TextureColumn::AssetPath => natural_cmp(&a.name, &b.name),
            TextureColumn::RuntimeMemory => x.runtime_memory_bytes.cmp(&y.runtime_memory_bytes),
            TextureColumn::Width => x.width.cmp(&y.width),
            TextureColumn::Height => x.height.cmp(&y.height),
            TextureColumn::Placeholder => x.use_placeholder.cmp(&y.use_placeholder),
            TextureColumn::BuiltSize => x.built_artifact_size_bytes.cmp(&y.built_artifact_size_bytes),
            TextureColumn::RefScenes => x.ref_scenes.len().cmp(&y.ref_scenes.len()),
        }
    }
}

impl FromStr for TextureColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "path" | "name" => Ok(TextureColumn::AssetPath),
            "memory" => Ok(TextureColumn::RuntimeMemory),
            "width" => Ok(TextureColumn::Width),
            "height" => Ok(TextureColumn::Height),
            "placeholder" => Ok(TextureColumn::Placeholder),
            "size" => Ok(TextureColumn::BuiltSize),
            "scenes" => Ok(TextureColumn::RefScenes),
            other => Err(format!("unknown texture column '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneColumn {
    AssetPath,
    BuiltSize,
}

impl Column<SceneItem> for SceneColumn {
    fn compare(&self, a: &SceneItem, b: &SceneItem) -> Ordering {
        match self {
            SceneColumn::AssetPath => natural_cmp(&a.name, &b.name),
            SceneColumn::BuiltSize => a
                .payload
                .built_artifact_size_bytes
                .cmp(&b.payload.built_artifact_size_bytes),
        }
    }
}

impl FromStr for SceneColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "path" | "name" => Ok(SceneColumn::AssetPath),
            "size" => Ok(SceneColumn::BuiltSize),
            other => Err(format!("unknown scene column '{}'", other)),
        }
    }
}
