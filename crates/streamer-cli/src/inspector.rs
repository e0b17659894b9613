//! Texture statistics read from image headers.

use std::path::PathBuf;
use streamer_core::{AssetInspector, TextureStats};
use tracing::debug;

/// Bytes per pixel assumed for the uncompressed runtime footprint.
const BYTES_PER_PIXEL: u64 = 4;

/// Reads dimensions with `image` and estimates memory as RGBA32.
pub struct ImageInspector {
    root: PathBuf,
}

impl ImageInspector {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl AssetInspector for ImageInspector {
    fn inspect(&self, asset_name: &str) -> Option<TextureStats> {
        match image::image_dimensions(self.root.join(asset_name)) {
            Ok((width, height)) => Some(TextureStats {
                runtime_memory_bytes: u64::from(width) * u64::from(height) * BYTES_PER_PIXEL,
                width,
                height,
            }),
            Err(e) => {
                debug!("No dimensions for {}: {}", asset_name, e);
                None
            }
        }
    }
}
