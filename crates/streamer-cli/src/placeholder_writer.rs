//! Writes downscaled placeholder copies of textures.

use image::{GenericImageView, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};
use streamer_core::PlaceholderWriter;
use tracing::debug;

/// Downscales decodable images to `max_size` and re-encodes them in the
/// placeholder's format. Anything else is copied byte for byte.
pub struct ImagePlaceholderWriter {
    root: PathBuf,
    max_size: u32,
}

impl ImagePlaceholderWriter {
    pub fn new(root: PathBuf, max_size: u32) -> Self {
        Self { root, max_size }
    }

    fn downscale(&self, source: &Path, target: &Path) -> Result<(), String> {
        let format = ImageFormat::from_path(target).map_err(|e| e.to_string())?;
        let img = image::open(source).map_err(|e| e.to_string())?;
        let (width, height) = img.dimensions();
        let img = if width > self.max_size || height > self.max_size {
            img.thumbnail(self.max_size, self.max_size)
        } else {
            img
        };
        img.save_with_format(target, format).map_err(|e| e.to_string())
    }
}

impl PlaceholderWriter for ImagePlaceholderWriter {
    fn write_placeholder(&self, asset_name: &str, placeholder_path: &str) -> Result<(), String> {
        let source = self.root.join(asset_name);
        let target = self.root.join(placeholder_path);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        if let Err(reason) = self.downscale(&source, &target) {
            debug!("Copying {} unscaled: {}", asset_name, reason);
            fs::copy(&source, &target).map_err(|e| format!("{}: {}", source.display(), e))?;
        }
        Ok(())
    }
}
