//! Image file helpers
//!
//! Folder listing, image loading/saving and pixel-space rectangles shared by
//! the cropper, the sorter and the analyzer.

pub mod region;

pub use region::{crop_region, PixelRect};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

/// Extensions treated as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "tif", "bmp"];

/// Check if a path has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// List image files directly inside `folder`, sorted by file name.
///
/// Subdirectories are never descended into, so output folders created by
/// earlier runs are not picked up again.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder)
        .with_context(|| format!("Failed to read folder {}", folder.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && is_supported_image(&path) {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} images in {}", images.len(), folder.display());
    Ok(images)
}

fn creation_time(path: &Path) -> Result<SystemTime> {
    let metadata = std::fs::metadata(path)?;
    Ok(metadata.created().or_else(|_| metadata.modified())?)
}

/// The image with the earliest creation time in `folder`
pub fn oldest_image(folder: &Path) -> Result<PathBuf> {
    let mut oldest: Option<(SystemTime, PathBuf)> = None;
    for path in list_images(folder)? {
        let time = creation_time(&path)?;
        if oldest.as_ref().map_or(true, |(t, _)| time < *t) {
            oldest = Some((time, path));
        }
    }
    oldest
        .map(|(_, path)| path)
        .ok_or_else(|| anyhow::anyhow!("No image files found in {}", folder.display()))
}

/// Decode an image file
pub fn load_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).with_context(|| format!("Error loading image: {}", path.display()))
}

/// Encode `image` to `path`, choosing the format from the extension
pub fn save_image(image: &DynamicImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .with_context(|| format!("Unsupported output format: {}", path.display()))?;

    // JPEG and BMP writers reject alpha channels
    let image = match format {
        ImageFormat::Jpeg | ImageFormat::Bmp if image.color().has_alpha() => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        _ => image.clone(),
    };

    image
        .save_with_format(path, format)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buf)
}

/// MIME type for an image path, defaulting to JPEG
pub fn mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "png" => "image/png",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}
