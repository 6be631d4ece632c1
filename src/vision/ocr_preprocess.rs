//! Image preprocessing filters for OCR
//!
//! Small, low-contrast number regions read far better once they are
//! enlarged, grayscale and binarised.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage};
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use tracing::debug;

use crate::config::OcrPreprocessing;

/// Result of preprocessing
pub struct PreprocessResult {
    /// Processed single-channel image
    pub image: GrayImage,
    /// Upscale factor that was applied
    pub scale: u32,
}

/// Upscale factor for a region: the configured scale, raised to 2x-4x when
/// the smaller side is under `min_dimension`
pub fn effective_scale(width: u32, height: u32, settings: &OcrPreprocessing) -> u32 {
    let user_scale = settings.scale.max(1);
    let min_side = width.min(height);
    if min_side == 0 || min_side >= settings.min_dimension {
        return user_scale;
    }
    let auto = settings.min_dimension.div_ceil(min_side).clamp(2, 4);
    user_scale.max(auto)
}

/// Apply preprocessing filters according to `settings`
pub fn preprocess(image: &DynamicImage, settings: &OcrPreprocessing) -> PreprocessResult {
    if !settings.enabled {
        debug!("OCR preprocessing disabled");
        return PreprocessResult {
            image: image.to_luma8(),
            scale: 1,
        };
    }

    let scale = effective_scale(image.width(), image.height(), settings);
    debug!(
        "OCR preprocessing: scale={}, contrast={}, threshold={}, invert={}",
        scale, settings.contrast, settings.threshold, settings.invert
    );

    // Upscale before other filters for better quality
    let mut gray = if scale > 1 {
        image
            .resize_exact(image.width() * scale, image.height() * scale, FilterType::Lanczos3)
            .to_luma8()
    } else {
        image.to_luma8()
    };

    if (settings.contrast - 1.0).abs() > 0.01 {
        apply_contrast(&mut gray, settings.contrast);
    }

    if settings.threshold && gray.width() > 0 && gray.height() > 0 {
        let level = otsu_level(&gray);
        gray = threshold(&gray, level, ThresholdType::Binary);
    }

    // Invert last
    if settings.invert {
        imageops::invert(&mut gray);
    }

    PreprocessResult { image: gray, scale }
}

/// Stretch contrast around mid-gray. Factor > 1.0 increases contrast.
fn apply_contrast(image: &mut GrayImage, factor: f32) {
    for pixel in image.pixels_mut() {
        let val = pixel.0[0] as f32;
        pixel.0[0] = ((val - 128.0) * factor + 128.0).clamp(0.0, 255.0) as u8;
    }
}
