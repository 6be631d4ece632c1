//! Vision/OCR Layer
//!
//! Reads numeric labels (page numbers, counters) out of a fixed region of an
//! image. The OCR engine sits behind [`TextRecognizer`]; the default backend
//! is tesseract.

pub mod ocr;
pub mod ocr_preprocess;

pub use ocr::TesseractOcr;
pub use ocr_preprocess::preprocess;

use anyhow::Result;
use image::DynamicImage;
use std::path::Path;
use tracing::{debug, warn};

use crate::config::OcrPreprocessing;
use crate::imaging::{crop_region, PixelRect};
use crate::naming::digits_only;

/// Something that turns pixels into text
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<String>;
}

/// Outcome of reading a label from a region
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrLabel {
    /// Digits recognised in the region
    Digits(String),
    /// Nothing usable was recognised
    Fallback(String),
}

impl OcrLabel {
    /// Text used in file and directory names
    pub fn as_str(&self) -> &str {
        match self {
            OcrLabel::Digits(d) => d,
            OcrLabel::Fallback(f) => f,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, OcrLabel::Fallback(_))
    }
}

/// Reads digit labels from a region using a recognizer
pub struct LabelReader<'a> {
    recognizer: &'a dyn TextRecognizer,
    preprocessing: &'a OcrPreprocessing,
    fallback: &'a str,
}

impl<'a> LabelReader<'a> {
    pub fn new(
        recognizer: &'a dyn TextRecognizer,
        preprocessing: &'a OcrPreprocessing,
        fallback: &'a str,
    ) -> Self {
        Self {
            recognizer,
            preprocessing,
            fallback,
        }
    }

    /// Crop `rect`, preprocess, recognise and keep the digits.
    ///
    /// Never fails: recognition errors and empty results give the fallback label.
    pub fn read(&self, image: &DynamicImage, rect: PixelRect) -> OcrLabel {
        self.read_with_roi(image, rect).0
    }

    /// Like [`read`](Self::read), also returning the preprocessed region
    pub fn read_with_roi(
        &self,
        image: &DynamicImage,
        rect: PixelRect,
    ) -> (OcrLabel, Option<DynamicImage>) {
        let roi = crop_region(image, rect);
        if roi.width() == 0 || roi.height() == 0 {
            warn!("Label region {} is empty for this image", rect);
            return (self.fallback(), None);
        }

        let processed = DynamicImage::ImageLuma8(preprocess(&roi, self.preprocessing).image);
        let label = match self.recognizer.recognize(&processed) {
            Ok(text) => {
                let digits = digits_only(&text);
                if digits.is_empty() {
                    debug!("No digits in OCR output {:?}", text.trim());
                    self.fallback()
                } else {
                    OcrLabel::Digits(digits)
                }
            }
            Err(e) => {
                warn!("Error extracting label: {:#}", e);
                self.fallback()
            }
        };
        (label, Some(processed))
    }

    fn fallback(&self) -> OcrLabel {
        OcrLabel::Fallback(self.fallback.to_string())
    }
}

/// Write a preprocessed region for inspection; failures are only logged
pub fn save_debug_roi(roi: &DynamicImage, path: &Path) {
    if let Err(e) = roi.save(path) {
        warn!("Could not save debug region to {}: {}", path.display(), e);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixedText;
    use super::*;

    fn reader<'a>(rec: &'a FixedText, pp: &'a OcrPreprocessing) -> LabelReader<'a> {
        LabelReader::new(rec, pp, "unknown")
    }

    #[test]
    fn test_digits_are_extracted() {
        let rec = FixedText::new(" 4 2\n");
        let pp = OcrPreprocessing::default();
        let label = reader(&rec, &pp).read(&DynamicImage::new_rgb8(100, 100), PixelRect::new(0, 0, 50, 50));
        assert_eq!(label, OcrLabel::Digits("42".to_string()));
        assert_eq!(label.as_str(), "42");
    }

    #[test]
    fn test_no_digits_uses_fallback() {
        let rec = FixedText::new("Page ?");
        let pp = OcrPreprocessing::default();
        let label = reader(&rec, &pp).read(&DynamicImage::new_rgb8(100, 100), PixelRect::new(0, 0, 50, 50));
        assert!(label.is_fallback());
        assert_eq!(label.as_str(), "unknown");
        assert_eq!(rec.calls.get(), 1);
    }

    #[test]
    fn test_recognizer_error_uses_fallback() {
        let rec = FixedText::failing();
        let pp = OcrPreprocessing::default();
        let label = reader(&rec, &pp).read(&DynamicImage::new_rgb8(10, 10), PixelRect::new(0, 0, 5, 5));
        assert_eq!(label, OcrLabel::Fallback("unknown".to_string()));
    }

    #[test]
    fn test_region_outside_image_is_clamped() {
        let rec = FixedText::new("7");
        let pp = OcrPreprocessing::default();
        let (label, roi) = reader(&rec, &pp)
            .read_with_roi(&DynamicImage::new_rgb8(100, 100), PixelRect::new(500, 500, 50, 50));
        assert_eq!(label.as_str(), "7");
        assert!(roi.is_some());
    }
}
