//! OCR (Optical Character Recognition) module
//!
//! Uses the system `tesseract` binary through rusty-tesseract.

use anyhow::{Context, Result};
use image::DynamicImage;
use std::collections::HashMap;
use tracing::debug;

use super::TextRecognizer;
use crate::config::OcrSettings;

/// Tesseract engine configuration for one kind of region
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    language: String,
    psm: i32,
    dpi: i32,
    whitelist: Option<String>,
}

impl TesseractOcr {
    /// Engine configured from the OCR settings
    pub fn from_settings(settings: &OcrSettings) -> Self {
        Self {
            language: settings.language.clone(),
            psm: settings.psm,
            dpi: settings.dpi,
            whitelist: Some(settings.whitelist.clone()).filter(|w| !w.is_empty()),
        }
    }

    /// Override the page segmentation mode
    pub fn with_psm(mut self, psm: i32) -> Self {
        self.psm = psm;
        self
    }

    fn args(&self) -> rusty_tesseract::Args {
        let mut config_variables = HashMap::new();
        if let Some(ref whitelist) = self.whitelist {
            config_variables.insert("tessedit_char_whitelist".to_string(), whitelist.clone());
        }
        rusty_tesseract::Args {
            lang: self.language.clone(),
            config_variables,
            dpi: Some(self.dpi),
            psm: Some(self.psm),
            oem: Some(3),
        }
    }

    /// Installed tesseract version, or an error when the binary is missing
    pub fn version() -> Result<String> {
        rusty_tesseract::get_tesseract_version()
            .map_err(|e| anyhow::anyhow!("tesseract is not available: {}", e))
    }
}

impl TextRecognizer for TesseractOcr {
    fn recognize(&self, image: &DynamicImage) -> Result<String> {
        let tess_img = rusty_tesseract::Image::from_dynamic_image(image)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to create tesseract image")?;

        let text = rusty_tesseract::image_to_string(&tess_img, &self.args())
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Tesseract failed")?;

        debug!("Tesseract read {:?} (psm {})", text.trim(), self.psm);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_include_whitelist() {
        let ocr = TesseractOcr::from_settings(&OcrSettings::default());
        let args = ocr.args();
        assert_eq!(args.lang, "eng");
        assert_eq!(args.psm, Some(6));
        assert_eq!(
            args.config_variables.get("tessedit_char_whitelist").map(String::as_str),
            Some("0123456789")
        );
    }

    #[test]
    fn test_empty_whitelist_is_omitted() {
        let mut settings = OcrSettings::default();
        settings.whitelist.clear();
        let args = TesseractOcr::from_settings(&settings).with_psm(7).args();
        assert!(args.config_variables.is_empty());
        assert_eq!(args.psm, Some(7));
    }
}
