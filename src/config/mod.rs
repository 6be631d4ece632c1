//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::imaging::PixelRect;

/// Environment variable that overrides the configured API key
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General settings
    pub general: GeneralConfig,
    /// OCR engine settings
    pub ocr: OcrSettings,
    /// Batch cropper settings
    pub cropper: CropperSettings,
    /// Screenshot sorter settings
    pub sorter: SorterSettings,
    /// Vision API analyzer settings
    pub analyzer: AnalyzerSettings,
}

/// General application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Folder chosen in the last folder dialog
    pub last_folder: Option<PathBuf>,
    /// File chosen in the last file dialog
    pub last_file: Option<PathBuf>,
}

impl GeneralConfig {
    /// Directory to open dialogs in: the last folder if it still exists, else home
    pub fn initial_dir(&self) -> PathBuf {
        self.last_folder
            .as_ref()
            .filter(|p| p.is_dir())
            .cloned()
            .or_else(|| directories::UserDirs::new().map(|d| d.home_dir().to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Tesseract settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language code
    pub language: String,
    /// Page segmentation mode for page-number regions
    pub psm: i32,
    /// DPI hint passed to tesseract
    pub dpi: i32,
    /// Characters tesseract may emit
    pub whitelist: String,
    /// Image preprocessing before recognition
    pub preprocessing: OcrPreprocessing,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            psm: 6,
            dpi: 300,
            whitelist: "0123456789".to_string(),
            preprocessing: OcrPreprocessing::default(),
        }
    }
}

/// OCR preprocessing filters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrPreprocessing {
    /// Master switch
    pub enabled: bool,
    /// Contrast factor around mid-gray (1.0 = unchanged)
    pub contrast: f32,
    /// Upscale factor (1 = unchanged). Regions smaller than
    /// `min_dimension` are upscaled automatically.
    pub scale: u32,
    /// Smallest side, in pixels, below which regions get upscaled
    pub min_dimension: u32,
    /// Binarise with Otsu's threshold
    pub threshold: bool,
    /// Invert after binarisation (light text on dark background)
    pub invert: bool,
}

impl Default for OcrPreprocessing {
    fn default() -> Self {
        Self {
            enabled: true,
            contrast: 1.0,
            scale: 1,
            min_dimension: 40,
            threshold: true,
            invert: false,
        }
    }
}

/// Batch cropper settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperSettings {
    /// Output directory created inside the processed folder
    pub output_dir_name: String,
    /// Label used when no page number could be read
    pub fallback_label: String,
    /// Both sides of a drawn rectangle must exceed this many image pixels
    pub min_selection: u32,
    /// Write the last page-number region to the data directory
    pub save_debug_roi: bool,
}

impl Default for CropperSettings {
    fn default() -> Self {
        Self {
            output_dir_name: "DATA".to_string(),
            fallback_label: "unknown".to_string(),
            min_selection: 10,
            save_debug_roi: false,
        }
    }
}

/// Screenshot sorter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SorterSettings {
    /// Fixed region holding the counter
    pub region: Option<PixelRect>,
    /// Label used when no counter could be read
    pub fallback_label: String,
    /// Page segmentation mode for the counter (7 = single line)
    pub psm: i32,
}

impl Default for SorterSettings {
    fn default() -> Self {
        Self {
            region: None,
            fallback_label: "unknown".to_string(),
            psm: 7,
        }
    }
}

/// Vision API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// API key (overridden by `GEMINI_API_KEY`)
    pub api_key: String,
    /// Base URL of the generative language API
    pub endpoint: String,
    /// Model used to extract the question text
    pub extraction_model: String,
    /// Model used for the full analysis
    pub analysis_model: String,
    /// Sampling temperature for the analysis pass
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Pause between images in batch mode
    pub batch_delay_ms: u64,
    /// Text file whose contents are added to the analysis prompt as context
    pub context_file: Option<PathBuf>,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            extraction_model: "gemini-1.5-flash".to_string(),
            analysis_model: "gemini-1.5-pro".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
            batch_delay_ms: 2000,
            context_file: None,
        }
    }
}

impl AnalyzerSettings {
    /// API key from the environment, falling back to the configured one
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| Some(self.api_key.trim().to_string()).filter(|k| !k.is_empty()))
    }

    /// Contents of the context file, or an empty string when none is set
    pub fn load_context(&self) -> Result<String> {
        match &self.context_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file {}", path.display())),
            None => Ok(String::new()),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
