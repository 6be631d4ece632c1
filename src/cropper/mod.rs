//! Batch cropper
//!
//! Applies one crop rectangle to every image in a folder and names each
//! output after the page number read from a second rectangle.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::config::{CropperSettings, OcrPreprocessing};
use crate::imaging::{self, crop_region, PixelRect};
use crate::naming::cropped_file_name;
use crate::vision::{save_debug_roi, LabelReader, TextRecognizer};

/// The two regions applied to every image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropJob {
    /// Region kept in the output image
    pub crop: PixelRect,
    /// Region holding the page number
    pub page: PixelRect,
}

/// Per-file outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CroppedFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub label_found: bool,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct CropSummary {
    pub output_dir: PathBuf,
    pub processed: Vec<CroppedFile>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Runs a [`CropJob`] over a folder
pub struct BatchCropper<'a> {
    settings: &'a CropperSettings,
    preprocessing: &'a OcrPreprocessing,
    recognizer: &'a dyn TextRecognizer,
    debug_roi_path: Option<PathBuf>,
}

impl<'a> BatchCropper<'a> {
    pub fn new(
        settings: &'a CropperSettings,
        preprocessing: &'a OcrPreprocessing,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        Self {
            settings,
            preprocessing,
            recognizer,
            debug_roi_path: None,
        }
    }

    /// Dump the last page-number region to `path`
    pub fn with_debug_roi(mut self, path: PathBuf) -> Self {
        self.debug_roi_path = Some(path);
        self
    }

    /// Output directory for `folder`
    pub fn output_dir(&self, folder: &Path) -> PathBuf {
        folder.join(&self.settings.output_dir_name)
    }

    /// Crop and rename every image in `folder` into its output directory.
    ///
    /// Files that fail to load or save are reported in the summary; the
    /// batch always runs to the end.
    pub fn run(&self, folder: &Path, job: &CropJob) -> Result<CropSummary> {
        let output_dir = self.output_dir(folder);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let images = imaging::list_images(folder)?;
        info!("Processing {} images from {}", images.len(), folder.display());

        let mut summary = CropSummary {
            output_dir: output_dir.clone(),
            ..Default::default()
        };

        for path in images {
            match self.process_file(&path, &output_dir, job) {
                Ok(file) => {
                    info!(
                        "Processed: {} -> {}",
                        display_name(&file.source),
                        display_name(&file.output)
                    );
                    summary.processed.push(file);
                }
                Err(e) => {
                    error!("Error processing {}: {:#}", display_name(&path), e);
                    summary.failed.push((path, format!("{:#}", e)));
                }
            }
        }

        info!(
            "Processed {} images ({} failed); output in {}",
            summary.processed.len(),
            summary.failed.len(),
            output_dir.display()
        );
        Ok(summary)
    }

    fn process_file(&self, path: &Path, output_dir: &Path, job: &CropJob) -> Result<CroppedFile> {
        let image = imaging::load_image(path)?;

        let reader = LabelReader::new(self.recognizer, self.preprocessing, &self.settings.fallback_label);
        let (label, roi) = reader.read_with_roi(&image, job.page);
        if let (Some(debug_path), Some(roi)) = (&self.debug_roi_path, roi) {
            save_debug_roi(&roi, debug_path);
        }

        let cropped = crop_region(&image, job.crop);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Input path has no file name")?;
        let output = output_dir.join(cropped_file_name(&file_name, label.as_str()));
        imaging::save_image(&cropped, &output)?;

        Ok(CroppedFile {
            source: path.to_path_buf(),
            output,
            label_found: !label.is_fallback(),
        })
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
