//! Screenshot sorter
//!
//! Reads a counter from a fixed region of each screenshot and moves the file
//! into a directory named after that counter.

use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::OcrPreprocessing;
use crate::imaging::{self, PixelRect};
use crate::naming::sorted_destination;
use crate::vision::{LabelReader, TextRecognizer};

/// A planned or completed move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedFile {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub label: String,
}

/// Outcome of a sorting run
#[derive(Debug, Default)]
pub struct SortSummary {
    pub moved: Vec<SortedFile>,
    pub failed: Vec<(PathBuf, String)>,
}

pub struct ScreenshotSorter<'a> {
    region: PixelRect,
    fallback: &'a str,
    preprocessing: &'a OcrPreprocessing,
    recognizer: &'a dyn TextRecognizer,
    dry_run: bool,
}

impl<'a> ScreenshotSorter<'a> {
    pub fn new(
        region: PixelRect,
        fallback: &'a str,
        preprocessing: &'a OcrPreprocessing,
        recognizer: &'a dyn TextRecognizer,
    ) -> Self {
        Self {
            region,
            fallback,
            preprocessing,
            recognizer,
            dry_run: false,
        }
    }

    /// Only log the moves
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sort every image directly inside `folder`
    pub fn run(&self, folder: &Path) -> Result<SortSummary> {
        let images = imaging::list_images(folder)?;
        info!(
            "Sorting {} screenshots in {} by region {}",
            images.len(),
            folder.display(),
            self.region
        );

        let mut summary = SortSummary::default();
        for path in images {
            match self.sort_file(folder, &path) {
                Ok(sorted) => summary.moved.push(sorted),
                Err(e) => {
                    error!("Error sorting {}: {:#}", path.display(), e);
                    summary.failed.push((path, format!("{:#}", e)));
                }
            }
        }

        info!("Sorted {} files ({} failed)", summary.moved.len(), summary.failed.len());
        Ok(summary)
    }

    fn sort_file(&self, folder: &Path, path: &Path) -> Result<SortedFile> {
        let image = imaging::load_image(path)?;
        let reader = LabelReader::new(self.recognizer, self.preprocessing, self.fallback);
        let label = reader.read(&image, self.region);
        drop(image);

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Input path has no file name")?;
        let destination = sorted_destination(folder, &file_name, label.as_str());

        if self.dry_run {
            info!("Would move {} -> {}", path.display(), destination.display());
        } else {
            if let Some(parent) = destination.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            move_file(path, &destination)?;
            info!("Moved {} -> {}", file_name, destination.display());
        }

        Ok(SortedFile {
            source: path.to_path_buf(),
            destination,
            label: label.as_str().to_string(),
        })
    }
}

/// Move a file, copying across filesystems when a rename is not possible.
/// An existing destination is replaced.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    move_file_with(from, to, |from, to| std::fs::rename(from, to))
}

fn move_file_with(
    from: &Path,
    to: &Path,
    rename: impl FnOnce(&Path, &Path) -> io::Result<()>,
) -> Result<()> {
    if to.exists() {
        warn!("Replacing existing {}", to.display());
    }
    match rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Copying {} across filesystems", from.display());
            std::fs::copy(from, to)
                .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
            std::fs::remove_file(from)
                .with_context(|| format!("Failed to remove {}", from.display()))?;
            Ok(())
        }
        Err(e) => Err(e)
            .with_context(|| format!("Failed to move {} to {}", from.display(), to.display())),
    }
}
