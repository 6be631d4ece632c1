//! Application Coordinator
//!
//! Wires configuration, dialogs, OCR and the vision client into the three
//! tools: batch cropper, screenshot sorter and question analyzer.

use anyhow::{anyhow, bail, Context, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use tracing::{error, info, warn};

use crate::analysis::document::{write_analysis_document, write_combined_document};
use crate::analysis::{self, Analyzer, BatchUpdate, GeminiClient};
use crate::config::{AppConfig, SorterSettings};
use crate::cropper::{BatchCropper, CropJob};
use crate::imaging::{self, PixelRect};
use crate::naming::analysis_path;
use crate::selector;
use crate::sorter::ScreenshotSorter;
use crate::storage::{self, presets};
use crate::vision::TesseractOcr;

const CROP_STEP: &str = "Select Crop Region";
const PAGE_STEP: &str = "Select Page Number Region";
const DEBUG_ROI_FILE: &str = "page_number_roi.png";

/// Options for the batch cropper
#[derive(Debug, Default)]
pub struct CropOptions {
    pub folder: Option<PathBuf>,
    pub preset: Option<String>,
    pub crop: Option<PixelRect>,
    pub page: Option<PixelRect>,
    pub save_preset: Option<String>,
    pub debug_roi: bool,
}

/// Options for the screenshot sorter
#[derive(Debug)]
pub struct SortOptions {
    pub folder: PathBuf,
    pub region: Option<PixelRect>,
    pub dry_run: bool,
}

/// How the analyzer runs
#[derive(Debug, PartialEq)]
pub enum AnalyzeMode {
    /// Open the analyzer window, starting on `image` when given
    Gui { image: Option<PathBuf> },
    /// One image, no window
    Single { image: PathBuf, output: Option<PathBuf> },
    /// Every image in a folder into one document, no window
    Batch { folder: PathBuf, output: PathBuf },
}

/// Crop and rename every image in a folder.
///
/// Fatal errors are also shown in a message box when the folder was picked
/// interactively.
pub fn run_crop(config: &mut AppConfig, options: CropOptions) -> Result<()> {
    let interactive = options.folder.is_none();
    let result = crop_folder(config, options);
    if let Err(e) = &result {
        if interactive {
            let _ = rfd::MessageDialog::new()
                .set_level(rfd::MessageLevel::Error)
                .set_title("Error")
                .set_description(format!("{:#}", e))
                .show();
        }
    }
    result
}

fn crop_folder(config: &mut AppConfig, options: CropOptions) -> Result<()> {
    let folder = match options.folder {
        Some(folder) => folder,
        None => match rfd::FileDialog::new()
            .set_title("Select Folder Containing Images")
            .set_directory(config.general.initial_dir())
            .pick_folder()
        {
            Some(folder) => folder,
            None => {
                info!("No folder selected");
                return Ok(());
            }
        },
    };
    if !folder.is_dir() {
        bail!("{} is not a folder", folder.display());
    }
    config.general.last_folder = Some(folder.clone());
    storage::persist_config(config);

    let reference = imaging::oldest_image(&folder)?;
    info!("Using {} as reference image", reference.display());

    let presets_path = presets::presets_path()?;
    let mut saved = presets::load_presets(&presets_path)?;
    let job = match job_from_flags(&saved, options.preset.as_deref(), options.crop, options.page)? {
        Some(job) => job,
        None => {
            let image = imaging::load_image(&reference)?;
            match selector::select_regions(&image, &[CROP_STEP, PAGE_STEP], config.cropper.min_selection)? {
                Some(rects) if rects.len() == 2 => CropJob {
                    crop: rects[0],
                    page: rects[1],
                },
                _ => {
                    info!("Selection cancelled, nothing processed");
                    return Ok(());
                }
            }
        }
    };
    info!("Crop region {}, page number region {}", job.crop, job.page);

    if let Some(name) = options.save_preset {
        presets::upsert_preset(
            &mut saved,
            presets::RegionPreset {
                name: name.clone(),
                crop: job.crop,
                page: job.page,
            },
        );
        presets::save_presets(&saved, &presets_path)?;
        info!("Saved preset '{}'", name);
    }

    if let Err(e) = TesseractOcr::version() {
        warn!("{:#}; page numbers will fall back to '{}'", e, config.cropper.fallback_label);
    }
    let ocr = TesseractOcr::from_settings(&config.ocr);
    let mut cropper = BatchCropper::new(&config.cropper, &config.ocr.preprocessing, &ocr);
    if options.debug_roi || config.cropper.save_debug_roi {
        cropper = cropper.with_debug_roi(storage::get_data_dir()?.join(DEBUG_ROI_FILE));
    }

    let summary = cropper.run(&folder, &job)?;
    println!(
        "Processed {} images ({} failed). Output: {}",
        summary.processed.len(),
        summary.failed.len(),
        summary.output_dir.display()
    );
    Ok(())
}

/// Regions given on the command line, if any
fn job_from_flags(
    saved: &[presets::RegionPreset],
    preset: Option<&str>,
    crop: Option<PixelRect>,
    page: Option<PixelRect>,
) -> Result<Option<CropJob>> {
    if let Some(name) = preset {
        let preset = presets::find_preset(saved, name)
            .ok_or_else(|| anyhow!("Unknown preset '{}'", name))?;
        return Ok(Some(CropJob {
            crop: crop.unwrap_or(preset.crop),
            page: page.unwrap_or(preset.page),
        }));
    }
    match (crop, page) {
        (Some(crop), Some(page)) => Ok(Some(CropJob { crop, page })),
        (None, None) => Ok(None),
        _ => bail!("--crop and --page must be given together"),
    }
}

/// Sort screenshots into counter-named folders
pub fn run_sort(config: &AppConfig, options: SortOptions) -> Result<()> {
    if !options.folder.is_dir() {
        bail!("{} is not a folder", options.folder.display());
    }
    let region = sort_region(options.region, &config.sorter)?;

    let ocr = TesseractOcr::from_settings(&config.ocr).with_psm(config.sorter.psm);
    let summary = ScreenshotSorter::new(
        region,
        &config.sorter.fallback_label,
        &config.ocr.preprocessing,
        &ocr,
    )
    .dry_run(options.dry_run)
    .run(&options.folder)?;

    let verb = if options.dry_run { "Would move" } else { "Moved" };
    println!("{} {} files ({} failed)", verb, summary.moved.len(), summary.failed.len());
    Ok(())
}

fn sort_region(flag: Option<PixelRect>, settings: &SorterSettings) -> Result<PixelRect> {
    flag.or(settings.region).ok_or_else(|| {
        anyhow!("No counter region configured: pass --region x,y,w,h or set sorter.region in the config file")
    })
}

/// Analyze question images. `context_file` overrides `analyzer.context_file`
/// for this run only.
pub fn run_analyze(mut config: AppConfig, mode: AnalyzeMode, context_file: Option<PathBuf>) -> Result<()> {
    match mode {
        AnalyzeMode::Gui { image } => crate::dashboard::run_dashboard(config, image, context_file)
            .map_err(|e| anyhow!("Analyzer window failed: {}", e)),
        AnalyzeMode::Single { image, output } => {
            if context_file.is_some() {
                config.analyzer.context_file = context_file;
            }
            analyze_single(&config, &image, output)
        }
        AnalyzeMode::Batch { folder, output } => {
            if context_file.is_some() {
                config.analyzer.context_file = context_file;
            }
            analyze_folder(&config, &folder, &output)
        }
    }
}

fn client(config: &AppConfig) -> Result<GeminiClient> {
    let key = config.analyzer.resolved_api_key().unwrap_or_default();
    Ok(GeminiClient::new(&config.analyzer, key)?)
}

fn analyze_single(config: &AppConfig, image: &Path, output: Option<PathBuf>) -> Result<()> {
    let context = config.analyzer.load_context()?;
    let client = client(config)?;
    let analyzer = Analyzer::new(&client, &config.analyzer);
    let runtime = analysis::runtime()?;

    let result = runtime.block_on(analyzer.analyze(image, &context))?;
    let output = output.unwrap_or_else(|| analysis_path(image));
    write_analysis_document(image, &result.response.text, &output)?;
    println!("Analysis saved to {}", output.display());
    Ok(())
}

fn analyze_folder(config: &AppConfig, folder: &Path, output: &Path) -> Result<()> {
    let images = imaging::list_images(folder)?;
    if images.is_empty() {
        bail!("No image files found in {}", folder.display());
    }

    let context = config.analyzer.load_context()?;
    let client = client(config)?;
    let analyzer = Analyzer::new(&client, &config.analyzer);
    let runtime = analysis::runtime()?;
    let stop = AtomicBool::new(false);

    let outcome = runtime.block_on(analyzer.analyze_batch(&images, &context, &stop, |update| {
        if let BatchUpdate::Failed { path, error } = update {
            error!("Skipping {}: {}", path.display(), error);
        }
    }));

    if outcome.results.is_empty() {
        bail!("No images were analyzed successfully");
    }
    write_combined_document(&outcome.results, output)
        .context("Failed to create combined document")?;
    println!(
        "Combined analysis of {} images ({} failed) saved to {}",
        outcome.results.len(),
        outcome.failed.len(),
        output.display()
    );
    Ok(())
}

/// Print saved region presets
pub fn list_presets() -> Result<()> {
    let path = presets::presets_path()?;
    let saved = presets::load_presets(&path)?;
    if saved.is_empty() {
        println!("No presets saved in {}", path.display());
        return Ok(());
    }
    println!("Presets ({}):", path.display());
    for preset in &saved {
        println!("  {:<20} crop={} page={}", preset.name, preset.crop, preset.page);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use presets::RegionPreset;

    fn saved() -> Vec<RegionPreset> {
        vec![RegionPreset {
            name: "scan".to_string(),
            crop: PixelRect::new(1, 2, 300, 400),
            page: PixelRect::new(5, 6, 50, 20),
        }]
    }

    #[test]
    fn test_job_from_preset() {
        let job = job_from_flags(&saved(), Some("scan"), None, None).unwrap().unwrap();
        assert_eq!(job.crop, PixelRect::new(1, 2, 300, 400));
        assert_eq!(job.page, PixelRect::new(5, 6, 50, 20));
    }

    #[test]
    fn test_flag_overrides_preset_region() {
        let crop = PixelRect::new(0, 0, 100, 100);
        let job = job_from_flags(&saved(), Some("scan"), Some(crop), None).unwrap().unwrap();
        assert_eq!(job.crop, crop);
        assert_eq!(job.page, PixelRect::new(5, 6, 50, 20));
    }

    #[test]
    fn test_unknown_preset_is_error() {
        assert!(job_from_flags(&saved(), Some("nope"), None, None).is_err());
    }

    #[test]
    fn test_flags_need_both_regions() {
        let rect = PixelRect::new(0, 0, 20, 20);
        assert!(job_from_flags(&[], None, Some(rect), None).is_err());
        assert!(job_from_flags(&[], None, None, None).unwrap().is_none());
        assert!(job_from_flags(&[], None, Some(rect), Some(rect)).unwrap().is_some());
    }

    #[test]
    fn test_sort_region_resolution() {
        let mut settings = SorterSettings::default();
        assert!(sort_region(None, &settings).is_err());

        settings.region = Some(PixelRect::new(1, 1, 30, 30));
        assert_eq!(sort_region(None, &settings).unwrap(), PixelRect::new(1, 1, 30, 30));

        let flag = PixelRect::new(2, 2, 40, 40);
        assert_eq!(sort_region(Some(flag), &settings).unwrap(), flag);
    }

    #[test]
    fn test_headless_reads_context_before_calling_model() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("q.png");
        std::fs::write(&image, b"img").unwrap();

        let mode = AnalyzeMode::Single { image, output: None };
        let err = run_analyze(AppConfig::default(), mode, Some(dir.path().join("missing.txt"))).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read context file"));
    }

    #[test]
    fn test_sort_rejects_missing_folder() {
        let options = SortOptions {
            folder: PathBuf::from("/definitely/not/here"),
            region: Some(PixelRect::new(0, 0, 20, 20)),
            dry_run: true,
        };
        assert!(run_sort(&AppConfig::default(), options).is_err());
    }
}
