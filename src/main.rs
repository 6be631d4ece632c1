//! PageToolKit - Batch page cropping, screenshot sorting and question analysis
//!
//! Crops scanned pages and names them after their OCR'd page number, sorts
//! screenshots into folders by an on-screen counter, and analyzes question
//! images with a hosted vision model into Word documents.

mod analysis;
mod app;
mod config;
mod cropper;
mod dashboard;
mod imaging;
mod naming;
mod selector;
mod shared;
mod sorter;
mod storage;
mod vision;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::app::{AnalyzeMode, CropOptions, SortOptions};
use crate::imaging::PixelRect;

/// PageToolKit - page cropping, screenshot sorting and question analysis
#[derive(Parser, Debug)]
#[command(name = "page-toolkit", version)]
#[command(about = "Batch image tools built around OCR and a vision model")]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crop every image in a folder and name it after its page number
    Crop {
        /// Folder of page images (opens a folder dialog when omitted)
        folder: Option<PathBuf>,
        /// Use a saved region preset
        #[arg(long)]
        preset: Option<String>,
        /// Crop region as x,y,w,h
        #[arg(long)]
        crop: Option<PixelRect>,
        /// Page number region as x,y,w,h
        #[arg(long)]
        page: Option<PixelRect>,
        /// Save the regions used under this preset name
        #[arg(long)]
        save_preset: Option<String>,
        /// Write the last preprocessed page number region to the data directory
        #[arg(long)]
        debug_roi: bool,
    },
    /// Move screenshots into folders named after an on-screen counter
    Sort {
        /// Folder of screenshots
        folder: PathBuf,
        /// Counter region as x,y,w,h (falls back to the config file)
        #[arg(long)]
        region: Option<PixelRect>,
        /// Only log the planned moves
        #[arg(long)]
        dry_run: bool,
    },
    /// Analyze question images with the vision model
    #[command(group(ArgGroup::new("windowless").args(["headless", "batch"]).multiple(true)))]
    Analyze {
        /// Image to analyze; the analyzer window opens on it unless --headless is given
        image: Option<PathBuf>,
        /// Analyze without opening a window
        #[arg(long, requires = "image")]
        headless: bool,
        /// Analyze every image in this folder into one document
        #[arg(long, conflicts_with = "image")]
        batch: Option<PathBuf>,
        /// Output document path (batch default: Combined_Analysis.docx)
        #[arg(long, requires = "windowless")]
        output: Option<PathBuf>,
        /// Text file added to the analysis prompt as context
        #[arg(long)]
        context_file: Option<PathBuf>,
    },
    /// List saved region presets
    Presets,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = storage::load_or_default_config();

    match args.command {
        Command::Crop {
            folder,
            preset,
            crop,
            page,
            save_preset,
            debug_roi,
        } => app::run_crop(
            &mut config,
            CropOptions {
                folder,
                preset,
                crop,
                page,
                save_preset,
                debug_roi,
            },
        )?,
        Command::Sort {
            folder,
            region,
            dry_run,
        } => app::run_sort(
            &config,
            SortOptions {
                folder,
                region,
                dry_run,
            },
        )?,
        Command::Analyze {
            image,
            headless,
            batch,
            output,
            context_file,
        } => app::run_analyze(config, analyze_mode(image, headless, batch, output), context_file)?,
        Command::Presets => app::list_presets()?,
    }

    Ok(())
}

fn analyze_mode(image: Option<PathBuf>, headless: bool, batch: Option<PathBuf>, output: Option<PathBuf>) -> AnalyzeMode {
    match (batch, image) {
        (Some(folder), _) => AnalyzeMode::Batch {
            folder,
            output: output.unwrap_or_else(|| PathBuf::from(dashboard::app::DEFAULT_COMBINED_NAME)),
        },
        (None, Some(image)) if headless => AnalyzeMode::Single { image, output },
        (None, image) => AnalyzeMode::Gui { image },
    }
}
