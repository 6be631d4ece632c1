//! Message types between the analyzer window and its worker thread

use std::path::PathBuf;

use crate::analysis::AnalyzedImage;

/// Work sent from the window to the worker
#[derive(Debug, Clone)]
pub enum WorkerRequest {
    /// Run both passes on one image
    AnalyzeImage(PathBuf),
    /// Run both passes on each image in order
    AnalyzeFolder(Vec<PathBuf>),
    /// Exit the worker loop
    Shutdown,
}

/// Progress and results sent back to the window
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    /// Status line for the single-image flow
    Status(String),
    /// Single image finished
    ImageAnalyzed(AnalyzedImage),
    /// Single image failed
    ImageFailed(String),
    /// Batch moved on to another image
    BatchProgress {
        index: usize,
        total: usize,
        name: String,
    },
    /// One batch image finished
    BatchItemDone(AnalyzedImage),
    /// One batch image failed; the batch continues
    BatchItemFailed { name: String, error: String },
    /// Batch ended, either complete or stopped
    BatchFinished { stopped: bool },
}
