//! Analyzer window state

use std::path::PathBuf;

use crate::analysis::AnalyzedImage;
use crate::shared::WorkerEvent;

/// Screen currently shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyzerView {
    #[default]
    Home,
    ApiKey,
    Single,
    Batch,
}

/// What to start once an API key has been entered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    SingleImage,
    /// An image given on the command line
    Image(PathBuf),
    Folder,
}

/// Overall window state
#[derive(Debug, Default)]
pub struct DashboardState {
    pub current_view: AnalyzerView,
    pub api_key: ApiKeyViewState,
    pub single: SingleViewState,
    pub batch: BatchViewState,
}

/// API key prompt
#[derive(Debug, Default)]
pub struct ApiKeyViewState {
    pub input: String,
    pub error: Option<String>,
    pub pending: Option<PendingAction>,
}

/// Single image: progress, then preview
#[derive(Debug, Default)]
pub struct SingleViewState {
    pub image_path: Option<PathBuf>,
    pub status: String,
    pub busy: bool,
    pub result: Option<AnalyzedImage>,
    pub error: Option<String>,
    pub saved_path: Option<PathBuf>,
    /// Last failed save; the result stays so the save can be retried
    pub save_error: Option<String>,
}

impl SingleViewState {
    pub fn start(&mut self, path: PathBuf) {
        *self = Self {
            image_path: Some(path),
            busy: true,
            ..Default::default()
        };
    }

    pub fn record_save(&mut self, outcome: anyhow::Result<PathBuf>) {
        match outcome {
            Ok(path) => {
                self.saved_path = Some(path);
                self.save_error = None;
            }
            Err(e) => self.save_error = Some(format!("Failed to save analysis: {:#}", e)),
        }
    }
}

/// Folder batch progress
#[derive(Debug, Default)]
pub struct BatchViewState {
    pub folder: Option<PathBuf>,
    pub total: usize,
    /// Zero-based index and file name of the image being processed
    pub current: Option<(usize, String)>,
    pub results: Vec<AnalyzedImage>,
    pub failures: Vec<(String, String)>,
    pub running: bool,
    pub stop_requested: bool,
    pub stopped: bool,
    pub saved_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl BatchViewState {
    pub fn start(&mut self, folder: PathBuf, total: usize) {
        *self = Self {
            folder: Some(folder),
            total,
            running: true,
            ..Default::default()
        };
    }

    /// Fraction of images finished, 0.0 to 1.0
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.results.len() + self.failures.len()) as f32 / self.total as f32
    }

    pub fn status_text(&self) -> String {
        match (&self.current, self.running) {
            (Some((index, name)), true) if self.stop_requested => {
                format!("Stopping after {} ({}/{})...", name, index + 1, self.total)
            }
            (Some((index, name)), true) => {
                format!("Processing {}/{}: {}", index + 1, self.total, name)
            }
            (None, true) => "Starting...".to_string(),
            (_, false) if self.stopped => format!(
                "Stopped. {} of {} images analyzed.",
                self.results.len(),
                self.total
            ),
            (_, false) => format!(
                "Done. {} of {} images analyzed.",
                self.results.len(),
                self.total
            ),
        }
    }
}

impl DashboardState {
    /// Fold a worker event into the view state
    pub fn apply_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Status(status) => self.single.status = status,
            WorkerEvent::ImageAnalyzed(result) => {
                self.single.busy = false;
                self.single.status = "Analysis complete".to_string();
                self.single.result = Some(result);
            }
            WorkerEvent::ImageFailed(error) => {
                self.single.busy = false;
                self.single.status.clear();
                self.single.error = Some(error);
            }
            WorkerEvent::BatchProgress { index, total, name } => {
                self.batch.total = total;
                self.batch.current = Some((index, name));
            }
            WorkerEvent::BatchItemDone(result) => self.batch.results.push(result),
            WorkerEvent::BatchItemFailed { name, error } => self.batch.failures.push((name, error)),
            WorkerEvent::BatchFinished { stopped } => {
                self.batch.running = false;
                self.batch.stopped = stopped;
            }
        }
    }

    /// Whether the worker is busy with something
    pub fn is_busy(&self) -> bool {
        self.single.busy || self.batch.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResponse;

    fn analyzed(name: &str) -> AnalyzedImage {
        AnalyzedImage {
            image_path: PathBuf::from(name),
            response: AnalysisResponse {
                question: "Q".to_string(),
                text: "A".to_string(),
            },
        }
    }

    #[test]
    fn test_single_flow() {
        let mut state = DashboardState::default();
        state.single.start(PathBuf::from("q.png"));
        assert!(state.is_busy());

        state.apply_event(WorkerEvent::Status("Step 1: Extracting Question...".to_string()));
        assert_eq!(state.single.status, "Step 1: Extracting Question...");

        state.apply_event(WorkerEvent::ImageAnalyzed(analyzed("q.png")));
        assert!(!state.is_busy());
        assert!(state.single.result.is_some());
    }

    #[test]
    fn test_single_failure() {
        let mut state = DashboardState::default();
        state.single.start(PathBuf::from("q.png"));
        state.apply_event(WorkerEvent::ImageFailed("boom".to_string()));
        assert!(!state.single.busy);
        assert_eq!(state.single.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_failed_save_keeps_result() {
        let mut single = SingleViewState::default();
        single.start(PathBuf::from("q.png"));
        single.busy = false;
        single.result = Some(analyzed("q.png"));

        single.record_save(Err(anyhow::anyhow!("file is locked")));
        assert!(single.result.is_some());
        assert!(single.error.is_none());
        assert!(single.saved_path.is_none());
        assert!(single.save_error.as_deref().unwrap().contains("file is locked"));

        single.record_save(Ok(PathBuf::from("q_analysis.docx")));
        assert!(single.save_error.is_none());
        assert_eq!(single.saved_path, Some(PathBuf::from("q_analysis.docx")));
    }

    #[test]
    fn test_batch_progress_and_status() {
        let mut state = DashboardState::default();
        state.batch.start(PathBuf::from("dir"), 4);
        assert_eq!(state.batch.status_text(), "Starting...");

        state.apply_event(WorkerEvent::BatchProgress {
            index: 0,
            total: 4,
            name: "a.png".to_string(),
        });
        assert_eq!(state.batch.status_text(), "Processing 1/4: a.png");

        state.apply_event(WorkerEvent::BatchItemDone(analyzed("a.png")));
        state.apply_event(WorkerEvent::BatchItemFailed {
            name: "b.png".to_string(),
            error: "bad".to_string(),
        });
        assert!((state.batch.progress() - 0.5).abs() < f32::EPSILON);

        state.apply_event(WorkerEvent::BatchFinished { stopped: true });
        assert!(!state.batch.running);
        assert_eq!(state.batch.status_text(), "Stopped. 1 of 4 images analyzed.");
    }

    #[test]
    fn test_restart_clears_previous_batch() {
        let mut batch = BatchViewState::default();
        batch.start(PathBuf::from("a"), 2);
        batch.results.push(analyzed("x.png"));
        batch.start(PathBuf::from("b"), 3);
        assert!(batch.results.is_empty());
        assert_eq!(batch.total, 3);
        assert_eq!(batch.progress(), 0.0);
    }
}
