//! Background worker running the analysis pipeline off the UI thread

use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

use super::messages::{WorkerEvent, WorkerRequest};
use crate::analysis::{self, Analyzer, BatchUpdate, GeminiClient, ImageInput, VisionModel};
use crate::config::AnalyzerSettings;

pub const STATUS_EXTRACTING: &str = "Step 1: Extracting Question...";
pub const STATUS_ANALYZING: &str = "Step 3: Analyzing with Context...";

/// Handle to the worker thread
pub struct AnalysisWorker {
    requests: Sender<WorkerRequest>,
    events: Receiver<WorkerEvent>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Start a worker talking to the hosted model
    pub fn spawn(settings: AnalyzerSettings, api_key: &str) -> Result<Self> {
        let client = GeminiClient::new(&settings, api_key)?;
        Self::spawn_with_model(Arc::new(client), settings)
    }

    pub fn spawn_with_model(model: Arc<dyn VisionModel>, settings: AnalyzerSettings) -> Result<Self> {
        let (request_tx, request_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let stop = Arc::new(AtomicBool::new(false));

        let worker_stop = stop.clone();
        let handle = std::thread::Builder::new()
            .name("analysis-worker".to_string())
            .spawn(move || run_worker(model, settings, request_rx, event_tx, worker_stop))
            .context("Failed to spawn analysis worker")?;

        Ok(Self {
            requests: request_tx,
            events: event_rx,
            stop,
            handle: Some(handle),
        })
    }

    pub fn send(&self, request: WorkerRequest) {
        if let WorkerRequest::AnalyzeFolder(_) = request {
            self.stop.store(false, Ordering::Relaxed);
        }
        if self.requests.send(request).is_err() {
            error!("Analysis worker is gone");
        }
    }

    /// Ask a running batch to stop before its next image
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Next pending event, if any
    pub fn try_recv(&self) -> Option<WorkerEvent> {
        match self.events.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    #[cfg(test)]
    fn recv_timeout(&self, timeout: std::time::Duration) -> Option<WorkerEvent> {
        self.events.recv_timeout(timeout).ok()
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.request_stop();
        let _ = self.requests.send(WorkerRequest::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run_worker(
    model: Arc<dyn VisionModel>,
    settings: AnalyzerSettings,
    requests: Receiver<WorkerRequest>,
    events: Sender<WorkerEvent>,
    stop: Arc<AtomicBool>,
) {
    let runtime = match analysis::runtime() {
        Ok(rt) => rt,
        Err(e) => {
            error!("{:#}", e);
            let _ = events.send(WorkerEvent::ImageFailed(format!("{:#}", e)));
            return;
        }
    };
    let analyzer = Analyzer::new(model.as_ref(), &settings);
    info!("Analysis worker started");

    while let Ok(request) = requests.recv() {
        match request {
            WorkerRequest::AnalyzeImage(path) => {
                let result = settings
                    .load_context()
                    .and_then(|context| runtime.block_on(analyze_single(&analyzer, &path, &context, &events)));
                let event = match result {
                    Ok(result) => WorkerEvent::ImageAnalyzed(result),
                    Err(e) => {
                        error!("Error analyzing {}: {:#}", path.display(), e);
                        WorkerEvent::ImageFailed(format!("{:#}", e))
                    }
                };
                let _ = events.send(event);
            }
            WorkerRequest::AnalyzeFolder(paths) => {
                let context = match settings.load_context() {
                    Ok(context) => context,
                    Err(e) => {
                        error!("{:#}", e);
                        let _ = events.send(WorkerEvent::BatchItemFailed {
                            name: "context file".to_string(),
                            error: format!("{:#}", e),
                        });
                        let _ = events.send(WorkerEvent::BatchFinished { stopped: false });
                        continue;
                    }
                };
                let outcome = runtime.block_on(analyzer.analyze_batch(&paths, &context, &stop, |update| {
                    let _ = events.send(batch_event(update));
                }));
                let _ = events.send(WorkerEvent::BatchFinished {
                    stopped: outcome.stopped,
                });
            }
            WorkerRequest::Shutdown => break,
        }
    }

    info!("Analysis worker stopped");
}

/// Single-image flow: unlike batch mode, a failed first pass is an error
async fn analyze_single(
    analyzer: &Analyzer<'_>,
    path: &Path,
    context: &str,
    events: &Sender<WorkerEvent>,
) -> Result<analysis::AnalyzedImage> {
    let image = ImageInput::from_path(path)?;

    let _ = events.send(WorkerEvent::Status(STATUS_EXTRACTING.to_string()));
    let question = analyzer
        .extract_question(&image)
        .await
        .context("Could not extract question text from the image")?;
    info!("Extracted question: {}", question);

    let _ = events.send(WorkerEvent::Status(STATUS_ANALYZING.to_string()));
    let response = analyzer.analyze_with_context(&image, &question, context).await?;

    Ok(analysis::AnalyzedImage {
        image_path: PathBuf::from(path),
        response,
    })
}

fn batch_event(update: BatchUpdate) -> WorkerEvent {
    match update {
        BatchUpdate::Processing { index, total, path } => WorkerEvent::BatchProgress {
            index,
            total,
            name: display_name(&path),
        },
        BatchUpdate::Completed(result) => WorkerEvent::BatchItemDone(result),
        BatchUpdate::Failed { path, error } => WorkerEvent::BatchItemFailed {
            name: display_name(&path),
            error,
        },
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::FakeModel;
    use std::time::Duration;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn settings() -> AnalyzerSettings {
        AnalyzerSettings {
            batch_delay_ms: 0,
            ..AnalyzerSettings::default()
        }
    }

    fn worker(model: FakeModel) -> AnalysisWorker {
        AnalysisWorker::spawn_with_model(Arc::new(model), settings()).unwrap()
    }

    #[test]
    fn test_single_image_reports_steps_then_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.png");
        std::fs::write(&path, b"img").unwrap();

        let worker = worker(FakeModel::new("Q?", "# Answer\nB"));
        worker.send(WorkerRequest::AnalyzeImage(path.clone()));

        let mut statuses = Vec::new();
        loop {
            match worker.recv_timeout(TIMEOUT).expect("worker event") {
                WorkerEvent::Status(s) => statuses.push(s),
                WorkerEvent::ImageAnalyzed(result) => {
                    assert_eq!(result.image_path, path);
                    assert_eq!(result.response.question, "Q?");
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(statuses, [STATUS_EXTRACTING, STATUS_ANALYZING]);
    }

    #[test]
    fn test_single_image_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.png");
        std::fs::write(&path, b"img").unwrap();

        let mut model = FakeModel::new("", "A");
        model.question = None;
        let worker = worker(model);
        worker.send(WorkerRequest::AnalyzeImage(path));

        loop {
            match worker.recv_timeout(TIMEOUT).expect("worker event") {
                WorkerEvent::Status(_) => continue,
                WorkerEvent::ImageFailed(msg) => {
                    assert!(msg.contains("Could not extract question text"));
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[test]
    fn test_batch_events() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a_p1.png");
        std::fs::write(&a, b"img").unwrap();
        let missing = dir.path().join("b_p2.png");

        let worker = worker(FakeModel::new("Q", "A"));
        worker.send(WorkerRequest::AnalyzeFolder(vec![a, missing]));

        let mut done = 0;
        let mut failed = Vec::new();
        loop {
            match worker.recv_timeout(TIMEOUT).expect("worker event") {
                WorkerEvent::BatchProgress { .. } => {}
                WorkerEvent::BatchItemDone(_) => done += 1,
                WorkerEvent::BatchItemFailed { name, .. } => failed.push(name),
                WorkerEvent::BatchFinished { stopped } => {
                    assert!(!stopped);
                    break;
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(done, 1);
        assert_eq!(failed, ["b_p2.png"]);
    }

    #[test]
    fn test_context_file_is_sent_with_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q.png");
        std::fs::write(&path, b"img").unwrap();
        let context_file = dir.path().join("notes.txt");
        std::fs::write(&context_file, "LSA type 5 is external").unwrap();

        let model = Arc::new(FakeModel::new("Q", "A"));
        let settings = AnalyzerSettings {
            context_file: Some(context_file),
            ..settings()
        };
        let worker = AnalysisWorker::spawn_with_model(model.clone(), settings).unwrap();
        worker.send(WorkerRequest::AnalyzeImage(path));

        loop {
            match worker.recv_timeout(TIMEOUT).expect("worker event") {
                WorkerEvent::Status(_) => continue,
                WorkerEvent::ImageAnalyzed(_) => break,
                other => panic!("unexpected event {:?}", other),
            }
        }
        let prompts = model.prompts.lock();
        assert!(prompts[1].contains("LSA type 5 is external"));
    }

    #[test]
    fn test_missing_context_file_fails_batch() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.png");
        std::fs::write(&a, b"img").unwrap();

        let model = Arc::new(FakeModel::new("Q", "A"));
        let settings = AnalyzerSettings {
            context_file: Some(dir.path().join("missing.txt")),
            ..settings()
        };
        let worker = AnalysisWorker::spawn_with_model(model.clone(), settings).unwrap();
        worker.send(WorkerRequest::AnalyzeFolder(vec![a]));

        match worker.recv_timeout(TIMEOUT).expect("worker event") {
            WorkerEvent::BatchItemFailed { error, .. } => assert!(error.contains("missing.txt")),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(
            worker.recv_timeout(TIMEOUT),
            Some(WorkerEvent::BatchFinished { stopped: false })
        ));
        assert!(model.prompts.lock().is_empty());
    }
}
