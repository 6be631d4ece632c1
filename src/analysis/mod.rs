//! Question analysis
//!
//! Sends a question image to a hosted multimodal model in two passes: a cheap
//! pass that only extracts the question text, then the full analysis with the
//! extracted question and optional context embedded in the prompt.

pub mod client;
pub mod document;
pub mod prompts;

pub use client::GeminiClient;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use crate::config::AnalyzerSettings;
use crate::imaging;

/// Errors from the vision model API
#[derive(Debug, Error)]
pub enum VisionApiError {
    #[error("no API key configured (set it in the config file or {})", crate::config::API_KEY_ENV)]
    MissingApiKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("API response contained no text")]
    EmptyResponse,
}

/// Image bytes as sent to the model
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

impl ImageInput {
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        Ok(Self {
            bytes,
            mime: imaging::mime_type(path),
        })
    }
}

/// One model call
#[derive(Debug, Clone, Copy)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub image: &'a ImageInput,
    pub temperature: Option<f32>,
}

/// A multimodal text generator
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest<'_>) -> Result<String, VisionApiError>;
}

/// Model output for one image
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResponse {
    /// Question text from the first pass, or the placeholder
    pub question: String,
    /// Markdown-ish analysis from the second pass
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedImage {
    pub image_path: PathBuf,
    pub response: AnalysisResponse,
}

/// Progress reported during a batch
#[derive(Debug, Clone)]
pub enum BatchUpdate {
    Processing {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    Completed(AnalyzedImage),
    Failed {
        path: PathBuf,
        error: String,
    },
}

/// Outcome of a batch
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub results: Vec<AnalyzedImage>,
    pub failed: Vec<(PathBuf, String)>,
    /// Set when a stop request ended the batch early
    pub stopped: bool,
}

/// Runs the two analysis passes against a [`VisionModel`]
pub struct Analyzer<'a> {
    model: &'a dyn VisionModel,
    settings: &'a AnalyzerSettings,
}

impl<'a> Analyzer<'a> {
    pub fn new(model: &'a dyn VisionModel, settings: &'a AnalyzerSettings) -> Self {
        Self { model, settings }
    }

    /// First pass: the question text, quotes stripped
    pub async fn extract_question(&self, image: &ImageInput) -> Result<String, VisionApiError> {
        let text = self
            .model
            .generate(GenerateRequest {
                model: &self.settings.extraction_model,
                prompt: prompts::EXTRACT_QUESTION,
                image,
                temperature: None,
            })
            .await?;
        Ok(prompts::clean_extracted_question(&text))
    }

    /// Second pass: the full analysis
    pub async fn analyze_with_context(
        &self,
        image: &ImageInput,
        question: &str,
        context: &str,
    ) -> Result<AnalysisResponse, VisionApiError> {
        let prompt = prompts::analysis_prompt(question, context);
        let text = self
            .model
            .generate(GenerateRequest {
                model: &self.settings.analysis_model,
                prompt: &prompt,
                image,
                temperature: Some(self.settings.temperature),
            })
            .await?;
        Ok(AnalysisResponse {
            question: question.to_string(),
            text,
        })
    }

    /// Both passes for one file. A failed first pass falls back to the
    /// placeholder question; a failed second pass is an error.
    pub async fn analyze(&self, path: &Path, context: &str) -> Result<AnalyzedImage> {
        let image = ImageInput::from_path(path)?;

        let question = match self.extract_question(&image).await {
            Ok(q) if !q.is_empty() => q,
            Ok(_) => {
                warn!("Empty question text for {}", path.display());
                prompts::MISSING_QUESTION.to_string()
            }
            Err(e) => {
                warn!("Question extraction failed for {}: {}", path.display(), e);
                prompts::MISSING_QUESTION.to_string()
            }
        };
        info!("Question: {}", question);

        let response = self
            .analyze_with_context(&image, &question, context)
            .await
            .with_context(|| format!("Analysis failed for {}", path.display()))?;

        Ok(AnalyzedImage {
            image_path: path.to_path_buf(),
            response,
        })
    }

    /// Analyze `paths` in order, waiting the configured delay between calls.
    /// `stop` is checked before every image.
    pub async fn analyze_batch(
        &self,
        paths: &[PathBuf],
        context: &str,
        stop: &AtomicBool,
        mut on_update: impl FnMut(BatchUpdate),
    ) -> BatchOutcome {
        let total = paths.len();
        let delay = Duration::from_millis(self.settings.batch_delay_ms);
        let mut outcome = BatchOutcome::default();

        for (index, path) in paths.iter().enumerate() {
            if stop.load(Ordering::Relaxed) {
                info!("Batch stopped after {} of {} images", index, total);
                outcome.stopped = true;
                break;
            }
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            info!("Processing {}/{}: {}", index + 1, total, path.display());
            on_update(BatchUpdate::Processing {
                index,
                total,
                path: path.clone(),
            });

            match self.analyze(path, context).await {
                Ok(result) => {
                    on_update(BatchUpdate::Completed(result.clone()));
                    outcome.results.push(result);
                }
                Err(e) => {
                    let message = format!("{:#}", e);
                    error!("Error processing {}: {}", path.display(), message);
                    on_update(BatchUpdate::Failed {
                        path: path.clone(),
                        error: message.clone(),
                    });
                    outcome.failed.push((path.clone(), message));
                }
            }
        }

        outcome
    }
}

/// Runtime for driving the async client from synchronous code
pub fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}


#[cfg(test)]
mod tests {
    use super::testing::FakeModel;
    use super::*;

    fn settings() -> AnalyzerSettings {
        AnalyzerSettings {
            batch_delay_ms: 0,
            ..AnalyzerSettings::default()
        }
    }

    fn write_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"img").unwrap();
        path
    }

    #[tokio::test]
    async fn test_two_passes_use_configured_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "q_p12.png");
        let model = FakeModel::new("\"What is TCP?\"", "# Question\nWhat is TCP?");
        let settings = settings();

        let result = Analyzer::new(&model, &settings).analyze(&path, "").await.unwrap();

        assert_eq!(result.response.question, "What is TCP?");
        assert_eq!(result.response.text, "# Question\nWhat is TCP?");
        let calls = model.calls.lock();
        assert_eq!(calls[0], (settings.extraction_model.clone(), None));
        assert_eq!(calls[1], (settings.analysis_model.clone(), Some(0.2)));
    }

    #[tokio::test]
    async fn test_context_reaches_analysis_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "q.png");
        let model = FakeModel::new("Q", "A");
        let settings = settings();

        Analyzer::new(&model, &settings)
            .analyze(&path, "Area 0 is the backbone")
            .await
            .unwrap();

        let prompts = model.prompts.lock();
        assert_eq!(prompts[0], prompts::EXTRACT_QUESTION);
        assert!(prompts[1].contains("Area 0 is the backbone"));
        assert!(!prompts[1].contains("No additional context"));
    }

    #[tokio::test]
    async fn test_failed_extraction_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "q.jpg");
        let mut model = FakeModel::new("", "analysis");
        model.question = None;
        let settings = settings();

        let result = Analyzer::new(&model, &settings).analyze(&path, "").await.unwrap();
        assert_eq!(result.response.question, prompts::MISSING_QUESTION);
        assert_eq!(result.response.text, "analysis");
    }

    #[tokio::test]
    async fn test_failed_analysis_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "q.jpg");
        let mut model = FakeModel::new("Q", "");
        model.analysis = None;
        let settings = settings();

        assert!(Analyzer::new(&model, &settings).analyze(&path, "").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_collects_failures_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(dir.path(), "a.png");
        let missing = dir.path().join("missing.png");
        let model = FakeModel::new("Q", "A");
        let settings = settings();
        let stop = AtomicBool::new(false);
        let mut updates = Vec::new();

        let outcome = Analyzer::new(&model, &settings)
            .analyze_batch(&[missing.clone(), good.clone()], "", &stop, |u| updates.push(u))
            .await;

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].image_path, good);
        assert_eq!(outcome.failed[0].0, missing);
        assert!(!outcome.stopped);
        assert_eq!(updates.len(), 4);
    }

    #[tokio::test]
    async fn test_batch_honours_stop() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.png");
        let b = write_file(dir.path(), "b.png");
        let model = FakeModel::new("Q", "A");
        let settings = settings();
        let stop = AtomicBool::new(false);

        let outcome = Analyzer::new(&model, &settings)
            .analyze_batch(&[a, b], "", &stop, |u| {
                if matches!(u, BatchUpdate::Completed(_)) {
                    stop.store(true, Ordering::Relaxed);
                }
            })
            .await;

        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.stopped);
    }
}
