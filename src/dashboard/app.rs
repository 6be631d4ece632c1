//! Analyzer window

use eframe::egui;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::analysis::document::{write_analysis_document, write_combined_document};
use crate::config::{AnalyzerSettings, AppConfig};
use crate::dashboard::state::{AnalyzerView, DashboardState, PendingAction};
use crate::dashboard::theme;
use crate::dashboard::views::{
    render_api_key_view, render_batch_view, render_home_view, render_single_view, ViewAction,
};
use crate::imaging::{self, IMAGE_EXTENSIONS};
use crate::naming::analysis_path;
use crate::shared::{AnalysisWorker, WorkerRequest};
use crate::storage;

pub const DEFAULT_COMBINED_NAME: &str = "Combined_Analysis.docx";

/// The analyzer application
pub struct AnalyzerApp {
    config: AppConfig,
    state: DashboardState,
    worker: Option<AnalysisWorker>,
    theme_applied: bool,
    /// Image to analyze as soon as the window opens
    initial_image: Option<PathBuf>,
    /// Context file for this session, overriding the configured one
    context_file: Option<PathBuf>,
}

impl AnalyzerApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            state: DashboardState::default(),
            worker: None,
            theme_applied: false,
            initial_image: None,
            context_file: None,
        }
    }

    pub fn with_initial_image(mut self, image: Option<PathBuf>) -> Self {
        self.initial_image = image;
        self
    }

    pub fn with_context_file(mut self, context_file: Option<PathBuf>) -> Self {
        self.context_file = context_file;
        self
    }

    fn worker_settings(&self) -> AnalyzerSettings {
        let mut settings = self.config.analyzer.clone();
        if let Some(path) = &self.context_file {
            settings.context_file = Some(path.clone());
        }
        settings
    }

    pub fn options() -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([900.0, 760.0])
                .with_min_inner_size([640.0, 480.0])
                .with_title("Gemini Question Analyzer"),
            ..Default::default()
        }
    }

    fn has_api_key(&self) -> bool {
        self.config.analyzer.resolved_api_key().is_some()
    }

    /// Start (or reuse) the worker; `None` means the key prompt was shown instead
    fn ensure_worker(&mut self, pending: PendingAction) -> Option<&AnalysisWorker> {
        if self.worker.is_none() {
            let Some(key) = self.config.analyzer.resolved_api_key() else {
                self.state.api_key.pending = Some(pending);
                self.state.current_view = AnalyzerView::ApiKey;
                return None;
            };
            match AnalysisWorker::spawn(self.worker_settings(), &key) {
                Ok(worker) => self.worker = Some(worker),
                Err(e) => {
                    error!("Could not start analysis worker: {:#}", e);
                    self.state.api_key.error = Some(format!("{:#}", e));
                    self.state.api_key.pending = Some(pending);
                    self.state.current_view = AnalyzerView::ApiKey;
                    return None;
                }
            }
        }
        self.worker.as_ref()
    }

    fn run_action(&mut self, action: PendingAction) {
        match action {
            PendingAction::SingleImage => self.process_single_image(),
            PendingAction::Image(path) => self.analyze_image(path),
            PendingAction::Folder => self.process_folder(),
        }
    }

    fn process_single_image(&mut self) {
        if self.ensure_worker(PendingAction::SingleImage).is_none() {
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .set_title("Select Question Image")
            .set_directory(self.config.general.initial_dir())
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return;
        };

        self.remember_selection(&path, path.parent().map(PathBuf::from));
        self.start_single(path);
    }

    /// Analyze an image chosen outside the file dialog
    fn analyze_image(&mut self, path: PathBuf) {
        if self.ensure_worker(PendingAction::Image(path.clone())).is_none() {
            return;
        }
        self.start_single(path);
    }

    fn start_single(&mut self, path: PathBuf) {
        info!("Analyzing {}", path.display());
        self.state.single.start(path.clone());
        self.state.current_view = AnalyzerView::Single;
        if let Some(worker) = &self.worker {
            worker.send(WorkerRequest::AnalyzeImage(path));
        }
    }

    fn process_folder(&mut self) {
        if self.ensure_worker(PendingAction::Folder).is_none() {
            return;
        }
        let Some(folder) = rfd::FileDialog::new()
            .set_title("Select Folder with Question Images")
            .set_directory(self.config.general.initial_dir())
            .pick_folder()
        else {
            return;
        };
        self.remember_selection(&folder, Some(folder.clone()));

        let images = match imaging::list_images(&folder) {
            Ok(images) => images,
            Err(e) => {
                error!("{:#}", e);
                self.state.batch.start(folder, 0);
                self.state.batch.running = false;
                self.state.batch.error = Some(format!("{:#}", e));
                self.state.current_view = AnalyzerView::Batch;
                return;
            }
        };

        self.state.batch.start(folder.clone(), images.len());
        self.state.current_view = AnalyzerView::Batch;
        if images.is_empty() {
            self.state.batch.running = false;
            self.state.batch.error = Some(format!("No image files found in {}", folder.display()));
            return;
        }

        info!("Analyzing {} images from {}", images.len(), folder.display());
        if let Some(worker) = &self.worker {
            worker.send(WorkerRequest::AnalyzeFolder(images));
        }
    }

    fn remember_selection(&mut self, file: &std::path::Path, folder: Option<PathBuf>) {
        if file.is_file() {
            self.config.general.last_file = Some(file.to_path_buf());
        }
        self.config.general.last_folder = folder;
        storage::persist_config(&self.config);
    }

    fn save_api_key(&mut self) {
        let key = self.state.api_key.input.trim().to_string();
        if key.is_empty() {
            self.state.api_key.error = Some("API key cannot be empty".to_string());
            return;
        }
        self.config.analyzer.api_key = key;
        storage::persist_config(&self.config);
        info!("API key saved");

        self.worker = None;
        self.state.api_key.input.clear();
        self.state.api_key.error = None;
        self.state.current_view = AnalyzerView::Home;
        if let Some(pending) = self.state.api_key.pending.take() {
            self.run_action(pending);
        }
    }

    fn save_single(&mut self) {
        let Some(result) = &self.state.single.result else {
            return;
        };
        let output = analysis_path(&result.image_path);
        let outcome = write_analysis_document(&result.image_path, &result.response.text, &output).map(|()| output);
        if let Err(e) = &outcome {
            error!("Failed to save analysis: {:#}", e);
        }
        self.state.single.record_save(outcome);
    }

    fn save_combined(&mut self) {
        let initial = self
            .state
            .batch
            .folder
            .clone()
            .unwrap_or_else(|| self.config.general.initial_dir());
        let Some(output) = rfd::FileDialog::new()
            .set_title("Save Combined Analysis As")
            .set_directory(initial)
            .set_file_name(DEFAULT_COMBINED_NAME)
            .add_filter("Word Document", &["docx"])
            .save_file()
        else {
            return;
        };

        match write_combined_document(&self.state.batch.results, &output) {
            Ok(()) => {
                self.state.batch.error = None;
                self.state.batch.saved_path = Some(output);
            }
            Err(e) => {
                error!("Failed to create combined document: {:#}", e);
                self.state.batch.error = Some(format!("Failed to create combined document: {:#}", e));
            }
        }
    }

    fn handle_action(&mut self, action: ViewAction) {
        match action {
            ViewAction::None => {}
            ViewAction::ProcessImage => self.process_single_image(),
            ViewAction::ProcessFolder => self.process_folder(),
            ViewAction::SaveApiKey => self.save_api_key(),
            ViewAction::CancelApiKey => {
                self.state.api_key = Default::default();
                self.state.current_view = AnalyzerView::Home;
            }
            ViewAction::SaveDocument => self.save_single(),
            ViewAction::Discard | ViewAction::BackHome => {
                self.state.single = Default::default();
                self.state.current_view = AnalyzerView::Home;
            }
            ViewAction::StopBatch => {
                if let Some(worker) = &self.worker {
                    worker.request_stop();
                }
                self.state.batch.stop_requested = true;
            }
            ViewAction::SaveCombined => self.save_combined(),
        }
    }

    fn drain_events(&mut self) {
        let Some(worker) = &self.worker else {
            return;
        };
        while let Some(event) = worker.try_recv() {
            self.state.apply_event(event);
        }
    }
}

impl eframe::App for AnalyzerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        if let Some(path) = self.initial_image.take() {
            self.analyze_image(path);
        }

        self.drain_events();
        if self.state.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let has_key = self.has_api_key();
        let mut action = ViewAction::None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(8.0);
            action = match self.state.current_view {
                AnalyzerView::Home => render_home_view(ui, &self.config.analyzer, has_key),
                AnalyzerView::ApiKey => render_api_key_view(ui, &mut self.state.api_key),
                AnalyzerView::Single => render_single_view(ui, &self.state.single),
                AnalyzerView::Batch => render_batch_view(ui, &self.state.batch),
            };
        });

        self.handle_action(action);
    }
}

/// Run the analyzer window until it is closed, optionally starting on `image`
pub fn run_dashboard(
    config: AppConfig,
    image: Option<PathBuf>,
    context_file: Option<PathBuf>,
) -> Result<(), eframe::Error> {
    let app = AnalyzerApp::new(config)
        .with_initial_image(image)
        .with_context_file(context_file);
    eframe::run_native(
        "Gemini Question Analyzer",
        AnalyzerApp::options(),
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(app))
        }),
    )
}
