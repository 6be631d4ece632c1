//! Analyzer window views
//!
//! Views only draw and report which button was pressed; the app acts on it.

pub mod api_key;
pub mod batch;
pub mod home;
pub mod single;

pub use api_key::render_api_key_view;
pub use batch::render_batch_view;
pub use home::render_home_view;
pub use single::render_single_view;

use egui::RichText;

use crate::dashboard::theme::ThemeColors;

/// User request coming out of a view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
    None,
    ProcessImage,
    ProcessFolder,
    SaveApiKey,
    CancelApiKey,
    SaveDocument,
    Discard,
    StopBatch,
    SaveCombined,
    BackHome,
}

/// Filled button with a fixed minimum size
pub(crate) fn action_button(ui: &mut egui::Ui, text: &str, fill: egui::Color32, enabled: bool) -> bool {
    ui.add_enabled(
        enabled,
        egui::Button::new(RichText::new(text).color(egui::Color32::WHITE))
            .fill(fill)
            .min_size(egui::vec2(160.0, 36.0)),
    )
    .clicked()
}

pub(crate) fn error_label(ui: &mut egui::Ui, error: &str) {
    ui.label(RichText::new(error).color(ThemeColors::ACCENT_ERROR));
}
