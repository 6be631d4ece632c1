//! Home view - mode selection

use egui::RichText;

use super::{action_button, ViewAction};
use crate::config::AnalyzerSettings;
use crate::dashboard::components::{CardStatus, StatusCard};
use crate::dashboard::theme::ThemeColors;

pub fn render_home_view(ui: &mut egui::Ui, settings: &AnalyzerSettings, has_api_key: bool) -> ViewAction {
    let mut action = ViewAction::None;

    ui.heading(RichText::new("Question Analyzer").size(24.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new("Analyze question screenshots and save the results as Word documents")
            .size(14.0)
            .color(ThemeColors::TEXT_SECONDARY),
    );

    ui.add_space(24.0);

    ui.horizontal(|ui| {
        let (key_value, key_status) = if has_api_key {
            ("Configured", CardStatus::Ready)
        } else {
            ("Not set", CardStatus::Missing)
        };
        StatusCard::new("API Key", key_value, key_status).show(ui);
        ui.add_space(16.0);
        StatusCard::new("Question Model", &settings.extraction_model, CardStatus::Info).show(ui);
        ui.add_space(16.0);
        StatusCard::new("Analysis Model", &settings.analysis_model, CardStatus::Info).show(ui);
    });

    ui.add_space(32.0);

    ui.horizontal(|ui| {
        if action_button(ui, "Process Single Image", ThemeColors::ACCENT_PRIMARY, true) {
            action = ViewAction::ProcessImage;
        }
        ui.add_space(12.0);
        if action_button(ui, "Process Folder", ThemeColors::ACCENT_PRIMARY, true) {
            action = ViewAction::ProcessFolder;
        }
    });

    action
}
