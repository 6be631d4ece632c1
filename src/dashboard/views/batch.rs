//! Folder batch progress

use egui::RichText;

use super::{action_button, error_label, ViewAction};
use crate::dashboard::state::BatchViewState;
use crate::dashboard::theme::ThemeColors;

pub fn render_batch_view(ui: &mut egui::Ui, state: &BatchViewState) -> ViewAction {
    let mut action = ViewAction::None;

    ui.heading(RichText::new("Folder Batch").size(22.0).strong());
    ui.add_space(8.0);
    if let Some(folder) = &state.folder {
        ui.label(RichText::new(folder.display().to_string()).color(ThemeColors::TEXT_MUTED));
    }
    ui.add_space(12.0);

    ui.add(egui::ProgressBar::new(state.progress()).show_percentage());
    ui.add_space(6.0);
    ui.label(state.status_text());
    ui.add_space(12.0);

    if !state.failures.is_empty() {
        ui.label(RichText::new(format!("{} failed", state.failures.len())).color(ThemeColors::ACCENT_ERROR));
        egui::ScrollArea::vertical()
            .id_salt("batch_failures")
            .max_height(140.0)
            .show(ui, |ui| {
                for (name, error) in &state.failures {
                    ui.label(RichText::new(name).strong());
                    ui.label(RichText::new(error).size(12.0).color(ThemeColors::TEXT_SECONDARY));
                }
            });
        ui.add_space(12.0);
    }

    if let Some(error) = &state.error {
        error_label(ui, error);
        ui.add_space(8.0);
    }
    if let Some(saved) = &state.saved_path {
        ui.label(
            RichText::new(format!("Combined analysis saved to {}", saved.display()))
                .color(ThemeColors::ACCENT_SUCCESS),
        );
        ui.add_space(8.0);
    }

    ui.horizontal(|ui| {
        if state.running {
            if action_button(ui, "Stop", ThemeColors::ACCENT_ERROR, !state.stop_requested) {
                action = ViewAction::StopBatch;
            }
        } else {
            let can_save = !state.results.is_empty();
            if action_button(ui, "Save Combined Document", ThemeColors::ACCENT_SUCCESS, can_save) {
                action = ViewAction::SaveCombined;
            }
            ui.add_space(12.0);
            if action_button(ui, "Back", ThemeColors::BG_HOVER, true) {
                action = ViewAction::BackHome;
            }
        }
    });

    action
}
