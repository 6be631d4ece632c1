//! Single image progress and preview

use egui::RichText;

use super::{action_button, error_label, ViewAction};
use crate::dashboard::state::SingleViewState;
use crate::dashboard::theme::ThemeColors;

pub fn render_single_view(ui: &mut egui::Ui, state: &SingleViewState) -> ViewAction {
    let mut action = ViewAction::None;

    ui.heading(RichText::new("Single Image").size(22.0).strong());
    ui.add_space(8.0);

    if let Some(path) = &state.image_path {
        ui.label(RichText::new(path.display().to_string()).color(ThemeColors::TEXT_MUTED));
        ui.add_space(8.0);
        ui.add(
            egui::Image::from_uri(format!("file://{}", path.display()))
                .max_height(220.0)
                .max_width(ui.available_width())
                .rounding(4.0),
        );
        ui.add_space(12.0);
    }

    if state.busy {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(&state.status);
        });
        return action;
    }

    if let Some(error) = &state.error {
        error_label(ui, error);
        ui.add_space(12.0);
        if action_button(ui, "Back", ThemeColors::BG_HOVER, true) {
            action = ViewAction::BackHome;
        }
        return action;
    }

    let Some(result) = &state.result else {
        return action;
    };

    ui.label(RichText::new("Gemini Analysis").size(16.0).strong());
    ui.add_space(4.0);
    let footer = 90.0;
    egui::ScrollArea::vertical()
        .max_height((ui.available_height() - footer).max(120.0))
        .show(ui, |ui| {
            ui.add(
                egui::TextEdit::multiline(&mut result.response.text.as_str())
                    .desired_width(f32::INFINITY)
                    .font(egui::TextStyle::Monospace),
            );
        });

    ui.add_space(12.0);
    if let Some(saved) = &state.saved_path {
        ui.label(
            RichText::new(format!("Analysis saved to {}", saved.display())).color(ThemeColors::ACCENT_SUCCESS),
        );
        ui.add_space(8.0);
    }
    if let Some(error) = &state.save_error {
        error_label(ui, error);
        ui.add_space(8.0);
    }

    ui.horizontal(|ui| {
        if action_button(ui, "Save to Word Document", ThemeColors::ACCENT_SUCCESS, state.saved_path.is_none()) {
            action = ViewAction::SaveDocument;
        }
        ui.add_space(12.0);
        let label = if state.saved_path.is_some() { "Done" } else { "Cancel" };
        if action_button(ui, label, ThemeColors::BG_HOVER, true) {
            action = ViewAction::Discard;
        }
    });

    action
}
