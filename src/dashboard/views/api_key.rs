//! API key prompt

use egui::RichText;

use super::{action_button, error_label, ViewAction};
use crate::dashboard::state::ApiKeyViewState;
use crate::dashboard::theme::ThemeColors;

pub fn render_api_key_view(ui: &mut egui::Ui, state: &mut ApiKeyViewState) -> ViewAction {
    let mut action = ViewAction::None;

    ui.heading(RichText::new("API Key Required").size(22.0).strong());
    ui.add_space(8.0);
    ui.label(
        RichText::new("Enter your Gemini API key. It is saved to the configuration file.")
            .color(ThemeColors::TEXT_SECONDARY),
    );
    ui.add_space(16.0);

    let response = ui.add(
        egui::TextEdit::singleline(&mut state.input)
            .password(true)
            .hint_text("API key")
            .desired_width(420.0),
    );
    let submitted = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    if let Some(error) = &state.error {
        ui.add_space(8.0);
        error_label(ui, error);
    }

    ui.add_space(16.0);
    ui.horizontal(|ui| {
        if action_button(ui, "Save", ThemeColors::ACCENT_SUCCESS, true) || submitted {
            action = ViewAction::SaveApiKey;
        }
        ui.add_space(12.0);
        if action_button(ui, "Cancel", ThemeColors::BG_HOVER, true) {
            action = ViewAction::CancelApiKey;
        }
    });

    action
}
