//! Window theme and styling
//!
//! Dark theme shared by the analyzer window and the region selector.

use egui::{Color32, FontFamily, FontId, Rounding, Stroke, TextStyle, Visuals};

/// Dark color palette
pub struct ThemeColors;

impl ThemeColors {
    // Background colors
    pub const BG_DARK: Color32 = Color32::from_rgb(20, 22, 28);
    pub const BG_MEDIUM: Color32 = Color32::from_rgb(30, 33, 41);
    pub const BG_LIGHT: Color32 = Color32::from_rgb(42, 46, 56);
    pub const BG_HOVER: Color32 = Color32::from_rgb(54, 58, 70);

    // Accent colors
    pub const ACCENT_PRIMARY: Color32 = Color32::from_rgb(79, 140, 255);
    pub const ACCENT_SUCCESS: Color32 = Color32::from_rgb(46, 204, 113);
    pub const ACCENT_WARNING: Color32 = Color32::from_rgb(255, 193, 7);
    pub const ACCENT_ERROR: Color32 = Color32::from_rgb(231, 76, 60);

    // Text colors
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(236, 238, 244);
    pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(165, 170, 185);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(105, 110, 125);

    pub const BORDER: Color32 = Color32::from_rgb(55, 60, 74);
}

/// Apply the theme to egui
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();
    let mut visuals = Visuals::dark();

    visuals.window_fill = ThemeColors::BG_MEDIUM;
    visuals.panel_fill = ThemeColors::BG_DARK;
    visuals.faint_bg_color = ThemeColors::BG_LIGHT;
    visuals.extreme_bg_color = ThemeColors::BG_DARK;

    let rounding = Rounding::same(6.0);
    for (widget, fill, text) in [
        (&mut visuals.widgets.noninteractive, ThemeColors::BG_MEDIUM, ThemeColors::TEXT_SECONDARY),
        (&mut visuals.widgets.inactive, ThemeColors::BG_LIGHT, ThemeColors::TEXT_PRIMARY),
        (&mut visuals.widgets.hovered, ThemeColors::BG_HOVER, ThemeColors::TEXT_PRIMARY),
        (&mut visuals.widgets.active, ThemeColors::ACCENT_PRIMARY, ThemeColors::TEXT_PRIMARY),
        (&mut visuals.widgets.open, ThemeColors::BG_HOVER, ThemeColors::TEXT_PRIMARY),
    ] {
        widget.bg_fill = fill;
        widget.fg_stroke = Stroke::new(1.0, text);
        widget.rounding = rounding;
    }

    visuals.selection.bg_fill = color_with_alpha(ThemeColors::ACCENT_PRIMARY, 77);
    visuals.selection.stroke = Stroke::new(1.0, ThemeColors::ACCENT_PRIMARY);
    visuals.hyperlink_color = ThemeColors::ACCENT_PRIMARY;

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, ThemeColors::BORDER);

    style.visuals = visuals;
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);

    style.text_styles = [
        (TextStyle::Small, FontId::new(13.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
        (TextStyle::Button, FontId::new(15.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(22.0, FontFamily::Proportional)),
    ]
    .into();

    ctx.set_style(style);
}

/// Same color with a different alpha
pub fn color_with_alpha(color: Color32, alpha: u8) -> Color32 {
    Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_with_alpha() {
        let c = color_with_alpha(Color32::from_rgb(10, 20, 30), 255);
        assert_eq!(c, Color32::from_rgb(10, 20, 30));
        assert_eq!(color_with_alpha(ThemeColors::ACCENT_ERROR, 0).a(), 0);
    }
}
