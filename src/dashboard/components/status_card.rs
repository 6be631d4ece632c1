//! Small card showing one setting and whether it is usable

use egui::{Color32, RichText, Rounding, Vec2};

use crate::dashboard::theme::ThemeColors;

pub struct StatusCard {
    pub title: String,
    pub value: String,
    pub status: CardStatus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CardStatus {
    Ready,
    Missing,
    Info,
}

impl CardStatus {
    pub fn color(&self) -> Color32 {
        match self {
            CardStatus::Ready => ThemeColors::ACCENT_SUCCESS,
            CardStatus::Missing => ThemeColors::ACCENT_WARNING,
            CardStatus::Info => ThemeColors::ACCENT_PRIMARY,
        }
    }
}

impl StatusCard {
    pub fn new(title: impl Into<String>, value: impl Into<String>, status: CardStatus) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
            status,
        }
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(ThemeColors::BG_MEDIUM)
            .rounding(Rounding::same(8.0))
            .inner_margin(14.0)
            .show(ui, |ui| {
                ui.set_min_width(170.0);
                ui.horizontal(|ui| {
                    let dot = ui.cursor().left_top() + Vec2::new(6.0, 10.0);
                    ui.painter().circle_filled(dot, 4.0, self.status.color());
                    ui.add_space(16.0);

                    ui.vertical(|ui| {
                        ui.label(RichText::new(&self.title).size(12.0).color(ThemeColors::TEXT_MUTED));
                        ui.add_space(2.0);
                        ui.label(
                            RichText::new(&self.value)
                                .size(16.0)
                                .color(ThemeColors::TEXT_PRIMARY)
                                .strong(),
                        );
                    });
                });
            });
    }
}
