//! Interactive region selection
//!
//! Opens one native window showing a reference image and asks the user for a
//! sequence of rectangles, one per step.

pub mod zone_selection;

pub use zone_selection::{ImageViewport, SelectionState, SelectorAction, SelectorKey};

use anyhow::{anyhow, Result};
use eframe::egui;
use egui::{Key, Sense};
use image::DynamicImage;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

use crate::dashboard::theme;
use crate::imaging::PixelRect;

/// Shared slot the window writes its answer into
type Outcome = Arc<Mutex<Option<Vec<PixelRect>>>>;

/// The selection window
pub struct RegionSelectorApp {
    image: egui::ColorImage,
    image_size: (u32, u32),
    texture: Option<egui::TextureHandle>,
    steps: Vec<String>,
    confirmed: Vec<(String, PixelRect)>,
    state: SelectionState,
    min_selection: u32,
    outcome: Outcome,
    theme_applied: bool,
}

impl RegionSelectorApp {
    fn new(image: &DynamicImage, steps: &[&str], min_selection: u32, outcome: Outcome) -> Self {
        let rgba = image.to_rgba8();
        let image_size = rgba.dimensions();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image_size.0 as usize, image_size.1 as usize],
            rgba.as_raw(),
        );
        Self {
            image: color_image,
            image_size,
            texture: None,
            steps: steps.iter().map(|s| s.to_string()).collect(),
            confirmed: Vec::new(),
            state: SelectionState::default(),
            min_selection,
            outcome,
            theme_applied: false,
        }
    }

    fn options(title: &str) -> eframe::NativeOptions {
        eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([1280.0, 860.0])
                .with_min_inner_size([400.0, 300.0])
                .with_title(title),
            ..Default::default()
        }
    }

    fn current_step(&self) -> Option<&str> {
        self.steps.get(self.confirmed.len()).map(String::as_str)
    }

    fn pressed_key(ctx: &egui::Context) -> Option<SelectorKey> {
        ctx.input(|i| {
            if i.key_pressed(Key::C) || i.key_pressed(Key::Enter) {
                Some(SelectorKey::Confirm)
            } else if i.key_pressed(Key::R) {
                Some(SelectorKey::Reset)
            } else if i.key_pressed(Key::Q) || i.key_pressed(Key::Escape) {
                Some(SelectorKey::Quit)
            } else {
                None
            }
        })
    }
}

impl eframe::App for RegionSelectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        let Some(step) = self.current_step().map(str::to_string) else {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            return;
        };

        if let Some(key) = Self::pressed_key(ctx) {
            match self.state.handle_key(key, self.min_selection) {
                SelectorAction::Confirmed(rect) => {
                    info!("{}: {}", step, rect);
                    self.confirmed.push((step.clone(), rect));
                    if self.confirmed.len() == self.steps.len() {
                        *self.outcome.lock() = Some(self.confirmed.iter().map(|(_, r)| *r).collect());
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    } else {
                        ctx.request_repaint();
                    }
                    return;
                }
                SelectorAction::Quit => {
                    info!("Selection cancelled");
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    return;
                }
                SelectorAction::None => {}
            }
        }

        let texture = self
            .texture
            .get_or_insert_with(|| {
                ctx.load_texture("reference_image", self.image.clone(), egui::TextureOptions::LINEAR)
            })
            .clone();

        egui::CentralPanel::default().show(ctx, |ui| {
            let viewport = ImageViewport::fit(ui.available_rect_before_wrap(), self.image_size);
            let response = ui.allocate_rect(viewport.screen_rect(), Sense::click_and_drag());
            ui.painter().image(
                texture.id(),
                viewport.screen_rect(),
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            let pointer = response.interact_pointer_pos();
            if response.drag_started() {
                if let Some(pos) = pointer {
                    self.state.drag_started(pos);
                }
            }
            if response.dragged() {
                if let Some(pos) = pointer {
                    self.state.dragged(pos, &viewport);
                }
            }
            if response.drag_stopped() {
                self.state.drag_stopped(&viewport);
            }

            let instructions = format!(
                "{} ({}/{}): drag a rectangle, C/Enter confirm, R reset, Q/Esc quit",
                step,
                self.confirmed.len() + 1,
                self.steps.len()
            );
            zone_selection::paint_selection(
                ui.painter(),
                &viewport,
                &self.state,
                &self.confirmed,
                &instructions,
            );
        });
    }
}

/// Ask for one rectangle per entry in `steps` on `image`.
///
/// Returns `None` when the user quits or closes the window before confirming
/// every step.
pub fn select_regions(
    image: &DynamicImage,
    steps: &[&str],
    min_selection: u32,
) -> Result<Option<Vec<PixelRect>>> {
    if steps.is_empty() {
        return Ok(Some(Vec::new()));
    }

    let outcome: Outcome = Arc::new(Mutex::new(None));
    let app = RegionSelectorApp::new(image, steps, min_selection, outcome.clone());
    let title = steps.join(" / ");

    eframe::run_native(
        &title,
        RegionSelectorApp::options(&title),
        Box::new(|_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow!("Selection window failed: {}", e))?;

    let result = outcome.lock().take();
    if result.is_none() {
        warn!("No regions selected");
    }
    Ok(result)
}
