//! Rectangle drawing on a displayed image
//!
//! Tracks the drag, draws the live rectangle with its size in image pixels,
//! and maps display coordinates back to image pixels.

use egui::{Color32, FontId, Pos2, Rect, Rounding, Stroke};

use crate::imaging::PixelRect;

/// How the image is placed on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageViewport {
    /// Top-left of the drawn image (screen points)
    pub origin: Pos2,
    /// Screen points per image pixel
    pub scale: f32,
    pub image_size: (u32, u32),
}

impl ImageViewport {
    /// Fit the image inside `available`, never enlarging it
    pub fn fit(available: Rect, image_size: (u32, u32)) -> Self {
        let (w, h) = (image_size.0.max(1) as f32, image_size.1.max(1) as f32);
        let scale = (available.width() / w).min(available.height() / h).clamp(0.01, 1.0);
        Self {
            origin: available.min,
            scale,
            image_size,
        }
    }

    /// Screen rectangle covered by the image
    pub fn screen_rect(&self) -> Rect {
        Rect::from_min_size(
            self.origin,
            egui::vec2(
                self.image_size.0 as f32 * self.scale,
                self.image_size.1 as f32 * self.scale,
            ),
        )
    }

    /// Screen position to image pixel, clamped to the image
    pub fn to_image(&self, pos: Pos2) -> (u32, u32) {
        let x = ((pos.x - self.origin.x) / self.scale).round();
        let y = ((pos.y - self.origin.y) / self.scale).round();
        (
            x.clamp(0.0, self.image_size.0 as f32) as u32,
            y.clamp(0.0, self.image_size.1 as f32) as u32,
        )
    }

    /// Image pixels spanned by a drag from `start` to `end`
    pub fn selection_to_pixels(&self, start: Pos2, end: Pos2) -> PixelRect {
        PixelRect::from_corners(self.to_image(start), self.to_image(end))
    }

    /// Image rectangle to screen coordinates
    pub fn pixels_to_screen(&self, rect: PixelRect) -> Rect {
        Rect::from_min_size(
            Pos2::new(
                self.origin.x + rect.x as f32 * self.scale,
                self.origin.y + rect.y as f32 * self.scale,
            ),
            egui::vec2(rect.width as f32 * self.scale, rect.height as f32 * self.scale),
        )
    }
}

/// Key commands understood by the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKey {
    Confirm,
    Reset,
    Quit,
}

/// What the window should do after input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorAction {
    None,
    Confirmed(PixelRect),
    Quit,
}

/// Drag state for one selection step
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// Drag start (screen points)
    pub start_point: Option<Pos2>,
    /// Drag end or current pointer (screen points)
    pub current_point: Option<Pos2>,
    /// Rectangle drawn so far, in image pixels
    pub selection: Option<PixelRect>,
    /// Feedback shown under the instructions
    pub message: Option<String>,
}

impl SelectionState {
    pub fn drag_started(&mut self, pos: Pos2) {
        self.start_point = Some(pos);
        self.current_point = Some(pos);
        self.message = None;
    }

    pub fn dragged(&mut self, pos: Pos2, viewport: &ImageViewport) {
        if let Some(start) = self.start_point {
            self.current_point = Some(pos);
            self.selection = Some(viewport.selection_to_pixels(start, pos));
        }
    }

    pub fn drag_stopped(&mut self, viewport: &ImageViewport) {
        if let (Some(start), Some(end)) = (self.start_point, self.current_point) {
            self.selection = Some(viewport.selection_to_pixels(start, end));
        }
        self.start_point = None;
        self.current_point = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply a key command; a confirmed rectangle must exceed `min_selection` on both sides
    pub fn handle_key(&mut self, key: SelectorKey, min_selection: u32) -> SelectorAction {
        match key {
            SelectorKey::Quit => SelectorAction::Quit,
            SelectorKey::Reset => {
                self.reset();
                SelectorAction::None
            }
            SelectorKey::Confirm => match self.selection {
                Some(rect) if rect.exceeds(min_selection) => {
                    self.reset();
                    SelectorAction::Confirmed(rect)
                }
                Some(_) => {
                    self.message = Some(format!(
                        "Selection too small, it must be larger than {0}x{0} pixels",
                        min_selection
                    ));
                    SelectorAction::None
                }
                None => {
                    self.message = Some("Draw a rectangle first".to_string());
                    SelectorAction::None
                }
            },
        }
    }
}

/// Draw the image overlay: confirmed regions, the live rectangle and instructions
pub fn paint_selection(
    painter: &egui::Painter,
    viewport: &ImageViewport,
    state: &SelectionState,
    confirmed: &[(String, PixelRect)],
    instructions: &str,
) {
    for (name, rect) in confirmed {
        let screen = viewport.pixels_to_screen(*rect);
        painter.rect_filled(screen, Rounding::same(2.0), Color32::from_rgba_unmultiplied(0, 150, 0, 40));
        painter.rect_stroke(screen, Rounding::same(2.0), Stroke::new(2.0, Color32::from_rgb(0, 200, 0)));
        painter.text(
            screen.left_top() + egui::vec2(4.0, -18.0),
            egui::Align2::LEFT_TOP,
            name,
            FontId::proportional(14.0),
            Color32::from_rgb(0, 255, 0),
        );
    }

    if let Some(rect) = state.selection {
        let screen = viewport.pixels_to_screen(rect);
        painter.rect_filled(screen, Rounding::same(2.0), Color32::from_rgba_unmultiplied(0, 100, 255, 60));
        painter.rect_stroke(screen, Rounding::same(2.0), Stroke::new(2.0, Color32::from_rgb(0, 150, 255)));
        painter.text(
            screen.center(),
            egui::Align2::CENTER_CENTER,
            format!("{} x {}", rect.width, rect.height),
            FontId::proportional(16.0),
            Color32::WHITE,
        );
    }

    let mut lines = vec![instructions.to_string()];
    if let Some(message) = &state.message {
        lines.push(message.clone());
    }
    let top = viewport.screen_rect().center_top() + egui::vec2(0.0, 20.0);
    for (i, line) in lines.iter().enumerate() {
        let pos = top + egui::vec2(0.0, i as f32 * 26.0);
        let galley = painter.layout_no_wrap(line.clone(), FontId::proportional(16.0), Color32::WHITE);
        painter.rect_filled(
            Rect::from_center_size(pos, galley.size() + egui::vec2(20.0, 8.0)),
            Rounding::same(4.0),
            Color32::from_rgba_unmultiplied(0, 0, 0, 200),
        );
        painter.text(pos, egui::Align2::CENTER_CENTER, line, FontId::proportional(16.0), Color32::WHITE);
    }
}
