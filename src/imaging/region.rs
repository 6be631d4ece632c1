//! Rectangles in image pixel space

use image::{DynamicImage, GenericImageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Axis-aligned rectangle in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Error parsing a `x,y,w,h` rectangle
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionParseError {
    #[error("expected 4 comma-separated values (x,y,w,h), got {0}")]
    WrongArity(usize),
    #[error("invalid number '{0}' in region")]
    InvalidNumber(String),
    #[error("region must have a non-zero width and height")]
    Empty,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanned by two corner points, in any order
    pub fn from_corners(a: (u32, u32), b: (u32, u32)) -> Self {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        Self::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Shrink the rectangle so it lies inside a `img_width` x `img_height` image.
    ///
    /// The origin is pulled onto the last row/column when it lies outside, so the
    /// result is at least 1x1 whenever the rectangle had a non-zero size.
    pub fn clamp_to(&self, img_width: u32, img_height: u32) -> PixelRect {
        if img_width == 0 || img_height == 0 {
            return PixelRect::new(0, 0, 0, 0);
        }
        let x = self.x.min(img_width - 1);
        let y = self.y.min(img_height - 1);
        PixelRect {
            x,
            y,
            width: self.width.min(img_width - x),
            height: self.height.min(img_height - y),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether both sides are strictly larger than `min` pixels
    pub fn exceeds(&self, min: u32) -> bool {
        self.width > min && self.height > min
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for PixelRect {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(RegionParseError::WrongArity(parts.len()));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| RegionParseError::InvalidNumber(part.to_string()))?;
        }
        let rect = PixelRect::new(values[0], values[1], values[2], values[3]);
        if rect.is_empty() {
            return Err(RegionParseError::Empty);
        }
        Ok(rect)
    }
}

/// Copy the clamped `rect` out of `image`. The source image is untouched.
pub fn crop_region(image: &DynamicImage, rect: PixelRect) -> DynamicImage {
    let (w, h) = image.dimensions();
    let r = rect.clamp_to(w, h);
    image.crop_imm(r.x, r.y, r.width, r.height)
}
