use std::sync::Arc;

use image::{GrayImage, imageops::FilterType};

use crate::foundation::{
    core::PixelRect,
    error::{MmnistError, MmnistResult},
};

/// Pixels strictly above this value count as digit content (0-255 scale).
pub const BRIGHTNESS_THRESHOLD: u8 = 100;

/// Immutable grayscale digit image plus its class label.
///
/// Pixel data is shared, so cloning a sprite out of a source pool is cheap.
#[derive(Clone, Debug)]
pub struct Sprite {
    pixels: Arc<GrayImage>,
    label: u8,
}

impl Sprite {
    pub fn new(pixels: GrayImage, label: u8) -> Self {
        Self {
            pixels: Arc::new(pixels),
            label,
        }
    }

    /// Build a sprite from a row-major grayscale buffer.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>, label: u8) -> MmnistResult<Self> {
        let pixels = GrayImage::from_raw(width, height, data).ok_or_else(|| {
            MmnistError::source(format!(
                "sprite buffer does not match {width}x{height} grayscale"
            ))
        })?;
        Ok(Self::new(pixels, label))
    }

    pub fn label(&self) -> u8 {
        self.label
    }

    pub fn pixels(&self) -> &GrayImage {
        &self.pixels
    }

    /// Whether any pixel is bright enough to produce a tight bbox.
    pub fn has_content(&self) -> bool {
        bright_bounds(&self.pixels).is_some()
    }

    /// Bilinear resample to a `size x size` square.
    pub fn resampled(&self, size: u32) -> GrayImage {
        let size = size.max(1);
        if self.pixels.dimensions() == (size, size) {
            return (*self.pixels).clone();
        }
        image::imageops::resize(&*self.pixels, size, size, FilterType::Triangle)
    }
}

/// Minimal inclusive rectangle enclosing every pixel above [`BRIGHTNESS_THRESHOLD`].
///
/// Returns `None` when nothing is bright enough.
pub fn bright_bounds(img: &GrayImage) -> Option<PixelRect> {
    let mut rect: Option<PixelRect> = None;
    for (x, y, px) in img.enumerate_pixels() {
        if px.0[0] <= BRIGHTNESS_THRESHOLD {
            continue;
        }
        rect = Some(match rect {
            None => PixelRect {
                x1: x,
                y1: y,
                x2: x,
                y2: y,
            },
            Some(r) => PixelRect {
                x1: r.x1.min(x),
                y1: r.y1.min(y),
                x2: r.x2.max(x),
                y2: r.y2.max(y),
            },
        });
    }
    rect
}

#[cfg(test)]
#[path = "../../tests/unit/source/sprite.rs"]
mod tests;
