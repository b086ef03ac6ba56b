use crate::foundation::error::{MmnistError, MmnistResult};

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> MmnistResult<Self> {
        if width == 0 || height == 0 {
            return Err(MmnistError::validation("canvas width/height must be non-zero"));
        }
        Ok(Self { width, height })
    }
}

/// Inclusive pixel rectangle in a sprite's local coordinate frame.
///
/// `x2`/`y2` are the coordinates of the last bright column/row, not one past it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

/// YOLO-style box: center and extent, each normalized by the canvas dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct NormBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl NormBox {
    /// Clamp every component into `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            cx: clamp01(self.cx),
            cy: clamp01(self.cy),
            w: clamp01(self.w),
            h: clamp01(self.h),
        }
    }
}

impl From<[f64; 4]> for NormBox {
    fn from([cx, cy, w, h]: [f64; 4]) -> Self {
        Self { cx, cy, w, h }
    }
}

impl From<NormBox> for [f64; 4] {
    fn from(b: NormBox) -> Self {
        [b.cx, b.cy, b.w, b.h]
    }
}

pub(crate) fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
