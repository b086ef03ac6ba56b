use std::iter::FusedIterator;

use image::GrayImage;

use crate::{
    foundation::core::{Canvas, NormBox, PixelRect},
    motion::digit::Digit,
    render::composite::paste_masked,
};

/// One annotated object in a frame.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectAnnotation {
    /// Normalized `[cx, cy, w, h]`.
    pub bbox: NormBox,
    pub label: u8,
    /// Index of the digit within its sequence, stable across frames.
    pub track_id: u32,
}

/// A rendered frame with parallel per-digit annotation lists.
#[derive(Clone, Debug)]
pub struct FrameRecord {
    /// Frame index within the sequence.
    pub index: u32,
    pub image: GrayImage,
    pub bboxes: Vec<NormBox>,
    pub labels: Vec<u8>,
    pub track_ids: Vec<u32>,
}

impl FrameRecord {
    /// Zip the parallel lists into per-object records.
    pub fn objects(&self) -> Vec<ObjectAnnotation> {
        self.bboxes
            .iter()
            .zip(&self.labels)
            .zip(&self.track_ids)
            .map(|((&bbox, &label), &track_id)| ObjectAnnotation {
                bbox,
                label,
                track_id,
            })
            .collect()
    }
}

/// Map a sprite-local bbox placed at `(x1, y1)` to a clamped, canvas-normalized YOLO box.
pub fn bbox_coords(bbox: PixelRect, x1: i64, y1: i64, canvas: Canvas) -> NormBox {
    let left = (x1 + i64::from(bbox.x1)) as f64;
    let top = (y1 + i64::from(bbox.y1)) as f64;
    let right = (x1 + i64::from(bbox.x2)) as f64;
    let bottom = (y1 + i64::from(bbox.y2)) as f64;

    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    NormBox {
        cx: (left + right) / 2.0 / cw,
        cy: (top + bottom) / 2.0 / ch,
        w: (right - left) / cw,
        h: (bottom - top) / ch,
    }
    .clamped()
}

/// Lazily renders `n_frames` frames of a fixed digit set.
///
/// Each call to `next` composites every digit onto a fresh canvas, records boxes, labels and
/// track ids, and only then advances every digit by one tick. The sequence owns its digits and
/// cannot be restarted.
#[derive(Debug)]
pub struct Sequence {
    digits: Vec<Digit>,
    canvas: Canvas,
    n_frames: u32,
    next_frame: u32,
}

impl Sequence {
    pub fn new(digits: Vec<Digit>, n_frames: u32, canvas: Canvas) -> Self {
        Self {
            digits,
            canvas,
            n_frames,
            next_frame: 0,
        }
    }

    pub fn digits(&self) -> &[Digit] {
        &self.digits
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn n_frames(&self) -> u32 {
        self.n_frames
    }

    fn render_frame(&mut self) -> FrameRecord {
        let mut image = GrayImage::new(self.canvas.width, self.canvas.height);
        let n = self.digits.len();
        let mut bboxes = Vec::with_capacity(n);
        let mut labels = Vec::with_capacity(n);
        let mut track_ids = Vec::with_capacity(n);

        for (track_id, digit) in self.digits.iter().enumerate() {
            let sprite = digit.rendered_sprite();
            let (x1, y1) = digit.top_left();
            paste_masked(&mut image, &sprite, (x1, y1));

            let bbox = match digit.tight_bbox_of(&sprite) {
                Ok(rect) => bbox_coords(rect, x1, y1, self.canvas),
                Err(err) => {
                    tracing::debug!(%err, track_id, "resampled sprite is blank, using a point box");
                    centered_point_box(x1, y1, sprite.width(), self.canvas)
                }
            };
            bboxes.push(bbox);
            labels.push(digit.label());
            track_ids.push(track_id as u32);
        }

        for digit in &mut self.digits {
            digit.update();
        }

        let index = self.next_frame;
        self.next_frame += 1;
        FrameRecord {
            index,
            image,
            bboxes,
            labels,
            track_ids,
        }
    }
}

fn centered_point_box(x1: i64, y1: i64, size: u32, canvas: Canvas) -> NormBox {
    let half = f64::from(size) / 2.0;
    NormBox {
        cx: (x1 as f64 + half) / f64::from(canvas.width),
        cy: (y1 as f64 + half) / f64::from(canvas.height),
        w: 0.0,
        h: 0.0,
    }
    .clamped()
}

impl Iterator for Sequence {
    type Item = FrameRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_frame >= self.n_frames {
            return None;
        }
        Some(self.render_frame())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.n_frames.saturating_sub(self.next_frame) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Sequence {}

impl FusedIterator for Sequence {}

#[cfg(test)]
#[path = "../../tests/unit/render/sequence.rs"]
mod tests;
