use image::GrayImage;

use crate::source::sprite::BRIGHTNESS_THRESHOLD;

/// Paste `sprite` onto `dst` with its top-left corner at `top_left` (canvas pixels).
///
/// The sprite is its own mask: pixels at or below [`BRIGHTNESS_THRESHOLD`] are transparent,
/// brighter pixels replace the destination. Parts falling outside `dst` are clipped.
pub fn paste_masked(dst: &mut GrayImage, sprite: &GrayImage, top_left: (i64, i64)) {
    let (dst_w, dst_h) = (i64::from(dst.width()), i64::from(dst.height()));
    let (ox, oy) = top_left;

    for (sx, sy, px) in sprite.enumerate_pixels() {
        if px.0[0] <= BRIGHTNESS_THRESHOLD {
            continue;
        }
        let dx = ox + i64::from(sx);
        let dy = oy + i64::from(sy);
        if dx < 0 || dy < 0 || dx >= dst_w || dy >= dst_h {
            continue;
        }
        dst.put_pixel(dx as u32, dy as u32, *px);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
