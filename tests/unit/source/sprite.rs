use super::*;

fn block_sprite(side: u32, value: u8) -> Sprite {
    let mut img = GrayImage::new(side, side);
    for y in side / 4..side * 3 / 4 {
        for x in side / 4..side * 3 / 4 {
            img.put_pixel(x, y, image::Luma([value]));
        }
    }
    Sprite::new(img, 5)
}

#[test]
fn from_raw_rejects_short_buffer() {
    assert!(Sprite::from_raw(4, 4, vec![0; 15], 1).is_err());
    let s = Sprite::from_raw(4, 4, vec![0; 16], 1).unwrap();
    assert_eq!(s.pixels().dimensions(), (4, 4));
    assert_eq!(s.label(), 1);
}

#[test]
fn content_uses_strict_threshold() {
    assert!(!block_sprite(8, BRIGHTNESS_THRESHOLD).has_content());
    assert!(block_sprite(8, BRIGHTNESS_THRESHOLD + 1).has_content());
    assert!(!Sprite::new(GrayImage::new(8, 8), 0).has_content());
}

#[test]
fn resampled_hits_requested_square_size() {
    let s = block_sprite(28, 255);
    assert_eq!(s.resampled(40).dimensions(), (40, 40));
    assert_eq!(s.resampled(17).dimensions(), (17, 17));
    assert_eq!(s.resampled(0).dimensions(), (1, 1));
}

#[test]
fn resampled_same_size_is_identity() {
    let s = block_sprite(28, 200);
    assert_eq!(s.resampled(28).as_raw(), s.pixels().as_raw());
}

#[test]
fn resampled_is_deterministic() {
    let s = block_sprite(28, 230);
    assert_eq!(s.resampled(33).as_raw(), s.resampled(33).as_raw());
}

#[test]
fn bright_bounds_is_inclusive_min_max() {
    let mut img = GrayImage::new(32, 32);
    for y in 10..20 {
        for x in 8..23 {
            img.put_pixel(x, y, image::Luma([200]));
        }
    }
    assert_eq!(
        bright_bounds(&img),
        Some(PixelRect {
            x1: 8,
            y1: 10,
            x2: 22,
            y2: 19
        })
    );
}

#[test]
fn bright_bounds_ignores_dim_pixels() {
    let mut img = GrayImage::new(16, 16);
    img.put_pixel(0, 0, image::Luma([BRIGHTNESS_THRESHOLD]));
    img.put_pixel(15, 15, image::Luma([50]));
    assert_eq!(bright_bounds(&img), None);

    img.put_pixel(3, 4, image::Luma([255]));
    assert_eq!(
        bright_bounds(&img),
        Some(PixelRect {
            x1: 3,
            y1: 4,
            x2: 3,
            y2: 4
        })
    );
}
