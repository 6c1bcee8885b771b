//! Removal of red and green annotation markers before binarization.
//!
//! Floor plans handed to the router often carry colored start/end dots or
//! highlighted regions. Saturated red and green are dark enough in luma to
//! read as walls, so this optional step paints them white first.
//!
//! Hue uses OpenCV's 8-bit convention (degrees / 2, range `0..180`).

use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;

/// Minimum saturation (0-255) for a pixel to count as a marker.
pub const MIN_SATURATION: u8 = 100;
/// Minimum value (0-255) for a pixel to count as a marker.
pub const MIN_VALUE: u8 = 100;

/// Half-degree hue bands classified as marker colors.
const MARKER_HUES: [(u8, u8); 3] = [(0, 10), (170, 180), (40, 80)];

/// Radius of the square morphology element (5x5).
const MORPHOLOGY_RADIUS: u8 = 2;

/// Convert an RGB pixel to OpenCV-style 8-bit HSV.
///
/// Returns `(h, s, v)` with `h` in `0..180` and `s`, `v` in `0..=255`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rgb_to_hsv(rgb: [u8; 3]) -> (u8, u8, u8) {
    let [r, g, b] = rgb.map(i32::from);
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = v - min;

    if v == 0 || diff == 0 {
        return (0, 0, v as u8);
    }

    let s = (255 * diff + v / 2) / v;
    let mut h = if v == r {
        60.0 * f64::from(g - b) / f64::from(diff)
    } else if v == g {
        120.0 + 60.0 * f64::from(b - r) / f64::from(diff)
    } else {
        240.0 + 60.0 * f64::from(r - g) / f64::from(diff)
    };
    if h < 0.0 {
        h += 360.0;
    }
    let h = ((h / 2.0).round() as i32).rem_euclid(180);
    (h as u8, s as u8, v as u8)
}

/// Returns `true` if the pixel falls in a red or green marker band.
#[must_use]
pub fn is_marker(rgb: [u8; 3]) -> bool {
    let (h, s, v) = rgb_to_hsv(rgb);
    s >= MIN_SATURATION
        && v >= MIN_VALUE
        && MARKER_HUES.iter().any(|&(lo, hi)| (lo..=hi).contains(&h))
}

/// Marker mask (255 = marker) after a 5x5 close then open.
///
/// Closing fills pinholes inside a marker; opening drops isolated
/// colored pixels such as anti-aliasing fringes on dark lines.
#[must_use]
pub fn marker_mask(image: &RgbImage) -> GrayImage {
    let raw = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([if is_marker(image.get_pixel(x, y).0) { 255 } else { 0 }])
    });
    let closed = imageproc::morphology::close(&raw, Norm::LInf, MORPHOLOGY_RADIUS);
    imageproc::morphology::open(&closed, Norm::LInf, MORPHOLOGY_RADIUS)
}

/// Return a copy of `image` with marker pixels painted white.
#[must_use = "returns the cleaned image"]
pub fn remove_markers(image: &RgbImage) -> RgbImage {
    let mask = marker_mask(image);
    let mut cleaned = image.clone();
    let mut painted = 0usize;
    for (px, m) in cleaned.pixels_mut().zip(mask.pixels()) {
        if m.0[0] != 0 {
            *px = image::Rgb([255, 255, 255]);
            painted += 1;
        }
    }
    log::debug!("marker removal painted {painted} pixels white");
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_of_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), (0, 255, 255));
        assert_eq!(rgb_to_hsv([0, 255, 0]), (60, 255, 255));
        assert_eq!(rgb_to_hsv([0, 0, 255]), (120, 255, 255));
        assert_eq!(rgb_to_hsv([128, 128, 128]), (0, 0, 128));
        assert_eq!(rgb_to_hsv([0, 0, 0]), (0, 0, 0));
    }

    #[test]
    fn red_and_green_are_markers() {
        assert!(is_marker([220, 20, 20]));
        assert!(is_marker([230, 30, 60])); // magenta-leaning red, hue near 175
        assert!(is_marker([30, 200, 40]));
    }

    #[test]
    fn blue_gray_and_dark_are_not_markers() {
        assert!(!is_marker([20, 20, 220]));
        assert!(!is_marker([128, 128, 128]));
        assert!(!is_marker([60, 5, 5])); // too dark
        assert!(!is_marker([255, 200, 200])); // too pale
    }

    #[test]
    fn marker_block_is_painted_white() {
        let mut img = RgbImage::from_pixel(20, 20, image::Rgb([0, 0, 0]));
        for y in 5..15 {
            for x in 5..15 {
                img.put_pixel(x, y, image::Rgb([230, 10, 10]));
            }
        }
        let cleaned = remove_markers(&img);
        assert_eq!(cleaned.get_pixel(10, 10).0, [255, 255, 255]);
        assert_eq!(cleaned.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(cleaned.get_pixel(19, 19).0, [0, 0, 0]);
    }

    #[test]
    fn isolated_marker_pixel_is_opened_away() {
        let mut img = RgbImage::from_pixel(15, 15, image::Rgb([0, 0, 0]));
        img.put_pixel(7, 7, image::Rgb([0, 255, 0]));
        let cleaned = remove_markers(&img);
        assert_eq!(cleaned.get_pixel(7, 7).0, [0, 255, 0]);
    }
}
