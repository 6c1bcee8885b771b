//! Image decoding and grayscale reduction.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the RGB
//! image every later stage works from, plus the luma reduction used by
//! the binarizer.

use image::{GrayImage, RgbImage};

use crate::types::{ImageIssue, PathError};

/// Fixed-point weight of the red channel (`0.299 * 2^14`).
pub const LUMA_R: u32 = 4899;
/// Fixed-point weight of the green channel (`0.587 * 2^14`).
pub const LUMA_G: u32 = 9617;
/// Fixed-point weight of the blue channel (`0.114 * 2^14`).
pub const LUMA_B: u32 = 1868;
/// Bits of fixed-point precision in the luma weights.
const LUMA_SHIFT: u32 = 14;
const _: () = assert!(LUMA_R + LUMA_G + LUMA_B == 1 << LUMA_SHIFT);

/// Decode raw image bytes into an RGB image.
///
/// Grayscale inputs are expanded to three equal channels and alpha is
/// dropped, so every format reaches the binarizer in the same layout.
///
/// # Errors
///
/// Returns [`PathError::InvalidImage`] if `bytes` is empty, the format is
/// unrecognized or corrupt, or the decoded image has a zero dimension.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, PathError> {
    if bytes.is_empty() {
        return Err(ImageIssue::Empty.into());
    }

    let img = image::load_from_memory(bytes).map_err(ImageIssue::Decode)?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(ImageIssue::ZeroSized { width, height }.into());
    }
    Ok(img.into_rgb8())
}

/// BT.601 luma of one RGB pixel, rounded to nearest.
///
/// `Y = (4899*R + 9617*G + 1868*B + 8192) >> 14`, the same fixed-point
/// form OpenCV uses for its 8-bit RGB-to-gray conversion. Because the
/// weights sum to `2^14`, a gray pixel `(v, v, v)` maps back to `v`.
#[must_use]
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn luma(rgb: [u8; 3]) -> u8 {
    let sum = LUMA_R * rgb[0] as u32 + LUMA_G * rgb[1] as u32 + LUMA_B * rgb[2] as u32;
    // Max value is 255 << 14, so the shifted result fits in u8.
    ((sum + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Reduce an RGB image to a single luma channel.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    let raw: Vec<u8> = image
        .as_raw()
        .chunks_exact(3)
        .map(|px| luma([px[0], px[1], px[2]]))
        .collect();
    GrayImage::from_raw(image.width(), image.height(), raw)
        .unwrap_or_else(|| GrayImage::new(image.width(), image.height()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::encode_png;

    #[test]
    fn empty_input_returns_error() {
        let result = decode(&[]);
        assert!(matches!(
            result,
            Err(PathError::InvalidImage(ImageIssue::Empty))
        ));
    }

    #[test]
    fn corrupt_bytes_returns_decode_error() {
        let result = decode(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(
            result,
            Err(PathError::InvalidImage(ImageIssue::Decode(_)))
        ));
    }

    #[test]
    fn valid_png_decodes_with_dimensions() {
        let img = RgbImage::from_pixel(17, 31, image::Rgb([128, 64, 32]));
        let decoded = decode(&encode_png(&img)).unwrap();
        assert_eq!(decoded.dimensions(), (17, 31));
        assert_eq!(decoded.get_pixel(3, 4).0, [128, 64, 32]);
    }

    #[test]
    fn gray_png_expands_to_equal_channels() {
        let gray = GrayImage::from_pixel(2, 2, image::Luma([77]));
        let mut buf = Vec::new();
        image::ImageEncoder::write_image(
            image::codecs::png::PngEncoder::new(&mut buf),
            gray.as_raw(),
            2,
            2,
            image::ExtendedColorType::L8,
        )
        .unwrap();
        let decoded = decode(&buf).unwrap();
        assert_eq!(decoded.get_pixel(1, 1).0, [77, 77, 77]);
    }

    #[test]
    fn luma_preserves_gray_levels() {
        for v in 0..=255u8 {
            assert_eq!(luma([v, v, v]), v);
        }
    }

    #[test]
    fn luma_matches_bt601_weights() {
        assert_eq!(luma([255, 0, 0]), 76);
        assert_eq!(luma([0, 255, 0]), 150);
        assert_eq!(luma([0, 0, 255]), 29);
        assert_eq!(luma([255, 255, 255]), 255);
    }

    #[test]
    fn grayscale_keeps_dimensions_and_layout() {
        let img = RgbImage::from_fn(3, 2, |x, y| {
            if (x, y) == (2, 1) {
                image::Rgb([0, 255, 0])
            } else {
                image::Rgb([0, 0, 0])
            }
        });
        let gray = to_grayscale(&img);
        assert_eq!(gray.dimensions(), (3, 2));
        assert_eq!(gray.get_pixel(2, 1).0[0], 150);
        assert_eq!(gray.get_pixel(0, 0).0[0], 0);
    }
}
