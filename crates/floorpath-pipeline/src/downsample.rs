//! Optional resize of the floor plan to a working resolution.
//!
//! Graph size grows with pixel count, so very large scans can be reduced
//! before binarization so the longest axis matches `working_resolution`.
//! When this step runs, every coordinate downstream (start, end, and the
//! returned path) refers to the resized image.
//!
//! Disabled by default: [`DownsampleFilter::None`] keeps the source pixels.

use std::fmt;

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Resampling filter used when downsampling.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality,
/// with a `None` variant to skip downsampling entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownsampleFilter {
    /// Disabled: keep the source resolution.
    #[default]
    None,
    /// Nearest-neighbor: fastest, keeps thin walls crisp.
    Nearest,
    /// Bilinear interpolation.
    Triangle,
    /// Bicubic (Catmull-Rom).
    CatmullRom,
    /// Gaussian.
    Gaussian,
    /// Lanczos with 3 lobes.
    Lanczos3,
}

impl DownsampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    ///
    /// Returns `Option::None` for [`DownsampleFilter::None`].
    const fn to_image_filter(self) -> Option<image::imageops::FilterType> {
        match self {
            Self::None => Option::None,
            Self::Nearest => Some(image::imageops::FilterType::Nearest),
            Self::Triangle => Some(image::imageops::FilterType::Triangle),
            Self::CatmullRom => Some(image::imageops::FilterType::CatmullRom),
            Self::Gaussian => Some(image::imageops::FilterType::Gaussian),
            Self::Lanczos3 => Some(image::imageops::FilterType::Lanczos3),
        }
    }
}

impl fmt::Display for DownsampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Size of an image whose longest axis is scaled to `max_dimension`,
/// preserving aspect ratio. Neither axis drops below one pixel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scaled_size(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let long_axis = width.max(height);
    let scale = f64::from(max_dimension) / f64::from(long_axis);
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w, h)
}

/// Downsample so the longest axis is at most `max_dimension` pixels.
///
/// Returns `None` when the image is left as is (filter disabled, or the
/// image already fits), so callers keep using their own buffer.
#[must_use]
pub fn downsample(
    image: &RgbImage,
    max_dimension: u32,
    filter: DownsampleFilter,
) -> Option<RgbImage> {
    let image_filter = filter.to_image_filter()?;

    let (w, h) = image.dimensions();
    if max_dimension == 0 || w.max(h) <= max_dimension {
        return None;
    }

    let (nw, nh) = scaled_size(w, h, max_dimension);
    log::debug!("downsampling {w}x{h} -> {nw}x{nh} ({filter})");
    Some(image::imageops::resize(image, nw, nh, image_filter))
}
