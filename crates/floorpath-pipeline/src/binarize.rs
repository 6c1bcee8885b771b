//! Global-threshold binarization into a navigability mask.
//!
//! A pixel is walkable when its BT.601 luma (see [`crate::grayscale::luma`])
//! is at least the threshold. Floor plans draw walls dark on a light
//! background, so the default threshold of 170 keeps open floor walkable
//! and walls, text and furniture blocked.

use image::{GrayImage, RgbImage};

use crate::grayscale::luma;
use crate::types::{Dimensions, GridPoint, ImageIssue, PathError};

/// Mask value of a walkable cell.
pub const WALKABLE: u8 = 255;
/// Mask value of a blocked cell.
pub const BLOCKED: u8 = 0;

/// Two-level navigability mask, stored row-major as 0/255 bytes.
///
/// Every cell holds exactly [`WALKABLE`] or [`BLOCKED`]; constructors
/// never produce other values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// Build a mask from a predicate over `(row, col)`.
    pub fn from_fn(width: u32, height: u32, mut walkable: impl FnMut(GridPoint) -> bool) -> Self {
        Self(GrayImage::from_fn(width, height, |x, y| {
            image::Luma([if walkable(GridPoint::new(y, x)) {
                WALKABLE
            } else {
                BLOCKED
            }])
        }))
    }

    /// Mask dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.0.width(),
            height: self.0.height(),
        }
    }

    /// Returns `true` if `point` is inside the mask and walkable.
    #[must_use]
    pub fn is_walkable(&self, point: GridPoint) -> bool {
        self.0
            .get_pixel_checked(point.col, point.row)
            .is_some_and(|p| p.0[0] == WALKABLE)
    }

    /// Number of walkable cells.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.0.as_raw().iter().filter(|&&v| v == WALKABLE).count()
    }

    /// Row-major cell values.
    #[must_use]
    pub fn cells(&self) -> &[u8] {
        self.0.as_raw()
    }

    /// The mask as a grayscale image.
    #[must_use]
    pub const fn as_image(&self) -> &GrayImage {
        &self.0
    }

    /// Consume the mask and return the grayscale image.
    #[must_use]
    pub fn into_image(self) -> GrayImage {
        self.0
    }
}

/// Binarize an RGB image: walkable iff luma `>= threshold`.
///
/// A threshold of 0 makes every cell walkable.
///
/// # Errors
///
/// Returns [`PathError::InvalidImage`] if the image has a zero dimension.
pub fn binarize(image: &RgbImage, threshold: u8) -> Result<BinaryMask, PathError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageIssue::ZeroSized { width, height }.into());
    }

    let cells: Vec<u8> = image
        .as_raw()
        .chunks_exact(3)
        .map(|px| classify(luma([px[0], px[1], px[2]]), threshold))
        .collect();
    let mask = GrayImage::from_raw(width, height, cells)
        .ok_or(ImageIssue::ZeroSized { width, height })?;
    Ok(BinaryMask(mask))
}

/// Binarize an already single-channel image with the same rule.
///
/// # Errors
///
/// Returns [`PathError::InvalidImage`] if the image has a zero dimension.
pub fn binarize_gray(image: &GrayImage, threshold: u8) -> Result<BinaryMask, PathError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageIssue::ZeroSized { width, height }.into());
    }
    let cells = image.as_raw().iter().map(|&v| classify(v, threshold)).collect();
    let mask = GrayImage::from_raw(width, height, cells)
        .ok_or(ImageIssue::ZeroSized { width, height })?;
    Ok(BinaryMask(mask))
}

#[inline]
const fn classify(value: u8, threshold: u8) -> u8 {
    if value >= threshold { WALKABLE } else { BLOCKED }
}
