//! Shared types for the floorpath routing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::downsample::DownsampleFilter;

/// Re-export `GrayImage` so downstream crates can reference the
/// navigability mask without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the decoded
/// source and rendered images without depending on `image` directly.
pub use image::RgbImage;

/// A pixel cell addressed as `(row, col)`.
///
/// Rows grow downward and columns grow to the right, so `row` is the
/// image `y` coordinate and `col` is the image `x` coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    /// Vertical position (pixels from top edge).
    pub row: u32,
    /// Horizontal position (pixels from left edge).
    pub col: u32,
}

impl GridPoint {
    /// Create a new grid point.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Number of unit 4-neighbor steps between two cells.
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Euclidean distance between cell centers.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dr = f64::from(self.row.abs_diff(other.row));
        let dc = f64::from(self.col.abs_diff(other.col));
        dr.hypot(dc)
    }

    /// Returns `true` if `other` is one of the four axis-adjacent cells.
    #[must_use]
    pub const fn is_adjacent(self, other: Self) -> bool {
        self.manhattan_distance(other) == 1
    }

    /// Returns `true` if the cell lies inside an image of the given size.
    #[must_use]
    pub const fn is_within(self, dimensions: Dimensions) -> bool {
        self.row < dimensions.height && self.col < dimensions.width
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

impl From<(u32, u32)> for GridPoint {
    fn from((row, col): (u32, u32)) -> Self {
        Self::new(row, col)
    }
}

/// An ordered route of grid cells from start to end.
///
/// Paths produced by [`crate::search::shortest_path`] always start at the
/// requested start, end at the requested end, and step between
/// 4-adjacent cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPath(Vec<GridPoint>);

impl GridPath {
    /// Create a new path from a vector of cells.
    #[must_use]
    pub const fn new(points: Vec<GridPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the path has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of cells in the path.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first cell, if any.
    #[must_use]
    pub fn first(&self) -> Option<&GridPoint> {
        self.0.first()
    }

    /// Returns the last cell, if any.
    #[must_use]
    pub fn last(&self) -> Option<&GridPoint> {
        self.0.last()
    }

    /// Returns a slice of all cells.
    #[must_use]
    pub fn points(&self) -> &[GridPoint] {
        &self.0
    }

    /// Consumes the path and returns the underlying vector of cells.
    #[must_use]
    pub fn into_points(self) -> Vec<GridPoint> {
        self.0
    }

    /// Number of unit steps taken along the path.
    #[must_use]
    pub const fn step_count(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Returns `true` if every consecutive pair of cells is 4-adjacent.
    #[must_use]
    pub fn is_contiguous(&self) -> bool {
        self.0.windows(2).all(|w| w[0].is_adjacent(w[1]))
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count (`width * height`).
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Byte format of the rendered route image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Lossy JPEG with the given quality (1 to 100).
    Jpeg {
        /// Encoder quality.
        quality: u8,
    },
    /// Lossless PNG. Use this when rendered pixels must be compared exactly.
    Png,
}

impl OutputFormat {
    /// MIME type of the encoded bytes.
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Conventional file extension, without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg { .. } => "jpg",
            Self::Png => "png",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Jpeg {
            quality: PathConfig::DEFAULT_JPEG_QUALITY,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg { quality } => write!(f, "JPEG (quality {quality})"),
            Self::Png => f.write_str("PNG"),
        }
    }
}

/// Configuration for the routing pipeline.
///
/// Construct with struct-update syntax over [`PathConfig::default`] and
/// check with [`PathConfig::validate`]; [`crate::compute_path`] validates
/// before touching the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Luminance at or above which a pixel is walkable.
    pub threshold: u8,

    /// Draw the route on the original color image (`true`) or on the
    /// binarized mask (`false`).
    pub draw_on_original: bool,

    /// Paint red and green annotation markers white before binarizing,
    /// so colored markers drawn on the plan do not block routes.
    pub marker_removal: bool,

    /// Resampling filter for the optional working-resolution resize.
    /// [`DownsampleFilter::None`] disables resizing.
    pub downsample_filter: DownsampleFilter,

    /// Longest image axis after downsampling, in pixels.
    /// Only used when `downsample_filter` is not `None`.
    pub working_resolution: u32,

    /// Encoding of the rendered image.
    pub output_format: OutputFormat,
}

impl PathConfig {
    /// Default binarization threshold.
    pub const DEFAULT_THRESHOLD: u8 = 170;
    /// Default base image for rendering.
    pub const DEFAULT_DRAW_ON_ORIGINAL: bool = true;
    /// Default working resolution (long axis, pixels).
    pub const DEFAULT_WORKING_RESOLUTION: u32 = 1000;
    /// Default downsample filter (disabled).
    pub const DEFAULT_DOWNSAMPLE_FILTER: DownsampleFilter = DownsampleFilter::None;
    /// Default JPEG quality.
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// Check value ranges that the field types do not enforce.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidConfig`] if the JPEG quality is outside
    /// `1..=100` or the working resolution is zero while downsampling is
    /// enabled.
    pub fn validate(&self) -> Result<(), PathError> {
        if let OutputFormat::Jpeg { quality } = self.output_format
            && !(1..=100).contains(&quality)
        {
            return Err(PathError::InvalidConfig(format!(
                "JPEG quality must be in 1..=100, got {quality}"
            )));
        }
        if self.downsample_filter != DownsampleFilter::None && self.working_resolution == 0 {
            return Err(PathError::InvalidConfig(
                "working resolution must be at least 1 pixel".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            draw_on_original: Self::DEFAULT_DRAW_ON_ORIGINAL,
            marker_removal: false,
            downsample_filter: Self::DEFAULT_DOWNSAMPLE_FILTER,
            working_resolution: Self::DEFAULT_WORKING_RESOLUTION,
            output_format: OutputFormat::default(),
        }
    }
}

/// Result of running the full routing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    /// The route from start to end.
    pub path: GridPath,

    /// The rendered route image, encoded as `format`.
    pub rendered: Vec<u8>,

    /// Encoding of `rendered`.
    pub format: OutputFormat,

    /// Dimensions of the image the route was computed on (the working
    /// image when downsampling was applied).
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with intermediate stage outputs kept.
///
/// Does not derive `PartialEq` so that comparisons never walk pixel data
/// by accident.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Decoded RGB image after optional downsampling.
    pub original: RgbImage,
    /// Binary navigability mask (255 = walkable, 0 = blocked).
    pub mask: GrayImage,
    /// Number of nodes in the navigation graph.
    pub node_count: usize,
    /// Number of edges in the navigation graph.
    pub edge_count: usize,
    /// The route from start to end.
    pub path: GridPath,
    /// The unencoded rendered image.
    pub rendered: RgbImage,
    /// Working image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Why an image was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ImageIssue {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    Empty,

    /// The input bytes could not be decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The image decoded but has no pixels.
    #[error("image has zero-sized dimensions {width}x{height}")]
    ZeroSized {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },
}

/// Why a start or end cell was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NodeIssue {
    /// The cell lies outside the image.
    #[error("outside the {width}x{height} image")]
    OutOfBounds {
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The cell is inside the image but not walkable.
    #[error("cell is blocked")]
    Blocked,
}

/// Errors that can occur during routing.
///
/// Every variant is terminal for the request; nothing is retried
/// internally and no partial result is returned.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The input image is empty, undecodable, or has no pixels.
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageIssue),

    /// The start or end cell is out of bounds or blocked.
    #[error("invalid node {point}: {issue}")]
    InvalidNode {
        /// The rejected cell.
        point: GridPoint,
        /// Why it was rejected.
        issue: NodeIssue,
    },

    /// Start and end are valid but not connected by walkable cells.
    #[error("no walkable path from {start} to {end}")]
    NoPathFound {
        /// Requested start.
        start: GridPoint,
        /// Requested end.
        end: GridPoint,
    },

    /// The rendered image could not be encoded.
    #[error("failed to encode rendered image: {0}")]
    Encode(#[source] image::ImageError),

    /// Pipeline configuration is invalid.
    #[error("invalid path configuration: {0}")]
    InvalidConfig(String),
}
