//! JSON response serializer.
//!
//! A [`PathResponse`] is the transport form of a computed route: the
//! cells as `[row, col]` pairs, their count, the image dimensions, and
//! the rendered image as standard base64 tagged with its MIME type.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use floorpath_pipeline::{Dimensions, GridPath, GridPoint, PathResult};

/// Errors from building or reading a JSON response.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The `rendered_image` field is not valid base64.
    #[error("rendered image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// JSON-serializable route response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResponse {
    /// Route cells from start to end, as `[row, col]`.
    pub path: Vec<[u32; 2]>,
    /// Number of cells in `path`.
    pub length: usize,
    /// Dimensions of the image the route was computed on.
    pub dimensions: Dimensions,
    /// MIME type of `rendered_image`.
    pub format: String,
    /// Rendered image, base64-encoded (standard alphabet, padded).
    pub rendered_image: String,
}

impl PathResponse {
    /// Build the response for a pipeline result.
    #[must_use]
    pub fn from_result(result: &PathResult) -> Self {
        Self {
            path: result
                .path
                .points()
                .iter()
                .map(|p| [p.row, p.col])
                .collect(),
            length: result.path.len(),
            dimensions: result.dimensions,
            format: result.format.mime_type().to_string(),
            rendered_image: STANDARD.encode(&result.rendered),
        }
    }

    /// The route as a [`GridPath`].
    #[must_use]
    pub fn grid_path(&self) -> GridPath {
        GridPath::new(
            self.path
                .iter()
                .map(|&[row, col]| GridPoint::new(row, col))
                .collect(),
        )
    }

    /// Decode `rendered_image` back into encoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Base64`] if the field is not valid base64.
    pub fn rendered_bytes(&self) -> Result<Vec<u8>, ExportError> {
        Ok(STANDARD.decode(&self.rendered_image)?)
    }

    /// Parse a response from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if `json` is not a valid response.
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Serialize a pipeline result as a JSON [`PathResponse`].
///
/// # Errors
///
/// Returns [`ExportError::Json`] if serialization fails.
pub fn to_json(result: &PathResult) -> Result<String, ExportError> {
    Ok(serde_json::to_string(&PathResponse::from_result(result))?)
}
