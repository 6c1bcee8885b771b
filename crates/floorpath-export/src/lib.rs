//! floorpath-export: Pure serializers for computed routes (sans-IO).
//!
//! Converts a [`floorpath_pipeline::PathResult`] into transport formats:
//! an SVG overlay of the route and a JSON response carrying the path and
//! the base64-encoded rendered image.

pub mod json;
pub mod svg;

pub use json::{ExportError, PathResponse, to_json};
pub use svg::{SvgMetadata, build_path_data, to_svg};
