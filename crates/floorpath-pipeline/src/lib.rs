//! floorpath-pipeline: Route finding on floor-plan images (sans-IO).
//!
//! Turns an encoded floor-plan image and two cells into a walkable route
//! and a rendered overlay through:
//! decode -> (downsample) -> (marker removal) -> binarize ->
//! navigation graph -> A* search -> render -> encode.
//!
//! This crate has **no I/O dependencies**. It operates on in-memory
//! byte slices and returns structured data; file and terminal handling
//! lives in `floorpath-cli`, transport formats in `floorpath-export`.
//!
//! Coordinates are `(row, col)` cells of the image the route is computed
//! on, with `(0, 0)` at the top-left.

pub mod binarize;
pub mod diagnostics;
pub mod downsample;
pub mod graph;
pub mod grayscale;
pub mod marker;
pub mod pipeline;
pub mod render;
pub mod search;
pub mod types;

pub use binarize::BinaryMask;
pub use diagnostics::{Clock, PathDiagnostics, compute_path_with_diagnostics};
pub use downsample::DownsampleFilter;
pub use graph::NavigationGraph;
pub use pipeline::Pipeline;
pub use types::{
    Dimensions, GridPath, GridPoint, ImageIssue, NodeIssue, OutputFormat, PathConfig, PathError,
    PathResult, StagedResult,
};

/// Compute the route between two cells of a floor-plan image.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP), the start and end cells,
/// and a configuration, and returns the route together with the image
/// rendered with the route drawn on it.
///
/// # Pipeline steps
///
/// 1. Decode the image to RGB
/// 2. Optional resize to the working resolution
/// 3. Optional red/green marker removal
/// 4. Grayscale and threshold into a walkability mask
/// 5. Build the 4-connected navigation graph
/// 6. A* search from `start` to `end`
/// 7. Draw the route and encode the result
///
/// Identical inputs always produce an identical [`PathResult`].
///
/// # Errors
///
/// Returns [`PathError::InvalidConfig`] if `config` fails validation.
/// Returns [`PathError::InvalidImage`] if the bytes are empty, cannot be
/// decoded, or decode to an image with no pixels.
/// Returns [`PathError::InvalidNode`] if `start` or `end` is outside the
/// image or not walkable.
/// Returns [`PathError::NoPathFound`] if no walkable route connects them.
/// Returns [`PathError::Encode`] if the rendered image cannot be encoded.
pub fn compute_path(
    image_bytes: &[u8],
    start: GridPoint,
    end: GridPoint,
    config: &PathConfig,
) -> Result<PathResult, PathError> {
    config.validate()?;
    let result = run(image_bytes, start, end, config)?.encode()?;
    log::info!(
        "route {start} -> {end}: {} cells on {}x{} image",
        result.path.len(),
        result.dimensions.width,
        result.dimensions.height,
    );
    Ok(result)
}

/// Like [`compute_path`] but keeps every intermediate and skips encoding.
///
/// # Errors
///
/// Same as [`compute_path`], minus [`PathError::Encode`].
pub fn compute_path_staged(
    image_bytes: &[u8],
    start: GridPoint,
    end: GridPoint,
    config: &PathConfig,
) -> Result<StagedResult, PathError> {
    config.validate()?;
    Ok(run(image_bytes, start, end, config)?.into_result())
}

fn run(
    image_bytes: &[u8],
    start: GridPoint,
    end: GridPoint,
    config: &PathConfig,
) -> Result<pipeline::Rendered, PathError> {
    Ok(Pipeline::new(image_bytes, config.clone())
        .decode()?
        .downsample()
        .remove_markers()
        .binarize()?
        .build_graph()
        .find_path(start, end)?
        .render())
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_support::{encode_png, floor_plan};

    fn uniform_png(width: u32, height: u32, value: u8) -> Vec<u8> {
        encode_png(&image::RgbImage::from_pixel(
            width,
            height,
            image::Rgb([value; 3]),
        ))
    }

    #[test]
    fn compute_path_empty_input() {
        let result = compute_path(
            &[],
            GridPoint::new(0, 0),
            GridPoint::new(0, 0),
            &PathConfig::default(),
        );
        assert!(matches!(
            result,
            Err(PathError::InvalidImage(ImageIssue::Empty))
        ));
    }

    #[test]
    fn compute_path_corrupt_input() {
        let result = compute_path(
            &[0xFF, 0x00, 0x13],
            GridPoint::new(0, 0),
            GridPoint::new(0, 0),
            &PathConfig::default(),
        );
        assert!(matches!(
            result,
            Err(PathError::InvalidImage(ImageIssue::Decode(_)))
        ));
    }

    #[test]
    fn open_square_route_has_manhattan_length() {
        let png = uniform_png(5, 5, 255);
        let (start, end) = (GridPoint::new(0, 0), GridPoint::new(4, 4));
        let result = compute_path(&png, start, end, &PathConfig::default()).unwrap();
        assert_eq!(result.path.len(), 9);
        assert_eq!(result.path.first(), Some(&start));
        assert_eq!(result.path.last(), Some(&end));
        assert!(result.path.is_contiguous());
        assert_eq!(
            result.dimensions,
            Dimensions {
                width: 5,
                height: 5
            }
        );
        assert_eq!(&result.rendered[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn route_passes_through_doorway() {
        let png = encode_png(&floor_plan());
        let (start, end) = (GridPoint::new(2, 2), GridPoint::new(2, 27));
        let staged = compute_path_staged(&png, start, end, &PathConfig::default()).unwrap();
        assert!(staged.path.is_contiguous());
        // Down to the doorway, across, and back up.
        assert!(staged.path.points().iter().any(|p| p.col == 15 && p.row >= 15));
        assert!(staged.path.len() > 26);
        for p in staged.path.points() {
            assert_eq!(staged.mask.get_pixel(p.col, p.row).0[0], 255);
        }
        assert_eq!(staged.rendered.get_pixel(2, 2).0, render::LINE_COLOR);
    }

    #[test]
    fn blocked_endpoint_is_invalid_node() {
        let png = encode_png(&floor_plan());
        let wall = GridPoint::new(5, 15);
        let result = compute_path(&png, GridPoint::new(2, 2), wall, &PathConfig::default());
        assert!(matches!(
            result,
            Err(PathError::InvalidNode { point, issue: NodeIssue::Blocked }) if point == wall
        ));
    }

    #[test]
    fn out_of_bounds_start_is_invalid_node() {
        let png = uniform_png(5, 5, 255);
        let result = compute_path(
            &png,
            GridPoint::new(0, 5),
            GridPoint::new(0, 0),
            &PathConfig::default(),
        );
        assert!(matches!(
            result,
            Err(PathError::InvalidNode {
                issue: NodeIssue::OutOfBounds { .. },
                ..
            })
        ));
    }

    #[test]
    fn disconnected_rooms_have_no_path() {
        // Close the doorway.
        let mut plan = floor_plan();
        for y in 15..19 {
            plan.put_pixel(15, y, image::Rgb([0, 0, 0]));
        }
        let png = encode_png(&plan);
        let result = compute_path(
            &png,
            GridPoint::new(2, 2),
            GridPoint::new(17, 27),
            &PathConfig::default(),
        );
        assert!(matches!(result, Err(PathError::NoPathFound { .. })));
    }

    #[test]
    fn threshold_decides_walkability() {
        let png = uniform_png(4, 4, 170);
        let (start, end) = (GridPoint::new(0, 0), GridPoint::new(3, 3));
        assert!(compute_path(&png, start, end, &PathConfig::default()).is_ok());

        let strict = PathConfig {
            threshold: 171,
            ..PathConfig::default()
        };
        assert!(matches!(
            compute_path(&png, start, end, &strict),
            Err(PathError::InvalidNode { .. })
        ));
    }

    #[test]
    fn repeated_calls_are_identical() {
        let png = encode_png(&floor_plan());
        let (start, end) = (GridPoint::new(2, 2), GridPoint::new(17, 27));
        let first = compute_path(&png, start, end, &PathConfig::default()).unwrap();
        for _ in 0..3 {
            assert_eq!(
                compute_path(&png, start, end, &PathConfig::default()).unwrap(),
                first
            );
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_decoding() {
        let config = PathConfig {
            output_format: OutputFormat::Jpeg { quality: 0 },
            ..PathConfig::default()
        };
        let result = compute_path(&[], GridPoint::new(0, 0), GridPoint::new(0, 0), &config);
        assert!(matches!(result, Err(PathError::InvalidConfig(_))));
    }

    #[test]
    fn single_cell_route_renders_base_unchanged() {
        let png = encode_png(&floor_plan());
        let p = GridPoint::new(3, 3);
        let staged = compute_path_staged(&png, p, p, &PathConfig::default()).unwrap();
        assert_eq!(staged.path.len(), 1);
        assert_eq!(staged.rendered, staged.original);
    }

    #[test]
    fn draw_on_mask_renders_black_and_white() {
        let png = encode_png(&floor_plan());
        let config = PathConfig {
            draw_on_original: false,
            ..PathConfig::default()
        };
        let staged =
            compute_path_staged(&png, GridPoint::new(2, 2), GridPoint::new(2, 5), &config).unwrap();
        assert_eq!(staged.rendered.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(staged.rendered.get_pixel(10, 10).0, [255, 255, 255]);
    }
}
