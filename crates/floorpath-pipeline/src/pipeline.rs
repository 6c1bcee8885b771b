//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::compute_path`] which runs the whole route computation
//! in one call, [`Pipeline`] lets the caller drive execution one step at
//! a time:
//!
//! ```rust
//! # use floorpath_pipeline::{GridPoint, PathConfig, PathError, Pipeline};
//! # fn run(png: &[u8]) -> Result<(), PathError> {
//! let routed = Pipeline::new(png, PathConfig::default())
//!     .decode()?
//!     .downsample()
//!     .remove_markers()
//!     .binarize()?
//!     .build_graph()
//!     .find_path(GridPoint::new(10, 10), GridPoint::new(200, 340))?;
//!
//! println!("{} cells", routed.path().len());
//! let staged = routed.render().into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying the intermediates later
//! stages need. The navigation graph is the largest of them and is
//! dropped once the route has been found; only its counts are kept.

use crate::binarize::BinaryMask;
use crate::diagnostics::StageMetrics;
use crate::graph::NavigationGraph;
use crate::types::{
    Dimensions, GridPath, GridPoint, PathConfig, PathError, PathResult, RgbImage, StagedResult,
};

/// Entry point for stage-by-stage execution.
pub struct Pipeline;

impl Pipeline {
    /// Start a pipeline over encoded image bytes.
    ///
    /// The bytes are borrowed until [`Pending::decode`] runs.
    pub const fn new(source: &[u8], config: PathConfig) -> Pending<'_> {
        Pending { config, source }
    }
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
#[must_use = "pipeline stages are consumed by advancing; call .decode() to continue"]
pub struct Pending<'a> {
    config: PathConfig,
    source: &'a [u8],
}

impl Pending<'_> {
    /// The raw source image bytes.
    #[must_use]
    pub const fn source(&self) -> &[u8] {
        self.source
    }

    /// Decode the source image and advance to the [`Decoded`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidImage`] if the bytes are empty, the
    /// format is unrecognized or corrupt, or the image has no pixels.
    pub fn decode(self) -> Result<Decoded, PathError> {
        let image = crate::grayscale::decode(self.source)?;
        Ok(Decoded {
            config: self.config,
            image,
            source_len: self.source.len(),
        })
    }
}

// ───────────────────────── Stage 1: Decoded ──────────────────────────

/// Pipeline state after decoding the source image to RGB.
#[must_use = "pipeline stages are consumed by advancing; call .downsample() to continue"]
pub struct Decoded {
    config: PathConfig,
    image: RgbImage,
    source_len: usize,
}

impl Decoded {
    /// The decoded image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Decode {
            input_bytes: self.source_len,
            width: self.image.width(),
            height: self.image.height(),
            pixel_count: dimensions_of(&self.image).pixel_count(),
        }
    }

    /// Resize to the working resolution (a no-op unless enabled in the
    /// config) and advance to the [`Downsampled`] stage.
    pub fn downsample(self) -> Downsampled {
        let source_dimensions = dimensions_of(&self.image);
        let resized = crate::downsample::downsample(
            &self.image,
            self.config.working_resolution,
            self.config.downsample_filter,
        );
        let applied = resized.is_some();
        Downsampled {
            config: self.config,
            working: resized.unwrap_or(self.image),
            source_dimensions,
            applied,
        }
    }
}

// ───────────────────────── Stage 2: Downsampled ──────────────────────

/// Pipeline state after the optional working-resolution resize.
///
/// From here on every coordinate refers to the working image.
#[must_use = "pipeline stages are consumed by advancing; call .remove_markers() to continue"]
pub struct Downsampled {
    config: PathConfig,
    working: RgbImage,
    source_dimensions: Dimensions,
    applied: bool,
}

impl Downsampled {
    /// The working image.
    #[must_use]
    pub const fn working(&self) -> &RgbImage {
        &self.working
    }

    /// Whether a resize actually happened.
    #[must_use]
    pub const fn applied(&self) -> bool {
        self.applied
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Downsample {
            original_width: self.source_dimensions.width,
            original_height: self.source_dimensions.height,
            width: self.working.width(),
            height: self.working.height(),
            applied: self.applied,
            filter: self.config.downsample_filter.to_string(),
        }
    }

    /// Paint annotation markers white when `config.marker_removal` is set
    /// and advance to the [`Cleaned`] stage.
    pub fn remove_markers(self) -> Cleaned {
        let cleaned = self
            .config
            .marker_removal
            .then(|| crate::marker::remove_markers(&self.working));
        Cleaned {
            config: self.config,
            working: self.working,
            cleaned,
        }
    }
}

// ───────────────────────── Stage 3: Cleaned ──────────────────────────

/// Pipeline state after optional marker removal.
///
/// The working image is kept untouched for rendering; the cleaned copy
/// (if any) only feeds binarization.
#[must_use = "pipeline stages are consumed by advancing; call .binarize() to continue"]
pub struct Cleaned {
    config: PathConfig,
    working: RgbImage,
    cleaned: Option<RgbImage>,
}

impl Cleaned {
    /// The image binarization will read.
    #[must_use]
    pub fn binarization_input(&self) -> &RgbImage {
        self.cleaned.as_ref().unwrap_or(&self.working)
    }

    /// Metrics for this stage, or `None` when marker removal is disabled.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        let cleaned = self.cleaned.as_ref()?;
        let changed_pixels = self
            .working
            .pixels()
            .zip(cleaned.pixels())
            .filter(|(a, b)| a != b)
            .count();
        Some(StageMetrics::MarkerRemoval {
            changed_pixels: changed_pixels as u64,
        })
    }

    /// Threshold the image into a walkability mask and advance to the
    /// [`Binarized`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidImage`] if the image has no pixels.
    pub fn binarize(self) -> Result<Binarized, PathError> {
        let mask = crate::binarize::binarize(self.binarization_input(), self.config.threshold)?;
        Ok(Binarized {
            config: self.config,
            working: self.working,
            mask,
        })
    }
}

// ───────────────────────── Stage 4: Binarized ────────────────────────

/// Pipeline state after binarization.
#[must_use = "pipeline stages are consumed by advancing; call .build_graph() to continue"]
pub struct Binarized {
    config: PathConfig,
    working: RgbImage,
    mask: BinaryMask,
}

impl Binarized {
    /// The walkability mask.
    #[must_use]
    pub const fn mask(&self) -> &BinaryMask {
        &self.mask
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Binarize {
            threshold: self.config.threshold,
            walkable_count: self.mask.walkable_count() as u64,
            total_count: self.mask.dimensions().pixel_count(),
        }
    }

    /// Build the navigation graph and advance to the [`GraphBuilt`] stage.
    pub fn build_graph(self) -> GraphBuilt {
        let graph = crate::graph::build_graph(&self.mask);
        GraphBuilt {
            config: self.config,
            working: self.working,
            mask: self.mask,
            graph,
        }
    }
}

// ───────────────────────── Stage 5: GraphBuilt ───────────────────────

/// Pipeline state after navigation graph construction.
///
/// [`find_path`](Self::find_path) borrows nothing from the request, so
/// callers that want several routes over one plan can run
/// [`crate::search::shortest_path`] against [`graph`](Self::graph)
/// directly before advancing.
#[must_use = "pipeline stages are consumed by advancing; call .find_path() to continue"]
pub struct GraphBuilt {
    config: PathConfig,
    working: RgbImage,
    mask: BinaryMask,
    graph: NavigationGraph,
}

impl GraphBuilt {
    /// The navigation graph.
    #[must_use]
    pub const fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::GraphBuild {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
        }
    }

    /// Search for a route and advance to the [`Routed`] stage.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::InvalidNode`] if `start` or `end` is out of
    /// bounds or blocked, and [`PathError::NoPathFound`] if they are not
    /// connected.
    pub fn find_path(self, start: GridPoint, end: GridPoint) -> Result<Routed, PathError> {
        let path = crate::search::shortest_path(&self.graph, start, end)?;
        Ok(Routed {
            config: self.config,
            working: self.working,
            mask: self.mask,
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            start,
            end,
            path,
        })
    }
}

// ───────────────────────── Stage 6: Routed ───────────────────────────

/// Pipeline state after the route has been found.
#[must_use = "pipeline stages are consumed by advancing; call .render() to continue"]
pub struct Routed {
    config: PathConfig,
    working: RgbImage,
    mask: BinaryMask,
    node_count: usize,
    edge_count: usize,
    start: GridPoint,
    end: GridPoint,
    path: GridPath,
}

impl Routed {
    /// The route from start to end.
    #[must_use]
    pub const fn path(&self) -> &GridPath {
        &self.path
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Search {
            start: self.start,
            end: self.end,
            path_len: self.path.len(),
            straight_line: self.start.distance(self.end),
        }
    }

    /// Draw the route and advance to the [`Rendered`] stage.
    pub fn render(self) -> Rendered {
        let rendered = crate::render::render_path(
            &self.working,
            &self.mask,
            &self.path,
            self.config.draw_on_original,
        );
        Rendered {
            config: self.config,
            working: self.working,
            mask: self.mask,
            node_count: self.node_count,
            edge_count: self.edge_count,
            path: self.path,
            rendered,
        }
    }
}

// ───────────────────────── Stage 7: Rendered ─────────────────────────

/// Terminal pipeline state: the route has been drawn.
///
/// Finish with [`encode`](Self::encode) for the transport result or
/// [`into_result`](Self::into_result) to keep every intermediate.
#[must_use = "call .encode() or .into_result() to obtain the output"]
pub struct Rendered {
    config: PathConfig,
    working: RgbImage,
    mask: BinaryMask,
    node_count: usize,
    edge_count: usize,
    path: GridPath,
    rendered: RgbImage,
}

impl Rendered {
    /// The route from start to end.
    #[must_use]
    pub const fn path(&self) -> &GridPath {
        &self.path
    }

    /// The unencoded rendered image.
    #[must_use]
    pub const fn rendered(&self) -> &RgbImage {
        &self.rendered
    }

    /// Working image dimensions.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        dimensions_of(&self.working)
    }

    /// Nodes in the navigation graph.
    #[must_use]
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Edges in the navigation graph.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Metrics for this stage.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Render {
            on_original: self.config.draw_on_original,
            segment_count: self.path.step_count(),
        }
    }

    /// Encode the rendered image in the configured format.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::Encode`] if the encoder fails.
    pub fn encode(self) -> Result<PathResult, PathError> {
        let format = self.config.output_format;
        let rendered = crate::render::encode(&self.rendered, format)?;
        Ok(PathResult {
            dimensions: dimensions_of(&self.working),
            path: self.path,
            rendered,
            format,
        })
    }

    /// Consume the pipeline and keep every intermediate.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            dimensions: dimensions_of(&self.working),
            original: self.working,
            mask: self.mask.into_image(),
            node_count: self.node_count,
            edge_count: self.edge_count,
            path: self.path,
            rendered: self.rendered,
        }
    }
}

fn dimensions_of(image: &RgbImage) -> Dimensions {
    Dimensions {
        width: image.width(),
        height: image.height(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::downsample::DownsampleFilter;
    use crate::test_support::{encode_png, floor_plan};
    use crate::types::OutputFormat;

    const START: GridPoint = GridPoint::new(2, 2);
    const END: GridPoint = GridPoint::new(17, 27);

    #[test]
    fn stages_expose_intermediates() {
        let png = encode_png(&floor_plan());
        let decoded = Pipeline::new(&png, PathConfig::default()).decode().unwrap();
        assert_eq!(decoded.image().dimensions(), (30, 20));

        let downsampled = decoded.downsample();
        assert!(!downsampled.applied());

        let binarized = downsampled.remove_markers().binarize().unwrap();
        assert!(binarized.mask().is_walkable(START));
        assert!(!binarized.mask().is_walkable(GridPoint::new(0, 0)));

        let built = binarized.build_graph();
        assert!(built.graph().contains(END));

        let routed = built.find_path(START, END).unwrap();
        assert_eq!(routed.path().first(), Some(&START));
        assert_eq!(routed.path().last(), Some(&END));

        let staged = routed.render().into_result();
        assert_eq!(staged.dimensions.width, 30);
        assert_eq!(staged.mask.dimensions(), (30, 20));
        assert!(staged.node_count > 0);
    }

    #[test]
    fn pending_keeps_source() {
        let png = encode_png(&floor_plan());
        let pending = Pipeline::new(&png, PathConfig::default());
        assert_eq!(pending.source().len(), png.len());
    }

    #[test]
    fn marker_stage_is_skipped_when_disabled() {
        let png = encode_png(&floor_plan());
        let cleaned = Pipeline::new(&png, PathConfig::default())
            .decode()
            .unwrap()
            .downsample()
            .remove_markers();
        assert!(cleaned.metrics().is_none());
    }

    #[test]
    fn marker_removal_opens_painted_doorway() {
        // Paint a red marker over the only doorway: blocked unless removed.
        let mut plan = floor_plan();
        for y in 14..19 {
            for x in 13..18 {
                plan.put_pixel(x, y, image::Rgb([230, 10, 10]));
            }
        }
        let png = encode_png(&plan);

        let err = crate::compute_path(&png, START, END, &PathConfig::default()).unwrap_err();
        assert!(matches!(err, PathError::NoPathFound { .. }));

        let config = PathConfig {
            marker_removal: true,
            ..PathConfig::default()
        };
        let cleaned = Pipeline::new(&png, config)
            .decode()
            .unwrap()
            .downsample()
            .remove_markers();
        assert!(matches!(
            cleaned.metrics(),
            Some(StageMetrics::MarkerRemoval { changed_pixels }) if changed_pixels >= 25
        ));
        let routed = cleaned.binarize().unwrap().build_graph().find_path(START, END);
        assert!(routed.is_ok());
    }

    #[test]
    fn downsample_rescales_coordinates() {
        let png = encode_png(&floor_plan());
        let config = PathConfig {
            downsample_filter: DownsampleFilter::Nearest,
            working_resolution: 15,
            ..PathConfig::default()
        };
        let downsampled = Pipeline::new(&png, config).decode().unwrap().downsample();
        assert!(downsampled.applied());
        assert_eq!(downsampled.working().dimensions(), (15, 10));
        assert!(matches!(
            downsampled.metrics(),
            StageMetrics::Downsample {
                original_width: 30,
                width: 15,
                applied: true,
                ..
            }
        ));
    }

    #[test]
    fn encode_matches_configured_format() {
        let png = encode_png(&floor_plan());
        let config = PathConfig {
            output_format: OutputFormat::Png,
            ..PathConfig::default()
        };
        let rendered = Pipeline::new(&png, config)
            .decode()
            .unwrap()
            .downsample()
            .remove_markers()
            .binarize()
            .unwrap()
            .build_graph()
            .find_path(START, END)
            .unwrap()
            .render();
        let expected = rendered.rendered().clone();
        let result = rendered.encode().unwrap();
        assert_eq!(result.format, OutputFormat::Png);
        let decoded = image::load_from_memory(&result.rendered).unwrap().into_rgb8();
        assert_eq!(decoded, expected);
    }
}
