//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! [`compute_path_with_diagnostics`] runs the same stages as
//! [`crate::compute_path`] and records how long each took and what it
//! produced. The core never reads a clock itself: callers pass a
//! [`Clock`] so the crate stays free of platform time sources.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::types::{GridPoint, PathConfig, PathError, PathResult};

/// Source of monotonic timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single routing run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathDiagnostics {
    /// Image decoding.
    pub decode: StageDiagnostics,
    /// Working-resolution resize.
    pub downsample: StageDiagnostics,
    /// Marker removal (only when `config.marker_removal == true`).
    pub marker_removal: Option<StageDiagnostics>,
    /// Grayscale reduction and thresholding.
    pub binarize: StageDiagnostics,
    /// Navigation graph construction.
    pub graph_build: StageDiagnostics,
    /// A* search.
    pub search: StageDiagnostics,
    /// Route overlay drawing.
    pub render: StageDiagnostics,
    /// Output encoding.
    pub encode: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PathSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
        /// Total pixel count.
        pixel_count: u64,
    },
    /// Working-resolution resize.
    Downsample {
        /// Width before resizing.
        original_width: u32,
        /// Height before resizing.
        original_height: u32,
        /// Width after resizing.
        width: u32,
        /// Height after resizing.
        height: u32,
        /// Whether a resize actually happened.
        applied: bool,
        /// Filter name.
        filter: String,
    },
    /// Marker removal.
    MarkerRemoval {
        /// Number of pixels whose color changed.
        changed_pixels: u64,
    },
    /// Binarization.
    Binarize {
        /// Threshold used.
        threshold: u8,
        /// Number of walkable cells.
        walkable_count: u64,
        /// Total cell count.
        total_count: u64,
    },
    /// Graph construction.
    GraphBuild {
        /// Number of nodes.
        node_count: usize,
        /// Number of undirected edges.
        edge_count: usize,
    },
    /// A* search.
    Search {
        /// Requested start.
        start: GridPoint,
        /// Requested end.
        end: GridPoint,
        /// Number of cells on the route.
        path_len: usize,
        /// Euclidean distance between start and end.
        straight_line: f64,
    },
    /// Route drawing.
    Render {
        /// Whether the original image was the base.
        on_original: bool,
        /// Number of line segments drawn.
        segment_count: usize,
    },
    /// Output encoding.
    Encode {
        /// Encoder name.
        format: String,
        /// Encoded size in bytes.
        output_bytes: usize,
    },
}

/// High-level summary for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSummary {
    /// Working image width in pixels.
    pub image_width: u32,
    /// Working image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Nodes in the navigation graph.
    pub node_count: usize,
    /// Edges in the navigation graph.
    pub edge_count: usize,
    /// Cells on the route.
    pub path_len: usize,
}

impl PathDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Route Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Graph: {} nodes, {} edges  |  Route: {} cells",
            self.summary.node_count, self.summary.edge_count, self.summary.path_len,
        ));

        lines.join("\n")
    }

    /// Executed stages in pipeline order, with display names.
    #[must_use]
    pub fn stages(&self) -> Vec<(&'static str, &StageDiagnostics)> {
        let mut s = vec![("Decode", &self.decode), ("Downsample", &self.downsample)];
        if let Some(ref m) = self.marker_removal {
            s.push(("Marker Removal", m));
        }
        s.push(("Binarize", &self.binarize));
        s.push(("Graph Build", &self.graph_build));
        s.push(("Search", &self.search));
        s.push(("Render", &self.render));
        s.push(("Encode", &self.encode));
        s
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => format!("{input_bytes} bytes -> {width}x{height}"),
        StageMetrics::Downsample {
            original_width,
            original_height,
            width,
            height,
            applied,
            filter,
        } => {
            if *applied {
                format!("{original_width}x{original_height} -> {width}x{height} ({filter})")
            } else {
                format!("{width}x{height} (unchanged)")
            }
        }
        StageMetrics::MarkerRemoval { changed_pixels } => {
            format!("{changed_pixels} pixels painted white")
        }
        StageMetrics::Binarize {
            threshold,
            walkable_count,
            total_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_count > 0 {
                *walkable_count as f64 / *total_count as f64 * 100.0
            } else {
                0.0
            };
            format!("threshold={threshold} walkable={walkable_count} ({density:.1}%)")
        }
        StageMetrics::GraphBuild {
            node_count,
            edge_count,
        } => format!("{node_count} nodes, {edge_count} edges"),
        StageMetrics::Search {
            start,
            end,
            path_len,
            straight_line,
        } => format!("{start} -> {end}: {path_len} cells (straight line {straight_line:.1})"),
        StageMetrics::Render {
            on_original,
            segment_count,
        } => {
            let base = if *on_original { "original" } else { "mask" };
            format!("{segment_count} segments on {base}")
        }
        StageMetrics::Encode {
            format,
            output_bytes,
        } => format!("{format}, {output_bytes} bytes"),
    }
}

/// Run [`crate::compute_path`] while timing every stage with `clock`.
///
/// # Errors
///
/// Same as [`crate::compute_path`].
pub fn compute_path_with_diagnostics<C: Clock>(
    image_bytes: &[u8],
    start: GridPoint,
    end: GridPoint,
    config: &PathConfig,
    clock: &C,
) -> Result<(PathResult, PathDiagnostics), PathError> {
    config.validate()?;
    let run_start = clock.now();

    let t = clock.now();
    let decoded = Pipeline::new(image_bytes, config.clone()).decode()?;
    let decode = stage(clock, &t, decoded.metrics());

    let t = clock.now();
    let downsampled = decoded.downsample();
    let downsample = stage(clock, &t, downsampled.metrics());

    let t = clock.now();
    let cleaned = downsampled.remove_markers();
    let marker_removal = cleaned.metrics().map(|m| stage(clock, &t, m));

    let t = clock.now();
    let binarized = cleaned.binarize()?;
    let binarize = stage(clock, &t, binarized.metrics());

    let t = clock.now();
    let built = binarized.build_graph();
    let graph_build = stage(clock, &t, built.metrics());

    let t = clock.now();
    let routed = built.find_path(start, end)?;
    let search = stage(clock, &t, routed.metrics());

    let t = clock.now();
    let rendered = routed.render();
    let render = stage(clock, &t, rendered.metrics());

    let t = clock.now();
    let summary = PathSummary {
        image_width: rendered.dimensions().width,
        image_height: rendered.dimensions().height,
        pixel_count: rendered.dimensions().pixel_count(),
        node_count: rendered.node_count(),
        edge_count: rendered.edge_count(),
        path_len: rendered.path().len(),
    };
    let result = rendered.encode()?;
    let encode = stage(
        clock,
        &t,
        StageMetrics::Encode {
            format: result.format.to_string(),
            output_bytes: result.rendered.len(),
        },
    );

    let diagnostics = PathDiagnostics {
        decode,
        downsample,
        marker_removal,
        binarize,
        graph_build,
        search,
        render,
        encode,
        total_duration: clock.elapsed(&run_start),
        summary,
    };
    Ok((result, diagnostics))
}

fn stage<C: Clock>(clock: &C, since: &C::Instant, metrics: StageMetrics) -> StageDiagnostics {
    StageDiagnostics {
        duration: clock.elapsed(since),
        metrics,
    }
}
