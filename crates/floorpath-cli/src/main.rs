//! floorpath: find and draw a walkable route on a floor-plan image.
//!
//! Runs the routing pipeline on an image file, writes the rendered route
//! (and optionally SVG and JSON exports), and prints per-stage
//! diagnostics. Repeated runs (`--runs`) summarize timings, which is
//! useful for:
//!
//! - Tuning the binarization threshold for a scanned plan
//! - Checking whether marker removal or downsampling is needed
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin floorpath -- <IMAGE> --start R,C --end R,C [OPTIONS]
//! ```
//!
//! Set `RUST_LOG=debug` for pipeline logging.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use floorpath_pipeline::diagnostics::{Clock, PathDiagnostics};
use floorpath_pipeline::{DownsampleFilter, GridPoint, OutputFormat, PathConfig, PathResult};

/// Find and draw a walkable route on a floor-plan image.
///
/// Light pixels are floor, dark pixels are walls. Cells are given as
/// `ROW,COL` with `0,0` at the top-left corner.
#[derive(Parser)]
#[command(name = "floorpath", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Start cell as `ROW,COL`.
    #[arg(long, value_parser = parse_point)]
    start: GridPoint,

    /// End cell as `ROW,COL`.
    #[arg(long, value_parser = parse_point)]
    end: GridPoint,

    /// Luminance (0-255) at or above which a pixel is walkable.
    #[arg(long, default_value_t = PathConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Draw the route on the black-and-white mask instead of the original.
    #[arg(long)]
    draw_on_mask: bool,

    /// Paint red and green annotation markers white before binarizing.
    #[arg(long)]
    marker_removal: bool,

    /// Working resolution (max dimension in pixels after downsampling).
    #[arg(long, default_value_t = PathConfig::DEFAULT_WORKING_RESOLUTION, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    working_resolution: u32,

    /// Downsample filter; `disabled` keeps the source resolution.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    downsample_filter: Filter,

    /// Encoding of the rendered image.
    #[arg(long, value_enum, default_value_t = Format::Jpeg)]
    format: Format,

    /// JPEG quality (1-100).
    #[arg(long, default_value_t = PathConfig::DEFAULT_JPEG_QUALITY, value_parser = clap::builder::RangedU64ValueParser::<u8>::new().range(1..=100))]
    quality: u8,

    /// Rendered image output path [default: `<IMAGE stem>-route.<ext>`
    /// next to the input].
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Write the route as SVG to this file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the JSON route response to this file.
    #[arg(long)]
    json: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    report_json: bool,

    /// Full path config as a JSON string.
    ///
    /// When provided, all other routing parameter flags are ignored.
    /// The JSON must be a valid `PathConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Downsample resampling filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Disabled: keep the source resolution regardless of image size.
    Disabled,
    /// Nearest-neighbor (fastest, keeps thin walls crisp).
    Nearest,
    /// Bilinear interpolation.
    Triangle,
    /// Bicubic Catmull-Rom.
    CatmullRom,
    /// Gaussian.
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

/// Maps a [`DownsampleFilter`] to the local CLI [`Filter`] enum.
const fn filter_from_pipeline(f: DownsampleFilter) -> Filter {
    match f {
        DownsampleFilter::None => Filter::Disabled,
        DownsampleFilter::Nearest => Filter::Nearest,
        DownsampleFilter::Triangle => Filter::Triangle,
        DownsampleFilter::CatmullRom => Filter::CatmullRom,
        DownsampleFilter::Gaussian => Filter::Gaussian,
        DownsampleFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// The CLI default filter, derived from [`PathConfig::DEFAULT_DOWNSAMPLE_FILTER`]
/// so the two cannot silently diverge.
const CLI_DEFAULT_FILTER: Filter = filter_from_pipeline(PathConfig::DEFAULT_DOWNSAMPLE_FILTER);

/// Rendered image encoding selection.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Lossy JPEG (see `--quality`).
    Jpeg,
    /// Lossless PNG.
    Png,
}

/// Parse a `ROW,COL` cell.
fn parse_point(s: &str) -> Result<GridPoint, String> {
    let (row, col) = s
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL, got {s:?}"))?;
    let row = row
        .trim()
        .parse()
        .map_err(|e| format!("invalid row {row:?}: {e}"))?;
    let col = col
        .trim()
        .parse()
        .map_err(|e| format!("invalid column {col:?}: {e}"))?;
    Ok(GridPoint::new(row, col))
}

/// Build a [`PathConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<PathConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        PathConfig {
            threshold: cli.threshold,
            draw_on_original: !cli.draw_on_mask,
            marker_removal: cli.marker_removal,
            working_resolution: cli.working_resolution,
            downsample_filter: match cli.downsample_filter {
                Filter::Disabled => DownsampleFilter::None,
                Filter::Nearest => DownsampleFilter::Nearest,
                Filter::Triangle => DownsampleFilter::Triangle,
                Filter::CatmullRom => DownsampleFilter::CatmullRom,
                Filter::Gaussian => DownsampleFilter::Gaussian,
                Filter::Lanczos3 => DownsampleFilter::Lanczos3,
            },
            output_format: match cli.format {
                Format::Jpeg => OutputFormat::Jpeg {
                    quality: cli.quality,
                },
                Format::Png => OutputFormat::Png,
            },
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Default rendered output path: `<stem>-route.<ext>` beside the input.
fn default_output_path(image_path: &Path, format: OutputFormat) -> PathBuf {
    let stem = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("floorpath");
    image_path.with_file_name(format!("{stem}-route.{}", format.extension()))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Route: {} -> {}", cli.start, cli.end);
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match floorpath_pipeline::compute_path_with_diagnostics(
            &image_bytes,
            cli.start,
            cli.end,
            &config,
            &StdClock,
        ) {
            Ok((result, diagnostics)) => {
                if cli.report_json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write outputs on the first run only.
                if run == 0 && !write_outputs(&cli, &config, &result) {
                    return ExitCode::FAILURE;
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                log::debug!("pipeline failed: {e:?}");
                eprintln!("Routing error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write the rendered image and the requested exports. Returns `false`
/// if any write failed.
fn write_outputs(cli: &Cli, config: &PathConfig, result: &PathResult) -> bool {
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.image_path, result.format));
    let mut ok = write_file(&output_path, &result.rendered, "Rendered route");

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("floorpath");
        let desc = format!("route {} -> {}, {} cells", cli.start, cli.end, result.path.len());
        let config_json = serde_json::to_string(config).ok();
        let metadata = floorpath_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
            config_json: config_json.as_deref(),
        };
        let svg = floorpath_export::to_svg(&result.path, result.dimensions, &metadata);
        ok &= write_file(svg_path, svg.as_bytes(), "SVG");
    }

    if let Some(ref json_path) = cli.json {
        match floorpath_export::to_json(result) {
            Ok(json) => ok &= write_file(json_path, json.as_bytes(), "JSON"),
            Err(e) => {
                eprintln!("Error serializing route: {e}");
                ok = false;
            }
        }
    }

    ok
}

fn write_file(path: &Path, bytes: &[u8], what: &str) -> bool {
    match std::fs::write(path, bytes) {
        Ok(()) => {
            eprintln!("{what} written to {} ({} bytes)", path.display(), bytes.len());
            true
        }
        Err(e) => {
            eprintln!("Error writing {what} to {}: {e}", path.display());
            false
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PathDiagnostics) -> Option<Duration>;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PathDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Decode", |d| Some(d.decode.duration)),
        ("Downsample", |d| Some(d.downsample.duration)),
        ("Marker Removal", |d| {
            d.marker_removal.as_ref().map(|s| s.duration)
        }),
        ("Binarize", |d| Some(d.binarize.duration)),
        ("Graph Build", |d| Some(d.graph_build.duration)),
        ("Search", |d| Some(d.search.duration)),
        ("Render", |d| Some(d.render.duration)),
        ("Encode", |d| Some(d.encode.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
