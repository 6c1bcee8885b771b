//! SVG export serializer.
//!
//! Draws a route as a single `<path>` element using the [`svg`] crate
//! for document construction, XML escaping, and path data formatting.
//! The document's `viewBox` matches the image the route was computed on,
//! so the SVG can be laid over the rendered raster at any scale.
//!
//! Each cell maps to its pixel center: `(row, col)` becomes
//! `x = col + 0.5`, `y = row + 0.5`, the same points the raster renderer
//! strokes through.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use floorpath_pipeline::render::LINE_WIDTH;
use floorpath_pipeline::{Dimensions, GridPath, GridPoint};

/// Route stroke color.
const ROUTE_COLOR: &str = "red";
/// Start marker fill.
const START_COLOR: &str = "green";
/// End marker fill.
const END_COLOR: &str = "blue";
/// Radius of the start and end markers, in pixels.
const ENDPOINT_RADIUS: f32 = 2.5;

/// Metadata to embed in the SVG document.
///
/// All fields are optional. When present, `<title>`, `<desc>`, and a
/// `<metadata>` element are emitted immediately after the opening `<svg>`
/// tag.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`floorpath_pipeline::PathConfig`], emitted inside
    /// `<metadata>` as a namespaced `<floorpath:config>` element so the
    /// file records the settings that produced it.
    pub config_json: Option<&'a str>,
}

fn cell_center(p: GridPoint) -> (f32, f32) {
    #[allow(clippy::cast_precision_loss)]
    (p.col as f32 + 0.5, p.row as f32 + 0.5)
}

/// Build an SVG path `d` attribute string from a route.
///
/// Uses `M` for the first cell and `L` for subsequent cells. Returns an
/// empty string for routes with fewer than 2 cells.
///
/// # Examples
///
/// ```
/// use floorpath_pipeline::{GridPath, GridPoint};
/// use floorpath_export::build_path_data;
///
/// let path = GridPath::new(vec![GridPoint::new(2, 1), GridPoint::new(2, 2)]);
/// assert_eq!(build_path_data(&path), "M1.5,2.5 L2.5,2.5");
/// ```
#[must_use]
pub fn build_path_data(path: &GridPath) -> String {
    let [first, rest @ ..] = path.points() else {
        return String::new();
    };
    if rest.is_empty() {
        return String::new();
    }

    let mut data = Data::new().move_to(cell_center(*first));
    for p in rest {
        data = data.line_to(cell_center(*p));
    }
    String::from(Value::from(data))
}

fn endpoint_marker(p: GridPoint, fill: &str) -> Circle {
    let (cx, cy) = cell_center(p);
    Circle::new()
        .set("cx", cx)
        .set("cy", cy)
        .set("r", ENDPOINT_RADIUS)
        .set("fill", fill)
}

/// Serialize a route into an SVG document string.
///
/// The document is `dimensions` pixels in size with a matching `viewBox`.
/// The route is a red polyline with round caps and joins; the start and
/// end cells get small green and blue dots. A single-cell route has no
/// polyline, only its marker, and an empty route yields an empty document
/// body.
#[must_use]
pub fn to_svg(path: &GridPath, dimensions: Dimensions, metadata: &SvgMetadata<'_>) -> String {
    let w = dimensions.width;
    let h = dimensions.height;
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("floorpath:config");
        config_el.assign("xmlns:floorpath", "https://floorpath.dev/ns/1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    let d = build_path_data(path);
    if !d.is_empty() {
        doc = doc.add(
            Path::new()
                .set("d", d)
                .set("fill", "none")
                .set("stroke", ROUTE_COLOR)
                .set("stroke-width", LINE_WIDTH)
                .set("stroke-linecap", "round")
                .set("stroke-linejoin", "round"),
        );
    }

    if let Some(&start) = path.first() {
        doc = doc.add(endpoint_marker(start, START_COLOR));
    }
    if let Some(&end) = path.last()
        && path.len() > 1
    {
        doc = doc.add(endpoint_marker(end, END_COLOR));
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
