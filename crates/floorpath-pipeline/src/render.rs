//! Route overlay rendering and output encoding.
//!
//! The route is stroked with `tiny-skia` as a single polyline through the
//! centers of its cells: solid red, [`LINE_WIDTH`] pixels wide, round caps
//! and joins. Anti-aliasing is off so that the same path always colors
//! exactly the same pixels with exactly [`LINE_COLOR`].

use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tiny_skia::{IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::binarize::BinaryMask;
use crate::types::{GridPath, GridPoint, OutputFormat, PathError};

/// Stroke width of the route, in pixels.
pub const LINE_WIDTH: f32 = 3.0;

/// Stroke color of the route (RGB).
pub const LINE_COLOR: [u8; 3] = [255, 0, 0];

/// Expand the binary mask into an RGB image (walkable white, blocked black).
#[must_use = "returns the RGB mask image"]
pub fn mask_to_rgb(mask: &BinaryMask) -> RgbImage {
    let gray = mask.as_image();
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        image::Rgb([v, v, v])
    })
}

/// Draw `path` over the original image or over the mask.
///
/// With `draw_on_original` the base is `original`; otherwise it is the
/// mask expanded to RGB. Paths with fewer than two cells leave the base
/// unchanged.
#[must_use = "returns the rendered image"]
pub fn render_path(
    original: &RgbImage,
    mask: &BinaryMask,
    path: &GridPath,
    draw_on_original: bool,
) -> RgbImage {
    let base = if draw_on_original {
        original.clone()
    } else {
        mask_to_rgb(mask)
    };
    draw_path(base, path)
}

/// Pixel-center coordinate of a cell in drawing space (`x = col`, `y = row`).
#[allow(clippy::cast_precision_loss)]
fn cell_center(p: GridPoint) -> (f32, f32) {
    (p.col as f32 + 0.5, p.row as f32 + 0.5)
}

/// Stroke `path` onto `base` and return it.
#[must_use = "returns the image with the route drawn"]
pub fn draw_path(mut base: RgbImage, path: &GridPath) -> RgbImage {
    let points = path.points();
    let [first, rest @ ..] = points else {
        return base;
    };
    if rest.is_empty() {
        return base;
    }

    let mut pb = PathBuilder::new();
    let (x, y) = cell_center(*first);
    pb.move_to(x, y);
    for p in rest {
        let (x, y) = cell_center(*p);
        pb.line_to(x, y);
    }
    let Some(route) = pb.finish() else {
        return base;
    };

    let (width, height) = base.dimensions();
    let Some(size) = IntSize::from_wh(width, height) else {
        return base;
    };

    // The base is fully opaque, so its premultiplied and straight RGBA
    // forms are identical and can be copied in and out directly.
    let rgba: Vec<u8> = base
        .as_raw()
        .chunks_exact(3)
        .flat_map(|px| [px[0], px[1], px[2], 255])
        .collect();
    let Some(mut pixmap) = Pixmap::from_vec(rgba, size) else {
        return base;
    };

    let stroke = Stroke {
        width: LINE_WIDTH,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(LINE_COLOR[0], LINE_COLOR[1], LINE_COLOR[2], 255);
    paint.anti_alias = false;

    pixmap.stroke_path(&route, &paint, &stroke, Transform::identity(), None);

    for (px, rgba) in base.pixels_mut().zip(pixmap.data().chunks_exact(4)) {
        *px = image::Rgb([rgba[0], rgba[1], rgba[2]]);
    }
    base
}

/// Encode a rendered image for transport.
///
/// # Errors
///
/// Returns [`PathError::Encode`] if the encoder fails.
pub fn encode(image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, PathError> {
    let mut buf = Vec::new();
    let (width, height) = image.dimensions();
    match format {
        OutputFormat::Jpeg { quality } => {
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality).write_image(
                image.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut buf).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
    }
    .map_err(PathError::Encode)?;
    Ok(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const GRAY: [u8; 3] = [200, 200, 200];

    fn canvas(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb(GRAY))
    }

    fn horizontal_path(row: u32, cols: std::ops::RangeInclusive<u32>) -> GridPath {
        GridPath::new(cols.map(|c| GridPoint::new(row, c)).collect())
    }

    #[test]
    fn short_paths_leave_base_unchanged() {
        let base = canvas(10, 10);
        assert_eq!(draw_path(base.clone(), &GridPath::new(vec![])), base);
        assert_eq!(
            draw_path(base.clone(), &GridPath::new(vec![GridPoint::new(4, 4)])),
            base
        );
    }

    #[test]
    fn path_cells_are_painted_red() {
        let path = horizontal_path(5, 2..=12);
        let out = draw_path(canvas(20, 11), &path);
        for p in path.points() {
            assert_eq!(out.get_pixel(p.col, p.row).0, LINE_COLOR, "cell {p}");
        }
    }

    #[test]
    fn line_is_three_pixels_wide() {
        let out = draw_path(canvas(20, 11), &horizontal_path(5, 2..=12));
        // Middle of the run, away from the caps.
        assert_eq!(out.get_pixel(7, 4).0, LINE_COLOR);
        assert_eq!(out.get_pixel(7, 6).0, LINE_COLOR);
        assert_eq!(out.get_pixel(7, 3).0, GRAY);
        assert_eq!(out.get_pixel(7, 7).0, GRAY);
    }

    #[test]
    fn far_pixels_are_untouched() {
        let out = draw_path(canvas(20, 20), &horizontal_path(2, 0..=5));
        assert_eq!(out.get_pixel(15, 15).0, GRAY);
        assert_eq!(out.get_pixel(19, 2).0, GRAY);
    }

    #[test]
    fn row_col_maps_to_y_x() {
        // Vertical path in column 8: drawn at x = 8.
        let path = GridPath::new((1..=9).map(|r| GridPoint::new(r, 8)).collect());
        let out = draw_path(canvas(12, 12), &path);
        assert_eq!(out.get_pixel(8, 5).0, LINE_COLOR);
        assert_eq!(out.get_pixel(3, 5).0, GRAY);
    }

    #[test]
    fn drawing_is_deterministic() {
        let path = GridPath::new(vec![
            GridPoint::new(1, 1),
            GridPoint::new(1, 2),
            GridPoint::new(2, 2),
            GridPoint::new(3, 2),
            GridPoint::new(3, 3),
        ]);
        let a = draw_path(canvas(8, 8), &path);
        let b = draw_path(canvas(8, 8), &path);
        assert_eq!(a, b);
    }

    #[test]
    fn render_on_mask_uses_black_and_white_base() {
        let mask = BinaryMask::from_fn(6, 6, |p| p.row < 3);
        let original = canvas(6, 6);
        let out = render_path(&original, &mask, &GridPath::new(vec![]), false);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(0, 5).0, [0, 0, 0]);

        let out = render_path(&original, &mask, &GridPath::new(vec![]), true);
        assert_eq!(out, original);
    }

    #[test]
    fn png_encoding_round_trips_pixels() {
        let out = draw_path(canvas(16, 9), &horizontal_path(4, 1..=14));
        let bytes = encode(&out, OutputFormat::Png).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().into_rgb8();
        assert_eq!(decoded, out);
    }

    #[test]
    fn jpeg_encoding_produces_jpeg() {
        let bytes = encode(&canvas(16, 16), OutputFormat::Jpeg { quality: 80 }).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 16);
    }
}
