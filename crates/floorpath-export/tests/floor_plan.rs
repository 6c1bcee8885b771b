//! Integration test: route across a synthesized floor plan and export the
//! result as SVG and JSON.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use floorpath_pipeline::{GridPoint, OutputFormat, PathConfig};

/// 60x40 plan with two rooms joined by a doorway in the dividing wall,
/// and a gray (still walkable) rug in the left room.
fn floor_plan_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(60, 40, |x, y| {
        let outer = x < 2 || y < 2 || x >= 58 || y >= 38;
        let divider = (29..31).contains(&x) && !(18..24).contains(&y);
        let rug = (8..20).contains(&x) && (8..16).contains(&y);
        if outer || divider {
            image::Rgb([20, 20, 20])
        } else if rug {
            image::Rgb([190, 190, 190])
        } else {
            image::Rgb([250, 250, 250])
        }
    });
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )
    .unwrap();
    buf
}

#[test]
fn floor_plan_route_to_svg_and_json() {
    let png = floor_plan_png();
    let start = GridPoint::new(5, 5);
    let end = GridPoint::new(34, 54);
    let config = PathConfig {
        output_format: OutputFormat::Png,
        ..PathConfig::default()
    };

    let result = floorpath_pipeline::compute_path(&png, start, end, &config)
        .expect("rooms are connected through the doorway");

    assert_eq!(result.path.first(), Some(&start));
    assert_eq!(result.path.last(), Some(&end));
    assert!(result.path.is_contiguous());
    assert_eq!(
        result.path.len(),
        start.manhattan_distance(end) as usize + 1,
        "doorway lies between start and end rows, so no detour is needed"
    );
    assert!(
        result
            .path
            .points()
            .iter()
            .filter(|p| (29..31).contains(&p.col))
            .all(|p| (18..24).contains(&p.row)),
        "route crosses the divider only at the doorway"
    );

    let config_json = serde_json::to_string(&config).unwrap();
    let svg = floorpath_export::to_svg(
        &result.path,
        result.dimensions,
        &floorpath_export::SvgMetadata {
            title: Some("two rooms"),
            description: None,
            config_json: Some(&config_json),
        },
    );
    assert!(svg.contains(r#"viewBox="0 0 60 40""#));
    assert!(svg.contains("<path"));
    assert!(svg.contains("M5.5,5.5"));

    let json = floorpath_export::to_json(&result).unwrap();
    let response = floorpath_export::PathResponse::from_json(&json).unwrap();
    assert_eq!(response.length, result.path.len());
    assert_eq!(response.format, "image/png");
    assert_eq!(response.grid_path(), result.path);

    let rendered = image::load_from_memory(&response.rendered_bytes().unwrap())
        .unwrap()
        .into_rgb8();
    assert_eq!(rendered.dimensions(), (60, 40));
    assert_eq!(rendered.get_pixel(5, 5).0, [255, 0, 0]);
    assert_eq!(rendered.get_pixel(54, 34).0, [255, 0, 0]);
}
