use image::{DynamicImage, Rgba, RgbaImage};
use page_grid_core::intake::parse_hex_color;
use page_grid_core::prelude::*;

fn solid(w: u32, h: u32, c: [u8; 4]) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(c)))
}

fn cfg() -> LayoutConfig {
    LayoutConfig::builder()
        .with_page(400.0, 400.0)
        .uniform_margin(20.0)
        .item_spacing(10.0)
        .build()
}

#[test]
fn preview_draws_images_in_their_rects() {
    let inputs = vec![
        InputImage::new("red", solid(40, 20, [255, 0, 0, 255])),
        InputImage::new("green", solid(20, 40, [0, 255, 0, 255])),
    ];
    let layout = layout_images(&inputs, &cfg()).expect("layout");
    let opts = PreviewOptions {
        width_px: 200,
        ..Default::default()
    };
    let canvas = render_preview(&inputs, &layout, &opts).expect("render");
    assert_eq!(canvas.dimensions(), (200, 200));

    let scale = 0.5;
    for (i, expected) in [[255, 0, 0, 255], [0, 255, 0, 255]].iter().enumerate() {
        let r = layout.placements[i].image.top_down().scaled(scale);
        let cx = (r.x + r.w / 2.0) as u32;
        let cy = (r.y + r.h / 2.0) as u32;
        assert_eq!(canvas.get_pixel(cx, cy).0, *expected, "center of image {}", i);
    }
    // corners stay background
    assert_eq!(canvas.get_pixel(0, 0).0, [255, 255, 255, 255]);
}

#[test]
fn caption_bar_uses_caption_color() {
    let mut caption = Caption::new("a caption");
    caption.color = parse_hex_color("#0000ff").expect("color");
    caption.font_size = 20.0;
    let inputs = vec![InputImage::new("a", solid(30, 30, [0, 0, 0, 255])).with_caption(caption)];
    let layout = layout_images(&inputs, &cfg()).expect("layout");
    let canvas = render_preview(&inputs, &layout, &PreviewOptions::default()).expect("render");

    let p = &layout.placements[0];
    let scale = 800.0 / 400.0;
    let cx = ((p.caption.x + p.caption.width / 2.0) * scale) as u32;
    let cy = ((p.caption.y_top + p.caption.height / 2.0) * scale) as u32;
    assert_eq!(canvas.get_pixel(cx, cy).0, [0, 0, 255, 255]);
}

#[test]
fn mismatched_inputs_are_rejected() {
    let inputs = vec![InputImage::new("a", solid(10, 10, [0, 0, 0, 255]))];
    let layout = layout_images(&inputs, &cfg()).expect("layout");
    let result = render_preview(&[], &layout, &PreviewOptions::default());
    assert!(matches!(result, Err(PageGridError::InvalidInput(_))));

    let opts = PreviewOptions {
        width_px: 0,
        ..Default::default()
    };
    assert!(render_preview(&inputs, &layout, &opts).is_err());
}

#[test]
fn degenerate_items_are_skipped() {
    let mut caption = Caption::new("huge");
    caption.font_size = 500.0;
    let inputs = vec![InputImage::new("a", solid(10, 10, [9, 9, 9, 255])).with_caption(caption)];
    let layout = layout_images(&inputs, &cfg()).expect("layout");
    assert!(layout.placements[0].image.height <= 0.0);
    let canvas = render_preview(&inputs, &layout, &PreviewOptions::default()).expect("render");
    assert!(canvas.pixels().all(|p| p.0 != [9, 9, 9, 255]));
}
