use crate::error::{PageGridError, Result};
use crate::fonts::StandardFont;
use crate::intake::InputImage;
use crate::model::{Layout, Rect};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tracing::{instrument, warn};

/// Options for rasterizing a layout preview.
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Output width in pixels; the height follows the page aspect ratio.
    pub width_px: u32,
    pub background: [u8; 4],
    /// Draw a 1px gray rectangle around the usable area.
    pub margin_guide: bool,
    /// Draw red outlines on image rects and blue outlines on caption rects (debug).
    pub outlines: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            width_px: 800,
            background: [255, 255, 255, 255],
            margin_guide: true,
            outlines: false,
        }
    }
}

/// Pixel rect clamped to the canvas. Returns None when nothing is left.
fn to_pixels(r: &Rect, cw: u32, ch: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = r.x.round().max(0.0);
    let y0 = r.y.round().max(0.0);
    let x1 = r.right().round().min(cw as f64);
    let y1 = r.bottom().round().min(ch as f64);
    if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
        return None;
    }
    Some((x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    for yy in y..(y + h).min(ch) {
        for xx in x..(x + w).min(cw) {
            canvas.put_pixel(xx, yy, color);
        }
    }
}

/// 1px outline on the rect bounds, clipped to the canvas.
fn stroke_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let by = y + h - 1;
    let rx = x + w - 1;
    for xx in x..=rx {
        if xx < cw && y < ch {
            canvas.put_pixel(xx, y, color);
        }
        if xx < cw && by < ch {
            canvas.put_pixel(xx, by, color);
        }
    }
    for yy in y..=by {
        if x < cw && yy < ch {
            canvas.put_pixel(x, yy, color);
        }
        if rx < cw && yy < ch {
            canvas.put_pixel(rx, yy, color);
        }
    }
}

/// Rasterizes `layout` onto a preview canvas using the top-down rectangles.
///
/// Images are resized to their scaled rect. Captions are drawn as a bar in the caption
/// color as wide as the text run in its standard font; glyph rendering is left to the host.
#[instrument(skip_all, fields(images = inputs.len(), width_px = opts.width_px))]
pub fn render_preview(
    inputs: &[InputImage],
    layout: &Layout,
    opts: &PreviewOptions,
) -> Result<RgbaImage> {
    if opts.width_px == 0 {
        return Err(PageGridError::InvalidInput(
            "preview width must be positive".into(),
        ));
    }
    if inputs.len() != layout.placements.len() {
        return Err(PageGridError::InvalidInput(format!(
            "{} images but {} placements",
            inputs.len(),
            layout.placements.len()
        )));
    }

    let scale = layout.preview_scale(opts.width_px as f64);
    let cw = opts.width_px;
    let ch = ((layout.meta.page.height * scale).round() as u32).max(1);
    let mut canvas = RgbaImage::from_pixel(cw, ch, Rgba(opts.background));

    if opts.margin_guide {
        if let Some((x, y, w, h)) = to_pixels(&layout.grid.usable.scaled(scale), cw, ch) {
            stroke_rect(&mut canvas, x, y, w, h, Rgba([160, 160, 160, 255]));
        }
    }

    for (i, (input, placement)) in inputs.iter().zip(&layout.placements).enumerate() {
        let image_rect = placement.image.top_down().scaled(scale);
        match to_pixels(&image_rect, cw, ch) {
            Some((x, y, w, h)) => {
                let resized = imageops::resize(&input.image.to_rgba8(), w, h, FilterType::Triangle);
                imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
                if opts.outlines {
                    stroke_rect(&mut canvas, x, y, w, h, Rgba([255, 0, 0, 255]));
                }
            }
            None => {
                warn!(index = i, key = %input.key, "image rect under one pixel, skipped");
                continue;
            }
        }

        let caption_rect = placement.caption.top_down().scaled(scale);
        if opts.outlines {
            if let Some((x, y, w, h)) = to_pixels(&caption_rect, cw, ch) {
                stroke_rect(&mut canvas, x, y, w, h, Rgba([0, 0, 255, 255]));
            }
        }
        if let Some(caption) = &input.caption {
            let text_width = StandardFont::from_family(&caption.font_family)
                .text_width(&caption.text, caption.font_size)
                .min(placement.caption.width);
            let bar = Rect::new(
                placement.caption_text_x(text_width),
                placement.caption.y_top,
                text_width,
                placement.caption.height,
            )
            .scaled(scale);
            if let Some((x, y, w, h)) = to_pixels(&bar, cw, ch) {
                let [r, g, b] = caption.color;
                fill_rect(&mut canvas, x, y, w, h, Rgba([r, g, b, 255]));
            }
        }
    }

    Ok(canvas)
}
