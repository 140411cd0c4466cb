use crate::model::{Layout, Rect};
use serde_json::{Value, json};

fn rect_json(r: &Rect, s: f64) -> Value {
    json!({"x": r.x * s, "y": r.y * s, "w": r.w * s, "h": r.h * s})
}

fn key_for<K: ToString>(keys: &[K], index: usize) -> String {
    keys.get(index)
        .map(ToString::to_string)
        .unwrap_or_else(|| index.to_string())
}

fn grid_json(layout: &Layout, s: f64) -> Value {
    let g = &layout.grid;
    json!({
        "cols": g.cols,
        "rows": g.rows,
        "cellWidth": g.cell_width * s,
        "cellHeight": g.cell_height * s,
        "blockWidth": g.block_width * s,
        "blockHeight": g.block_height * s,
    })
}

/// Serialize a layout in page coordinates: `y` is the lower edge measured from the
/// bottom of the page, ready for drawing calls against a document page.
/// Shape: `{ grid, placements: [{ key, index, image, caption, fittedToHeight }], meta }`.
pub fn to_json_page<K: ToString>(layout: &Layout, keys: &[K]) -> Value {
    let placements: Vec<Value> = layout
        .placements
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "key": key_for(keys, i),
                "index": i,
                "image": rect_json(&p.image.bottom_up(), 1.0),
                "caption": rect_json(&p.caption.bottom_up(), 1.0),
                "fittedToHeight": p.fitted_to_height,
            })
        })
        .collect();
    json!({
        "frame": "page",
        "grid": grid_json(layout, 1.0),
        "placements": placements,
        "meta": &layout.meta,
    })
}

/// Serialize a layout for an on-screen preview `preview_width` pixels wide: `y` is the
/// top edge measured downwards and every length is multiplied by `preview_width / page_width`.
pub fn to_json_preview<K: ToString>(layout: &Layout, keys: &[K], preview_width: f64) -> Value {
    let s = layout.preview_scale(preview_width);
    let placements: Vec<Value> = layout
        .placements
        .iter()
        .enumerate()
        .map(|(i, p)| {
            json!({
                "key": key_for(keys, i),
                "index": i,
                "image": rect_json(&p.image.top_down(), s),
                "caption": rect_json(&p.caption.top_down(), s),
                "fittedToHeight": p.fitted_to_height,
            })
        })
        .collect();
    json!({
        "frame": "preview",
        "scale": s,
        "size": {"w": preview_width, "h": layout.meta.page.height * s},
        "usable": rect_json(&layout.grid.usable, s),
        "grid": grid_json(layout, s),
        "placements": placements,
        "meta": &layout.meta,
    })
}
