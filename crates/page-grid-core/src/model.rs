use crate::config::{Margins, PageGeometry};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (points). `x,y` is top-left in the top-down frame; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
    /// Exclusive right edge (`x + w`).
    pub fn right(&self) -> f64 {
        self.x + self.w
    }
    /// Exclusive bottom edge (`y + h`), top-down frame.
    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
    /// Returns true if `r` is fully inside `self`, allowing `eps` of rounding slack.
    pub fn contains(&self, r: &Rect, eps: f64) -> bool {
        r.x >= self.x - eps
            && r.y >= self.y - eps
            && r.right() <= self.right() + eps
            && r.bottom() <= self.bottom() + eps
    }
    /// True if the interiors of `self` and `r` intersect.
    pub fn overlaps(&self, r: &Rect) -> bool {
        !(self.x >= r.right() || r.x >= self.right() || self.y >= r.bottom() || r.y >= self.bottom())
    }
    pub fn scaled(&self, s: f64) -> Rect {
        Rect::new(self.x * s, self.y * s, self.w * s, self.h * s)
    }
}

/// A rectangle carrying its vertical position in both coordinate frames.
///
/// `y_top` is measured from the top page edge downwards (screen preview);
/// `y_bottom` is the lower edge measured from the bottom page edge upwards
/// (page embedding). `y_bottom + height == page_height - y_top`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlacedRect {
    pub x: f64,
    pub y_top: f64,
    pub y_bottom: f64,
    pub width: f64,
    pub height: f64,
}

impl PlacedRect {
    pub(crate) fn from_top(x: f64, y_top: f64, width: f64, height: f64, page_height: f64) -> Self {
        Self {
            x,
            y_top,
            y_bottom: page_height - (y_top + height),
            width,
            height,
        }
    }
    /// Rectangle in the top-down frame.
    pub fn top_down(&self) -> Rect {
        Rect::new(self.x, self.y_top, self.width, self.height)
    }
    /// Rectangle in the bottom-up frame (`y` is the lower edge).
    pub fn bottom_up(&self) -> Rect {
        Rect::new(self.x, self.y_bottom, self.width, self.height)
    }
}

/// Image and caption rectangles for one item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub image: PlacedRect,
    pub caption: PlacedRect,
    /// True if the image was shrunk to the height left over after the caption band.
    pub fitted_to_height: bool,
}

impl Placement {
    /// X coordinate at which a text run of `text_width` is centered in the caption rect.
    pub fn caption_text_x(&self, text_width: f64) -> f64 {
        self.caption.x + self.caption.width / 2.0 - text_width / 2.0
    }
}

/// Selected grid and its cell/block sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Grid {
    pub cols: u32,
    pub rows: u32,
    pub cell_width: f64,
    pub cell_height: f64,
    /// Cell size minus item spacing.
    pub block_width: f64,
    pub block_height: f64,
    /// Usable page area (top-down frame).
    pub usable: Rect,
}

impl Grid {
    /// Top-down rectangle of the cell at `index` (row-major).
    pub fn cell(&self, index: usize) -> Rect {
        let cols = self.cols.max(1) as usize;
        let col = (index % cols) as f64;
        let row = (index / cols) as f64;
        Rect::new(
            self.usable.x + col * self.cell_width,
            self.usable.y + row * self.cell_height,
            self.cell_width,
            self.cell_height,
        )
    }
    /// Top-down rectangle of the drawable block inside the cell at `index`.
    pub fn block(&self, index: usize) -> Rect {
        let c = self.cell(index);
        Rect::new(c.x, c.y, self.block_width, self.block_height)
    }
}

/// Layout-level metadata (common fields used by exporters).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    /// Schema version for the JSON export; current: "1".
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub units: String,
    pub page: PageGeometry,
    pub margins: Margins,
    pub item_spacing: f64,
    /// Columns as requested (0 = auto).
    pub columns_requested: u32,
    pub caption_gap: f64,
}

/// Result of a placement run: the chosen grid plus one placement per item, in input order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Layout {
    pub grid: Grid,
    pub placements: Vec<Placement>,
    pub meta: Meta,
}

/// Statistics about how much of the usable area the images cover.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LayoutStats {
    pub num_items: usize,
    pub cols: u32,
    pub rows: u32,
    pub usable_area: f64,
    /// Sum of image width * height (degenerate items count as zero).
    pub image_area: f64,
    pub caption_area: f64,
    /// image_area / usable_area (0.0 to 1.0).
    pub coverage: f64,
    pub num_fitted_to_height: usize,
    /// Items left with a non-positive image height because the caption band filled the block.
    pub num_degenerate: usize,
}

impl Layout {
    /// Computes coverage statistics for this layout.
    pub fn stats(&self) -> LayoutStats {
        let usable_area = self.grid.usable.w * self.grid.usable.h;
        let mut image_area = 0.0;
        let mut caption_area = 0.0;
        let mut num_fitted_to_height = 0;
        let mut num_degenerate = 0;

        for p in &self.placements {
            if p.image.height <= 0.0 || p.image.width <= 0.0 {
                num_degenerate += 1;
            } else {
                image_area += p.image.width * p.image.height;
            }
            caption_area += p.caption.width.max(0.0) * p.caption.height;
            if p.fitted_to_height {
                num_fitted_to_height += 1;
            }
        }

        let coverage = if usable_area > 0.0 {
            image_area / usable_area
        } else {
            0.0
        };

        LayoutStats {
            num_items: self.placements.len(),
            cols: self.grid.cols,
            rows: self.grid.rows,
            usable_area,
            image_area,
            caption_area,
            coverage,
            num_fitted_to_height,
            num_degenerate,
        }
    }

    /// Top-down image and caption rectangles multiplied by `scale`
    /// (e.g. `preview_pixel_width / page_width`).
    pub fn scaled(&self, scale: f64) -> Vec<(Rect, Rect)> {
        self.placements
            .iter()
            .map(|p| (p.image.top_down().scaled(scale), p.caption.top_down().scaled(scale)))
            .collect()
    }

    /// Scale that maps page points onto a preview `pixel_width` wide.
    pub fn preview_scale(&self, pixel_width: f64) -> f64 {
        pixel_width / self.meta.page.width
    }
}

impl LayoutStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Items: {}, Grid: {}x{}, Coverage: {:.2}%, Image Area: {:.1} pt², Caption Area: {:.1} pt², Fitted to height: {}, Degenerate: {}",
            self.num_items,
            self.cols,
            self.rows,
            self.coverage * 100.0,
            self.image_area,
            self.caption_area,
            self.num_fitted_to_height,
            self.num_degenerate,
        )
    }

    /// Usable area not covered by images, in pt².
    pub fn unused_area(&self) -> f64 {
        (self.usable_area - self.image_area).max(0.0)
    }
}
