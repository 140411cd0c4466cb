use crate::config::LayoutConfig;
use crate::error::{PageGridError, Result};
use crate::model::{Grid, Layout, Meta, PlacedRect, Placement, Rect};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

pub mod fit;
pub mod grid;

use fit::{caption_band, fit_within};
use grid::{AutoColumns, ColumnStrategy, FixedColumns, GridArea};

/// Per-item engine input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LayoutItem {
    /// Width / height of the source image.
    pub aspect_ratio: f64,
    /// Caption font size, which is also the caption band height. 0 reserves no text line.
    pub caption_size: f64,
}

impl LayoutItem {
    pub fn new(aspect_ratio: f64, caption_size: f64) -> Self {
        Self {
            aspect_ratio,
            caption_size,
        }
    }
    pub fn uncaptioned(aspect_ratio: f64) -> Self {
        Self::new(aspect_ratio, 0.0)
    }
}

/// Everything the engine reads for one placement run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutRequest {
    pub config: LayoutConfig,
    pub items: Vec<LayoutItem>,
}

impl LayoutRequest {
    pub fn new(config: LayoutConfig, items: Vec<LayoutItem>) -> Self {
        Self { config, items }
    }

    /// Builds a request from parallel aspect-ratio and caption-size sequences.
    pub fn from_parts(
        config: LayoutConfig,
        aspect_ratios: &[f64],
        caption_sizes: &[f64],
    ) -> Result<Self> {
        if aspect_ratios.len() != caption_sizes.len() {
            return Err(PageGridError::InvalidInput(format!(
                "{} aspect ratios but {} caption sizes",
                aspect_ratios.len(),
                caption_sizes.len()
            )));
        }
        let items = aspect_ratios
            .iter()
            .zip(caption_sizes)
            .map(|(&a, &c)| LayoutItem::new(a, c))
            .collect();
        Ok(Self::new(config, items))
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Validates the configuration and every item.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        for (i, item) in self.items.iter().enumerate() {
            if !item.aspect_ratio.is_finite() || item.aspect_ratio <= 0.0 {
                return Err(PageGridError::InvalidInput(format!(
                    "item {}: aspect ratio must be positive, got {}",
                    i, item.aspect_ratio
                )));
            }
            if !item.caption_size.is_finite() || item.caption_size < 0.0 {
                return Err(PageGridError::InvalidInput(format!(
                    "item {}: caption size must be non-negative, got {}",
                    i, item.caption_size
                )));
            }
        }
        Ok(())
    }
}

/// Computes image and caption rectangles for every item of `req`, in input order.
///
/// Notes:
/// - Pure: the same request always yields the same layout (or the same error).
/// - With `columns == 0` the column count is searched; otherwise it is taken as given.
/// - Fails as a whole with `PageTooSmall`, `NoValidGrid` or `CellTooSmall`; no partial result.
/// - An item whose caption band fills its block is still placed, with a non-positive image height.
#[instrument(skip_all, fields(items = req.items.len(), columns = req.config.columns))]
pub fn compute_placements(req: &LayoutRequest) -> Result<Layout> {
    req.validate()?;
    let cfg = &req.config;
    let page_height = cfg.page.height;

    let (usable_width, usable_height) = cfg.usable_size();
    if usable_width <= 0.0 || usable_height <= 0.0 {
        return Err(PageGridError::PageTooSmall {
            usable_width,
            usable_height,
        });
    }

    let area = GridArea {
        usable_width,
        usable_height,
        item_spacing: cfg.item_spacing,
    };
    let strategy: Box<dyn ColumnStrategy> = if cfg.columns > 0 {
        Box::new(FixedColumns(cfg.columns))
    } else {
        Box::new(AutoColumns {
            parallel: cfg.parallel,
        })
    };
    let (cols, rows) = strategy.choose(&area, &req.items, cfg.caption_gap);
    if cols == 0 || rows == 0 {
        return Err(PageGridError::NoValidGrid { cols, rows });
    }

    let cells = area.cells(cols, rows);
    if !cells.is_positive() {
        return Err(PageGridError::CellTooSmall {
            block_width: cells.block_width,
            block_height: cells.block_height,
        });
    }

    let mut placements = Vec::with_capacity(req.items.len());
    for (i, item) in req.items.iter().enumerate() {
        let col = (i % cols as usize) as f64;
        let row = (i / cols as usize) as f64;

        let band = caption_band(item.caption_size, cfg.caption_gap);
        let image_only_height = cells.block_height - band;
        if image_only_height <= 0.0 {
            warn!(
                index = i,
                image_only_height, "caption band fills the block; image height is not positive"
            );
        }

        let fit = fit_within(cells.block_width, image_only_height, item.aspect_ratio);
        let total_height = fit.height + band;
        let x_offset = (cells.block_width - fit.width) / 2.0;
        let y_offset = (cells.block_height - total_height) / 2.0;

        let x = cfg.margins.left + col * cells.cell_width + x_offset;
        let y_top = cfg.margins.top + row * cells.cell_height + y_offset;
        let image = PlacedRect::from_top(x, y_top, fit.width, fit.height, page_height);

        let caption_top = y_top + fit.height + cfg.caption_gap;
        let caption =
            PlacedRect::from_top(x, caption_top, fit.width, item.caption_size, page_height);

        placements.push(Placement {
            image,
            caption,
            fitted_to_height: fit.fitted_to_height,
        });
    }

    let grid = Grid {
        cols,
        rows,
        cell_width: cells.cell_width,
        cell_height: cells.cell_height,
        block_width: cells.block_width,
        block_height: cells.block_height,
        usable: Rect::new(cfg.margins.left, cfg.margins.top, usable_width, usable_height),
    };
    let meta = Meta {
        schema_version: "1".into(),
        app: "page-grid".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        units: "pt".into(),
        page: cfg.page,
        margins: cfg.margins,
        item_spacing: cfg.item_spacing,
        columns_requested: cfg.columns,
        caption_gap: cfg.caption_gap,
    };
    Ok(Layout {
        grid,
        placements,
        meta,
    })
}
