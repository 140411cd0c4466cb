use super::LayoutItem;
use super::fit::{caption_band, fit_within};
use tracing::{debug, trace, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Usable page area and the spacing kept between cells.
#[derive(Debug, Clone, Copy)]
pub struct GridArea {
    pub usable_width: f64,
    pub usable_height: f64,
    pub item_spacing: f64,
}

/// Cell and block sizes for a given column/row count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSize {
    pub cell_width: f64,
    pub cell_height: f64,
    pub block_width: f64,
    pub block_height: f64,
}

impl CellSize {
    pub fn is_positive(&self) -> bool {
        self.block_width > 0.0 && self.block_height > 0.0
    }
}

impl GridArea {
    pub fn cells(&self, cols: u32, rows: u32) -> CellSize {
        let cell_width = self.usable_width / cols as f64;
        let cell_height = self.usable_height / rows as f64;
        CellSize {
            cell_width,
            cell_height,
            block_width: cell_width - self.item_spacing,
            block_height: cell_height - self.item_spacing,
        }
    }
}

/// Rows needed to hold `count` items in `cols` columns.
pub fn rows_for(count: usize, cols: u32) -> u32 {
    if cols == 0 {
        return 0;
    }
    count.div_ceil(cols as usize) as u32
}

/// Chooses the column and row count for a set of items.
///
/// The returned grid is not guaranteed to fit; the engine re-validates it.
pub trait ColumnStrategy {
    fn choose(&self, area: &GridArea, items: &[LayoutItem], caption_gap: f64) -> (u32, u32);
}

/// Pinned column count; rows follow from the item count.
#[derive(Debug, Clone, Copy)]
pub struct FixedColumns(pub u32);

impl ColumnStrategy for FixedColumns {
    fn choose(&self, _area: &GridArea, items: &[LayoutItem], _caption_gap: f64) -> (u32, u32) {
        (self.0, rows_for(items.len(), self.0))
    }
}

/// Tries every column count from 1 to the item count and keeps the feasible one
/// with the largest block area. The first maximum wins on ties.
///
/// Feasibility reserves the largest caption of the whole set for every item.
/// When nothing is feasible the grid falls back to a single column.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoColumns {
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    cols: u32,
    rows: u32,
    area: f64,
}

fn evaluate(area: &GridArea, items: &[LayoutItem], band: f64, cols: u32) -> Option<Candidate> {
    let rows = rows_for(items.len(), cols);
    let cells = area.cells(cols, rows);
    if !cells.is_positive() {
        trace!(cols, rows, "skip: block not positive");
        return None;
    }
    let image_only_height = cells.block_height - band;
    let all_fit = items.iter().all(|item| {
        if image_only_height <= 0.0 {
            return false;
        }
        let fit = fit_within(cells.block_width, image_only_height, item.aspect_ratio);
        !(fit.width > cells.block_width || fit.height > image_only_height)
    });
    let block_area = cells.block_width * cells.block_height;
    trace!(cols, rows, all_fit, block_area, "candidate");
    all_fit.then_some(Candidate {
        cols,
        rows,
        area: block_area,
    })
}

impl ColumnStrategy for AutoColumns {
    fn choose(&self, area: &GridArea, items: &[LayoutItem], caption_gap: f64) -> (u32, u32) {
        let count = items.len() as u32;
        let max_caption = items.iter().map(|i| i.caption_size).fold(0.0, f64::max);
        let band = caption_band(max_caption, caption_gap);

        let candidates: Vec<Option<Candidate>> = {
            #[cfg(feature = "parallel")]
            {
                if self.parallel {
                    (1..=count)
                        .into_par_iter()
                        .map(|cols| evaluate(area, items, band, cols))
                        .collect()
                } else {
                    (1..=count)
                        .map(|cols| evaluate(area, items, band, cols))
                        .collect()
                }
            }
            #[cfg(not(feature = "parallel"))]
            {
                (1..=count)
                    .map(|cols| evaluate(area, items, band, cols))
                    .collect()
            }
        };

        // Reduced in ascending column order so ties resolve the same way on every path.
        let mut best = (1, rows_for(items.len(), 1));
        let mut best_area = 0.0;
        let mut found = false;
        for cand in candidates.into_iter().flatten() {
            if cand.area > best_area {
                best_area = cand.area;
                best = (cand.cols, cand.rows);
                found = true;
            }
        }
        if found {
            debug!(cols = best.0, rows = best.1, block_area = best_area, "auto grid selected");
        } else if count > 0 {
            warn!(
                cols = best.0,
                rows = best.1,
                "no feasible grid found, falling back to a single column"
            );
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(w: f64, h: f64, spacing: f64) -> GridArea {
        GridArea {
            usable_width: w,
            usable_height: h,
            item_spacing: spacing,
        }
    }

    #[test]
    fn rows_round_up() {
        assert_eq!(rows_for(5, 2), 3);
        assert_eq!(rows_for(4, 2), 2);
        assert_eq!(rows_for(0, 3), 0);
        assert_eq!(rows_for(3, 0), 0);
    }

    #[test]
    fn fixed_columns_ignore_fit() {
        let items = vec![LayoutItem::new(1.0, 10.0); 7];
        let (c, r) = FixedColumns(3).choose(&area(10.0, 10.0, 50.0), &items, 5.0);
        assert_eq!((c, r), (3, 3));
    }

    #[test]
    fn wide_items_on_a_tall_page_stack_in_one_column() {
        let items = vec![LayoutItem::new(4.0, 0.0); 3];
        let (c, r) = AutoColumns::default().choose(&area(400.0, 1200.0, 10.0), &items, 0.0);
        assert_eq!((c, r), (1, 3));
    }

    #[test]
    fn equal_areas_keep_the_first_candidate() {
        // 2 items on a square area: 1x2 and 2x1 have the same block area.
        let items = vec![LayoutItem::new(1.0, 0.0); 2];
        let (c, r) = AutoColumns::default().choose(&area(100.0, 100.0, 0.0), &items, 0.0);
        assert_eq!((c, r), (1, 2));
    }

    #[test]
    fn nothing_feasible_falls_back_to_one_column() {
        let items = vec![LayoutItem::new(1.0, 500.0); 4];
        let (c, r) = AutoColumns::default().choose(&area(100.0, 100.0, 0.0), &items, 5.0);
        assert_eq!((c, r), (1, 4));
    }

    #[test]
    fn largest_caption_drives_feasibility() {
        // A single large caption makes the shared band too tall for two rows.
        let items = vec![
            LayoutItem::new(1.0, 0.0),
            LayoutItem::new(1.0, 0.0),
            LayoutItem::new(1.0, 60.0),
        ];
        let (c, r) = AutoColumns::default().choose(&area(300.0, 100.0, 0.0), &items, 0.0);
        assert_eq!((c, r), (3, 1));
    }

    #[test]
    fn empty_set_has_no_rows() {
        let (c, r) = AutoColumns::default().choose(&area(100.0, 100.0, 0.0), &[], 0.0);
        assert_eq!((c, r), (1, 0));
    }
}
