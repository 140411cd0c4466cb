use page_grid_core::prelude::*;

const EPS: f64 = 1e-9;

fn a4() -> LayoutConfig {
    LayoutConfig::builder()
        .page_size(PageSize::A4, false)
        .uniform_margin(20.0)
        .item_spacing(10.0)
        .caption_gap(5.0)
        .build()
}

fn items(ratios: &[f64], caption: f64) -> Vec<LayoutItem> {
    ratios.iter().map(|&r| LayoutItem::new(r, caption)).collect()
}

#[test]
fn single_item_takes_the_whole_block() {
    let req = LayoutRequest::new(a4(), items(&[1.5], 10.0));
    let layout = compute_placements(&req).expect("layout");

    assert_eq!((layout.grid.cols, layout.grid.rows), (1, 1));
    assert_eq!(layout.placements.len(), 1);

    let usable_width = 595.28 - 20.0 - 20.0;
    let img = layout.placements[0].image;
    assert!((img.width - (usable_width - 10.0)).abs() < EPS, "width {}", img.width);
    assert!((img.height - img.width / 1.5).abs() < EPS);
    assert!((img.x - 20.0).abs() < EPS);
    assert!(!layout.placements[0].fitted_to_height);

    // image + caption band centered vertically in the block
    let block_h = 841.89 - 40.0 - 10.0;
    let expected_top = 20.0 + (block_h - (img.height + 20.0)) / 2.0;
    assert!((img.y_top - expected_top).abs() < EPS);

    let cap = layout.placements[0].caption;
    assert_eq!(cap.x, img.x);
    assert_eq!(cap.width, img.width);
    assert_eq!(cap.height, 10.0);
    assert!((cap.y_top - (img.y_top + img.height + 5.0)).abs() < EPS);
}

#[test]
fn four_square_items_choose_two_by_two() {
    let req = LayoutRequest::new(a4(), items(&[1.0; 4], 10.0));
    let layout = compute_placements(&req).expect("layout");
    assert_eq!(layout.grid.cols, 2);
    assert_eq!(layout.grid.rows, 2);

    // row-major: items 0,1 share a row, items 0,2 share a column
    let p = &layout.placements;
    assert!((p[0].image.y_top - p[1].image.y_top).abs() < EPS);
    assert!((p[0].image.x - p[2].image.x).abs() < EPS);
    assert!(p[1].image.x > p[0].image.x);
    assert!(p[2].image.y_top > p[0].image.y_top);
}

#[test]
fn forced_single_column_stacks_vertically() {
    let cfg = LayoutConfig { columns: 1, ..a4() };
    let req = LayoutRequest::new(cfg, items(&[1.5, 1.5, 1.5], 10.0));
    let layout = compute_placements(&req).expect("layout");

    assert_eq!((layout.grid.cols, layout.grid.rows), (1, 3));
    let p = &layout.placements;
    for i in 1..p.len() {
        assert_eq!(p[i].image.x, p[0].image.x);
        assert!(p[i].image.y_bottom + p[i].image.height <= p[i - 1].image.y_bottom);
        assert!(p[i].image.y_bottom < p[i - 1].image.y_bottom);
    }
}

#[test]
fn fixed_columns_may_exceed_item_count() {
    let cfg = LayoutConfig { columns: 5, ..a4() };
    let layout = compute_placements(&LayoutRequest::new(cfg, items(&[1.0, 1.0], 0.0)))
        .expect("layout");
    assert_eq!((layout.grid.cols, layout.grid.rows), (5, 1));
    assert_eq!(layout.placements.len(), 2);
}

#[test]
fn margins_consuming_the_page_fail() {
    let cfg = LayoutConfig::builder()
        .with_page(595.0, 842.0)
        .margins(Margins::new(20.0, 20.0, 300.0, 300.0))
        .build();
    let result = compute_placements(&LayoutRequest::new(cfg, items(&[1.0], 10.0)));
    match result {
        Err(PageGridError::PageTooSmall { usable_width, .. }) => assert!(usable_width <= 0.0),
        other => panic!("expected PageTooSmall, got {:?}", other),
    }

    let cfg = LayoutConfig::builder()
        .with_page(595.0, 842.0)
        .margins(Margins::new(421.0, 421.0, 0.0, 0.0))
        .build();
    let result = compute_placements(&LayoutRequest::new(cfg, items(&[1.0], 10.0)));
    assert!(matches!(result, Err(PageGridError::PageTooSmall { .. })));
}

#[test]
fn empty_request_has_no_grid() {
    let result = compute_placements(&LayoutRequest::new(a4(), vec![]));
    assert!(matches!(
        result,
        Err(PageGridError::NoValidGrid { cols: 1, rows: 0 })
    ));

    let cfg = LayoutConfig { columns: 3, ..a4() };
    let result = compute_placements(&LayoutRequest::new(cfg, vec![]));
    assert!(matches!(
        result,
        Err(PageGridError::NoValidGrid { cols: 3, rows: 0 })
    ));
}

#[test]
fn spacing_wider_than_cells_fails() {
    let cfg = LayoutConfig::builder()
        .with_page(100.0, 100.0)
        .uniform_margin(0.0)
        .item_spacing(60.0)
        .columns(2)
        .build();
    let result = compute_placements(&LayoutRequest::new(cfg, items(&[1.0, 1.0], 0.0)));
    match result {
        Err(PageGridError::CellTooSmall { block_width, .. }) => assert_eq!(block_width, -10.0),
        other => panic!("expected CellTooSmall, got {:?}", other),
    }
}

#[test]
fn auto_search_without_candidates_falls_back_then_fails() {
    // Every candidate is skipped; the single-column fallback has a negative block height.
    let cfg = LayoutConfig::builder()
        .with_page(100.0, 100.0)
        .uniform_margin(0.0)
        .item_spacing(60.0)
        .build();
    let result = compute_placements(&LayoutRequest::new(cfg, items(&[1.0, 1.0], 0.0)));
    match result {
        Err(PageGridError::CellTooSmall {
            block_width,
            block_height,
        }) => {
            assert_eq!(block_width, 40.0);
            assert_eq!(block_height, -10.0);
        }
        other => panic!("expected CellTooSmall, got {:?}", other),
    }
}

#[test]
fn oversized_captions_yield_degenerate_images_not_errors() {
    let cfg = LayoutConfig::builder()
        .with_page(100.0, 100.0)
        .uniform_margin(0.0)
        .item_spacing(0.0)
        .caption_gap(5.0)
        .build();
    let layout = compute_placements(&LayoutRequest::new(cfg, items(&[1.0, 1.0], 200.0)))
        .expect("degenerate placement is still a layout");

    assert_eq!((layout.grid.cols, layout.grid.rows), (1, 2));
    for p in &layout.placements {
        assert_eq!(p.image.height, -160.0);
        assert!(p.fitted_to_height);
    }
    assert_eq!(layout.stats().num_degenerate, 2);
}

#[test]
fn per_item_captions_change_image_size() {
    // Search reserves the largest caption for all; placement uses each item's own.
    let cfg = LayoutConfig { columns: 2, ..a4() };
    let req = LayoutRequest::new(
        cfg,
        vec![LayoutItem::new(0.25, 0.0), LayoutItem::new(0.25, 30.0)],
    );
    let layout = compute_placements(&req).expect("layout");
    let (a, b) = (&layout.placements[0], &layout.placements[1]);
    assert!(a.fitted_to_height && b.fitted_to_height);
    assert!((a.image.height - b.image.height - 30.0).abs() < EPS);
    assert_eq!(b.caption.height, 30.0);
    assert_eq!(a.caption.height, 0.0);
}

#[test]
fn invalid_items_are_rejected() {
    for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = compute_placements(&LayoutRequest::new(a4(), items(&[1.0, bad], 10.0)));
        assert!(
            matches!(result, Err(PageGridError::InvalidInput(ref m)) if m.contains("item 1")),
            "aspect {} should be rejected",
            bad
        );
    }
    let result = compute_placements(&LayoutRequest::new(a4(), items(&[1.0], -2.0)));
    assert!(matches!(result, Err(PageGridError::InvalidInput(_))));
}

#[test]
fn mismatched_sequences_are_rejected() {
    let result = LayoutRequest::from_parts(a4(), &[1.0, 2.0], &[10.0]);
    assert!(matches!(result, Err(PageGridError::InvalidInput(_))));

    let req = LayoutRequest::from_parts(a4(), &[1.0, 2.0], &[10.0, 12.0]).expect("request");
    assert_eq!(req.count(), 2);
    assert_eq!(req.items[1], LayoutItem::new(2.0, 12.0));
}

#[test]
fn failures_are_classified() {
    let err = compute_placements(&LayoutRequest::new(a4(), vec![])).unwrap_err();
    assert!(err.is_layout_failure());
    let err = compute_placements(&LayoutRequest::new(a4(), items(&[0.0], 0.0))).unwrap_err();
    assert!(!err.is_layout_failure());
}

#[test]
fn repeated_calls_are_identical() {
    let req = LayoutRequest::new(a4(), items(&[1.5, 0.66, 1.0, 2.4, 0.8], 12.0));
    let first = compute_placements(&req).expect("layout");
    let second = compute_placements(&req).expect("layout");
    assert_eq!(first, second);
}

#[test]
fn stats_report_coverage() {
    let layout = compute_placements(&LayoutRequest::new(a4(), items(&[1.0; 4], 10.0)))
        .expect("layout");
    let stats = layout.stats();
    assert_eq!(stats.num_items, 4);
    assert_eq!((stats.cols, stats.rows), (2, 2));
    assert_eq!(stats.num_degenerate, 0);
    assert!(stats.coverage > 0.0 && stats.coverage < 1.0);
    assert!(stats.unused_area() > 0.0);
    assert!(stats.summary().contains("Grid: 2x2"));
}
