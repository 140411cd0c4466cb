#![cfg(feature = "parallel")]

use page_grid_core::prelude::*;
use rand::{Rng, SeedableRng};

#[test]
fn parallel_search_picks_the_same_grid() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(99);
    for _ in 0..50 {
        let count = rng.gen_range(1..=40);
        let items: Vec<LayoutItem> = (0..count)
            .map(|_| LayoutItem::new(rng.gen_range(0.3..3.0), 10.0))
            .collect();
        let serial = LayoutConfig::builder()
            .item_spacing(rng.gen_range(0.0..15.0))
            .build();
        let parallel = LayoutConfig {
            parallel: true,
            ..serial.clone()
        };
        let a = compute_placements(&LayoutRequest::new(serial, items.clone()));
        let b = compute_placements(&LayoutRequest::new(parallel, items));
        match (a, b) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.grid, b.grid);
                assert_eq!(a.placements, b.placements);
            }
            (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string()),
            _ => panic!("serial and parallel results diverged"),
        }
    }
}
