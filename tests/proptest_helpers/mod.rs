#![allow(dead_code)]

use defectprep::ir::{BBoxXYXY, Pixel};
use defectprep::split::SplitRatios;
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Pixel error allowed when a normalized label is mapped back to the image.
pub fn eps_pixel(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-9
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image sizes in the range the two datasets actually use.
pub fn arb_image_size() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=4096, 1u32..=4096)
}

/// A non-empty box inside a `width x height` image.
pub fn arb_box_within(width: u32, height: u32) -> impl Strategy<Value = BBoxXYXY<Pixel>> {
    let w = f64::from(width);
    let h = f64::from(height);
    (0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64).prop_filter_map(
        "box must have positive area",
        move |(a, b, c, d)| {
            let (xmin, xmax) = (a.min(b) * w, a.max(b) * w);
            let (ymin, ymax) = (c.min(d) * h, c.max(d) * h);
            (xmin < xmax && ymin < ymax).then(|| BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax))
        },
    )
}

/// Any finite box, including inverted ones and ones reaching outside the image.
pub fn arb_wild_box(width: u32, height: u32) -> impl Strategy<Value = BBoxXYXY<Pixel>> {
    let w = f64::from(width);
    let h = f64::from(height);
    (-1.0..2.0f64, -1.0..2.0f64, -1.0..2.0f64, -1.0..2.0f64)
        .prop_map(move |(a, b, c, d)| BBoxXYXY::from_xyxy(a * w, c * h, b * w, d * h))
}

/// Non-negative ratios summing to 1.
pub fn arb_ratios() -> impl Strategy<Value = SplitRatios> {
    (1u32..=98, 0u32..=100).prop_map(|(train_pct, val_share)| {
        let train = f64::from(train_pct) / 100.0;
        let rest = 1.0 - train;
        let val = rest * f64::from(val_share) / 100.0;
        SplitRatios {
            train,
            val,
            test: rest - val,
        }
    })
}
