use criterion::{black_box, criterion_group, criterion_main, Criterion};

use image::{GrayImage, Luma};
use ssd_disparity::prelude::*;

fn ssd_bench(c: &mut Criterion) {
    let _ = env_logger::try_init();

    // Textured left image, right image is the left seen 5 pixels further right
    let left = GrayImage::from_fn(160, 120, |x, y| {
        Luma([((x * 7 + y * 13 + (x * y) % 31) % 256) as u8])
    });
    let right = GrayImage::from_fn(160, 120, |x, y| *left.get_pixel((x + 5).min(159), y));

    // Build pair
    let pair = StereoPair::new(left, right).unwrap();

    // Build disparity alg
    let matcher = SsdBlockMatcher::new(Params {
        max_disparity: 16,
        window_half_size: 3
    });

    c.bench_function("ssd left 160x120", |b| {
        b.iter(|| matcher.search(black_box(&pair), Side::Left))
    });
    c.bench_function("ssd consistent 160x120", |b| {
        b.iter(|| matcher.compute_consistent(black_box(&pair)))
    });
}

criterion_group!(benches, ssd_bench);
criterion_main!(benches);
