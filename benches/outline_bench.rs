//! Outline extraction and density benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use frame_outline::{fraction_white, AsArrayView, OutlineExtractor, OutlineStrategy};
use image::{Rgb, RgbImage};

fn synthetic_frame(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let band = (x / 8 + y / 12) % 3;
        let noise = ((x * 31 + y * 17) % 23) as u8;
        match band {
            0 => Rgb([20 + noise, 30, 40]),
            1 => Rgb([220, 210 - noise, 200]),
            _ => Rgb([128, 128, 128 + noise]),
        }
    })
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("outline");
    for (w, h) in [(320, 180), (640, 360)] {
        let frame = synthetic_frame(w, h);
        for strategy in OutlineStrategy::ALL {
            group.bench_with_input(
                BenchmarkId::new(strategy.name(), format!("{w}x{h}")),
                &frame,
                |b, frame| b.iter(|| strategy.extract(black_box(frame)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_fraction_white(c: &mut Criterion) {
    let outline = OutlineStrategy::Gradient
        .extract(&synthetic_frame(640, 360))
        .unwrap();

    c.bench_function("fraction_white_640x360", |b| {
        b.iter(|| fraction_white(black_box(outline.as_array_view().unwrap()), 255.0).unwrap())
    });
}

criterion_group!(benches, bench_strategies, bench_fraction_white);
criterion_main!(benches);
