//! Detector hot-loop benchmark.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use figcrop::{detect, CropOptions};
use image::{DynamicImage, Rgb, RgbImage};

/// A4 page rasterized at 144 DPI with a large content block.
fn a4_page_buffer() -> DynamicImage {
    let mut img = RgbImage::from_pixel(1190, 1684, Rgb([255, 255, 255]));
    for y in 300..1400 {
        for x in 150..1050 {
            img.put_pixel(x, y, Rgb([40, 40, 40]));
        }
    }
    DynamicImage::ImageRgb8(img)
}

fn bench_detect(c: &mut Criterion) {
    let buffer = a4_page_buffer();
    let options = CropOptions::default();

    c.bench_function("detect_a4_page", |b| {
        b.iter(|| detect(black_box(&buffer), &options))
    });

    let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(1190, 1684, Rgb([255, 255, 255])));
    c.bench_function("detect_blank_page", |b| {
        b.iter(|| detect(black_box(&blank), &options))
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
