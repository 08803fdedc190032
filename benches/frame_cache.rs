// SPDX-License-Identifier: MPL-2.0
//! Benchmarks for the frame cache hot paths.
//!
//! Measures the performance of:
//! - Window sizing (runs on every budget or cap change)
//! - `image_at` hits (runs on every display tick)

use animated_frames::animated::{optimal_window_size, AnimatedImage, Window};
use animated_frames::domain::frame::WindowOverride;
use criterion::{criterion_group, criterion_main, Criterion};
use image_rs::codecs::gif::{GifEncoder, Repeat};
use image_rs::{Delay, Frame, Rgba, RgbaImage};
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Encodes a small looping GIF in memory.
fn sample_gif(frame_count: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(&mut bytes);
        encoder.set_repeat(Repeat::Infinite).unwrap();
        let frames = (0..frame_count).map(|i| {
            let shade = (i * 10 % 256) as u8;
            let buffer = RgbaImage::from_pixel(64, 64, Rgba([shade, shade, 0, 255]));
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(40, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}

fn bench_window_sizing(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_cache");

    group.bench_function("optimal_window_size", |b| {
        b.iter(|| {
            black_box(optimal_window_size(
                black_box(1920 * 1080 * 4),
                black_box(240),
                black_box(64 * 1024 * 1024),
                WindowOverride::unlimited(),
            ))
        });
    });

    group.bench_function("window_contains", |b| {
        let window = Window::new(230, 20, 240);
        b.iter(|| {
            for index in 0..240 {
                black_box(window.contains(black_box(index)));
            }
        });
    });

    group.finish();
}

/// Benchmark `image_at` once every frame is resident.
fn bench_image_at(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_cache");

    let image = AnimatedImage::new(sample_gif(24)).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    while image.resident_indices().len() < image.frame_count() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }

    group.bench_function("image_at_hit", |b| {
        let mut index = 0;
        b.iter(|| {
            black_box(image.image_at(index));
            index = (index + 1) % 24;
        });
    });

    group.finish();
}

criterion_group!(benches, bench_window_sizing, bench_image_at);
criterion_main!(benches);
