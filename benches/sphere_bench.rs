//! Benchmarks for sphere generation and single-frame rendering.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sphere_frame::gpu::surface::PREFERRED_FORMAT;
use sphere_frame::{generate_sphere, GpuContext, OffscreenSurface, SphereParams, SphereRenderer};

fn bench_generate_sphere(c: &mut Criterion) {
    let mut group = c.benchmark_group("Sphere Generation");

    for segments in [16u32, 50, 100, 200] {
        let params = SphereParams {
            segments: [segments, segments],
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new("generate", segments),
            &params,
            |b, params| {
                b.iter(|| black_box(generate_sphere(params).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_render_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("Frame Submission");

    let ctx = match pollster::block_on(GpuContext::new()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Skipping GPU benchmarks: {}", e);
            return;
        }
    };

    let mut surface = match OffscreenSurface::new(&ctx, 600, 600, [1.0, 1.0, 0.8, 1.0]) {
        Ok(surface) => surface,
        Err(e) => {
            eprintln!("Skipping GPU benchmarks: {}", e);
            return;
        }
    };
    let renderer = match SphereRenderer::new(ctx, &SphereParams::default(), PREFERRED_FORMAT) {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("Skipping GPU benchmarks: {}", e);
            return;
        }
    };

    group.bench_function("render_and_read_600", |b| {
        b.iter(|| {
            renderer.render(&mut surface).unwrap();
            black_box(surface.read_frame().unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_generate_sphere, bench_render_frame);
criterion_main!(benches);
