//! Benchmarks for snapshot recompute and nearest-vertex picking

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use meshscope_core::{CameraState, Model, Point3f, ScreenPoint};
use meshscope_viewport::{
    build_frame, pick_nearest, FrameConfig, PickerConfig, PipelineConfig, TransformPipeline,
    Viewport,
};
use std::sync::Arc;

/// A wavy grid of `side * side` vertices, two triangles per cell
fn generate_grid_model(side: usize) -> Arc<Model> {
    let vertices: Vec<Point3f> = (0..side * side)
        .map(|i| {
            let x = (i % side) as f32 / side as f32 - 0.5;
            let y = (i / side) as f32 / side as f32 - 0.5;
            Point3f::new(x, y, (x * 10.0).sin() * (y * 10.0).cos() * 0.05)
        })
        .collect();

    let mut triangles = Vec::with_capacity((side - 1) * (side - 1) * 2);
    for row in 0..side - 1 {
        for col in 0..side - 1 {
            let i = row * side + col;
            triangles.push([i, i + 1, i + side]);
            triangles.push([i + 1, i + side + 1, i + side]);
        }
    }

    Arc::new(Model::new(vertices, triangles).expect("grid indices are in range"))
}

fn make_pipeline(model: Arc<Model>, config: PipelineConfig) -> TransformPipeline {
    let pipeline = TransformPipeline::new(
        CameraState::default().view_transform(),
        Viewport::new(1280.0, 720.0),
        config,
    );
    pipeline.run(pipeline.set_model(Some(model)));
    pipeline
}

fn benchmark_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("recompute");

    for side in [100, 300, 1000] {
        let model = generate_grid_model(side);
        group.throughput(Throughput::Elements((side * side) as u64));

        for (label, min_vertices) in [("sequential", usize::MAX), ("parallel", 0)] {
            let pipeline = make_pipeline(
                Arc::clone(&model),
                PipelineConfig::default().with_parallel_min_vertices(min_vertices),
            );
            group.bench_with_input(BenchmarkId::new(label, side * side), &pipeline, |b, pipeline| {
                b.iter(|| black_box(pipeline.run(pipeline.request_recompute())))
            });
        }
    }

    group.finish();
}

fn benchmark_picking(c: &mut Criterion) {
    let mut group = c.benchmark_group("picking");
    let cursor = ScreenPoint::new(640.0, 360.0);

    for side in [100, 300, 1000] {
        let pipeline = make_pipeline(generate_grid_model(side), PipelineConfig::default());
        let snapshot = pipeline.snapshot();
        group.throughput(Throughput::Elements((side * side) as u64));

        for (label, min_vertices) in [("sequential", usize::MAX), ("parallel", 0)] {
            let config = PickerConfig::default().with_parallel_min_vertices(min_vertices);
            group.bench_with_input(BenchmarkId::new(label, side * side), &snapshot, |b, snapshot| {
                b.iter(|| black_box(pick_nearest(snapshot, black_box(cursor), &config)))
            });
        }
    }

    group.finish();
}

fn benchmark_frame(c: &mut Criterion) {
    let pipeline = make_pipeline(generate_grid_model(300), PipelineConfig::default());
    let snapshot = pipeline.snapshot();
    let highlight = Point3f::new(0.0, 0.0, 0.0);
    let config = FrameConfig::default();

    c.bench_function("build_frame_90k", |b| {
        b.iter(|| black_box(build_frame(&snapshot, Some(&highlight), &config)))
    });
}

criterion_group!(benches, benchmark_recompute, benchmark_picking, benchmark_frame);
criterion_main!(benches);
