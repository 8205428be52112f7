/// Benchmarks for NDVI computation and summary statistics.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array2;
use ndvi_stats::ndvi::{compute_ndvi, RasterWindow};
use ndvi_stats::statistics::Summary;

// Window of reflectance-like values with some variation between bands.
fn get_test_window(side: usize, scale: i32) -> RasterWindow {
    Array2::from_shape_fn((side, side), |(row, col)| {
        ((row * side + col) as i32 % 4096) * scale
    })
}

fn criterion_benchmark(c: &mut Criterion) {
    for side in [64, 256, 1024] {
        let red = get_test_window(side, 1);
        let nir = get_test_window(side, 3);
        let name = format!("compute_ndvi({}x{})", side, side);
        c.bench_function(&name, |b| {
            b.iter(|| compute_ndvi(black_box(red.view()), black_box(nir.view())).unwrap())
        });

        let grid = compute_ndvi(red.view(), nir.view()).unwrap();
        let name = format!("summary({}x{})", side, side);
        c.bench_function(&name, |b| b.iter(|| Summary::of(black_box(grid.view()))));
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
