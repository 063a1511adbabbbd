// Benchmark for the draw-time estimator.
// Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use plotsim::config::PlotterConfig;
use plotsim::history::Waypoint;
use plotsim::motion::estimator::estimate_plot_time;

fn bench_estimator(c: &mut Criterion) {
    // A dense zigzag with periodic pen lifts, the shape of a hatched fill.
    let mut history = Vec::with_capacity(10_000);
    for i in 0..10_000 {
        let x = if i % 2 == 0 { 0.0 } else { 200.0 };
        let y = (i / 2) as f64 * 0.5;
        history.push(Waypoint::new(x, y, i % 50 != 0));
    }
    let profile = PlotterConfig::default();

    c.bench_function("estimate 10k waypoint zigzag", |b| {
        b.iter(|| {
            let t = estimate_plot_time(&history, &profile);
            assert!(t > 0.0);
        });
    });
}

criterion_group!(benches, bench_estimator);
criterion_main!(benches);
