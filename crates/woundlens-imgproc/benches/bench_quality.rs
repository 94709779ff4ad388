use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use woundlens_image::LumaPlane;
use woundlens_imgproc::quality::QualityGate;

fn bench_quality_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("QualityGate");
    let mut rng = StdRng::seed_from_u64(0);

    for (width, height) in [(640, 480), (1280, 720), (1920, 1080)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);
        let data: Vec<u8> = (0..width * height).map(|_| rng.random()).collect();
        let gate = QualityGate::default();

        group.bench_with_input(
            BenchmarkId::new("evaluate", &parameter_string),
            &data,
            |b, data| {
                let plane = LumaPlane::packed(data, *width, *height);
                b.iter(|| gate.evaluate(black_box(1.5), black_box(-2.0), black_box(&plane)))
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_quality_gate);
criterion_main!(benches);
