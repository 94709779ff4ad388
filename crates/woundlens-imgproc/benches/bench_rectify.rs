use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use woundlens_geometry::{marker::MarkerCorners, Homography};
use woundlens_image::{Image, ImageSize};
use woundlens_imgproc::warp::{rectify, rectify_with_inverse};

fn bench_rectify(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rectify");

    for (width, height) in [(640, 480), (1280, 720), (1920, 1080)].iter() {
        let parameter_string = format!("{}x{}", width, height);

        // input image
        let image_size = ImageSize {
            width: *width,
            height: *height,
        };
        let image = Image::<u8, 3>::from_size_val(image_size, 128).unwrap();

        // a marker in the middle of the frame rectified onto a 1000 px square
        let (cx, cy) = (*width as f64 / 2.0, *height as f64 / 2.0);
        let corners = MarkerCorners::from_taps(&[
            [cx - 120.0, cy - 100.0],
            [cx + 130.0, cy - 90.0],
            [cx + 120.0, cy + 110.0],
            [cx - 125.0, cy + 100.0],
        ])
        .unwrap();
        let m = corners.rectification(1000).unwrap();
        let inv_m = m.inverse().unwrap();
        let out_size = ImageSize {
            width: 1000,
            height: 1000,
        };

        group.throughput(criterion::Throughput::Elements(out_size.area() as u64));

        group.bench_with_input(
            BenchmarkId::new("rectify", &parameter_string),
            &(&image, m),
            |b, i| {
                let (src, m) = (i.0, i.1);
                b.iter(|| rectify(black_box(src), black_box(&m), black_box(out_size)))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("rectify_with_inverse", &parameter_string),
            &(&image, inv_m),
            |b, i| {
                let (src, inv_m): (&Image<u8, 3>, Homography) = (i.0, i.1);
                b.iter(|| {
                    rectify_with_inverse(black_box(src), black_box(&inv_m), black_box(out_size))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_rectify);
criterion_main!(benches);
