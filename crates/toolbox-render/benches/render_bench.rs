//! Benchmarks for text layout and PDF serialization.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use toolbox_render::{wrap, PageSetup, PdfWriter};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor \
    incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
    exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.";

fn bench_wrap(c: &mut Criterion) {
    let text = LOREM.repeat(50);
    c.bench_function("wrap_long_paragraph", |b| {
        b.iter(|| black_box(wrap(black_box(&text), 90)))
    });
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("PdfWriter");
    group.sample_size(20);

    group.bench_function("render_100_paragraphs", |b| {
        b.iter(|| {
            let mut writer = PdfWriter::new("bench", PageSetup::default());
            for i in 0..100 {
                writer.heading(&format!("Section {}", i), 2);
                writer.paragraph(LOREM);
            }
            black_box(writer.finish());
        })
    });

    group.bench_function("render_with_images", |b| {
        let img = image::RgbImage::new(200, 150);
        let mut png = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        b.iter(|| {
            let mut writer = PdfWriter::new("bench", PageSetup::default());
            for _ in 0..10 {
                writer.image_page(&png).unwrap();
            }
            black_box(writer.finish());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_wrap, bench_render);
criterion_main!(benches);
