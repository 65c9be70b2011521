//! Benchmarks for source validation and option handling.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use toolbox_core::options::{OptionKey, ToolOptions};
use toolbox_core::source::{Format, SourceFile};

fn bench_source_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("SourceFile");

    let files: Vec<SourceFile> = (0..1000)
        .map(|i| {
            let name = match i % 4 {
                0 => format!("doc{}.pdf", i),
                1 => format!("slides{}.pptx", i),
                2 => format!("photo{}.JPG", i),
                _ => format!("notes{}", i),
            };
            SourceFile::from_bytes(name, vec![0u8; 16])
        })
        .collect();

    group.bench_function("matches_any_1000_files", |b| {
        let allowed = [Format::Pdf, Format::Jpeg, Format::Png];
        b.iter(|| {
            let accepted = files.iter().filter(|f| f.matches_any(&allowed)).count();
            black_box(accepted);
        })
    });

    group.bench_function("from_bytes_mime_guess", |b| {
        b.iter(|| {
            for i in 0..100 {
                black_box(SourceFile::from_bytes(format!("file{}.docx", i), Vec::new()));
            }
        })
    });

    group.finish();
}

fn bench_options(c: &mut Criterion) {
    let mut group = c.benchmark_group("ToolOptions");

    group.bench_function("set_every_key", |b| {
        b.iter(|| {
            let mut options = ToolOptions::default();
            options.set("font-size", "14").ok();
            options.set("margin", "25").ok();
            options.set("level", "high").ok();
            options.set("quality", "60").ok();
            options.set("dpi", "300").ok();
            black_box(&options);
        })
    });

    group.bench_function("get_every_key", |b| {
        let options = ToolOptions::default();
        b.iter(|| {
            for key in OptionKey::ALL {
                black_box(options.get(key));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_source_validation, bench_options);
criterion_main!(benches);
