//! End-to-end wizard benchmarks: select → process for whole tools.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pdf_toolbox::wizard_for;
use toolbox_core::options::ToolOptions;
use toolbox_core::source::SourceFile;
use toolbox_core::tool::ToolKind;
use toolbox_utils::fixtures::{numbered_pdf, PdfFixture};

/// Plain text with N paragraphs.
fn generate_txt(num_paragraphs: usize) -> String {
    let mut txt = String::new();
    for i in 0..num_paragraphs {
        txt.push_str(&format!(
            "Section {}\n\n\
             Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod tempor \
             incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
             exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.\n\n",
            i
        ));
    }
    txt
}

fn run(kind: ToolKind, files: Vec<SourceFile>, options: &ToolOptions) -> usize {
    let mut wizard = wizard_for(kind, options.clone());
    wizard.select(files).unwrap();
    wizard.process().unwrap().size()
}

fn bench_txt_to_pdf(c: &mut Criterion) {
    let mut group = c.benchmark_group("E2E_TXT_to_PDF");
    group.sample_size(10);

    for (label, n) in [("small_10", 10), ("large_200", 200)] {
        let txt = generate_txt(n);
        group.bench_function(label, |b| {
            b.iter(|| {
                let file = SourceFile::from_bytes("bench.txt", txt.clone().into_bytes());
                black_box(run(ToolKind::TxtToPdf, vec![file], &ToolOptions::default()))
            })
        });
    }

    group.finish();
}

fn bench_compress(c: &mut Criterion) {
    let mut group = c.benchmark_group("E2E_Compress");
    group.sample_size(10);

    let pdf = PdfFixture::new()
        .page(&["Cover"])
        .image_page(600, 400)
        .image_page(400, 600)
        .build();

    for level in ["low", "medium", "high"] {
        let mut options = ToolOptions::default();
        options.set("level", level).unwrap();
        group.bench_function(level, |b| {
            b.iter(|| {
                let file = SourceFile::from_bytes("bench.pdf", pdf.clone());
                black_box(run(ToolKind::Compress, vec![file], &options))
            })
        });
    }

    group.finish();
}

fn bench_merge_and_office(c: &mut Criterion) {
    let mut group = c.benchmark_group("E2E_PDF");
    group.sample_size(10);

    let ten = numbered_pdf(10);
    group.bench_function("merge_3x10_pages", |b| {
        b.iter(|| {
            let files = (0..3)
                .map(|i| SourceFile::from_bytes(format!("part{}.pdf", i), ten.clone()))
                .collect();
            black_box(run(ToolKind::Merge, files, &ToolOptions::default()))
        })
    });

    group.bench_function("pdf_to_word_10_pages", |b| {
        b.iter(|| {
            let file = SourceFile::from_bytes("bench.pdf", ten.clone());
            black_box(run(ToolKind::PdfToDocx, vec![file], &ToolOptions::default()))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_txt_to_pdf, bench_compress, bench_merge_and_office);
criterion_main!(benches);
