//! Pipeline benchmarks
//!
//! Measures deduplication, merging and full document runs over synthetic
//! pages shaped like recognizer output: a running header and footer, a
//! heading, split paragraphs and a short bullet list per page.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fragdown::fragment::{Fragment, FragmentKind};
use fragdown::geometry::Rect;
use fragdown::layout::{Deduplicator, Merger};
use fragdown::pipeline::{FragmentPipeline, PipelineConfig, StageLog};

/// Build one synthetic page.
fn synthetic_page(page: u32) -> Vec<Fragment> {
    let mut fragments = vec![
        Fragment::new(FragmentKind::TextBlock, Rect::new(0.1, 0.01, 0.5, 0.03), page)
            .with_text("Quarterly Report"),
        Fragment::new(FragmentKind::TextBlock, Rect::new(0.1, 0.08, 0.8, 0.04), page)
            .with_text(format!("{}.1 Overview", page)),
    ];

    let mut y = 0.14;
    for i in 0..12 {
        // Each line arrives as two pieces; every fourth line is reported twice.
        let left = Fragment::new(FragmentKind::Paragraph, Rect::new(0.1, y, 0.38, 0.025), page)
            .with_text(format!("Line {} starts", i))
            .with_confidence(0.9);
        let right = Fragment::new(FragmentKind::Paragraph, Rect::new(0.5, y, 0.38, 0.025), page)
            .with_text("and ends here.")
            .with_confidence(0.85);
        if i % 4 == 0 {
            fragments.push(left.clone().with_confidence(0.6));
        }
        fragments.push(left);
        fragments.push(right);
        y += 0.05;
    }

    for i in 0..4 {
        fragments.push(
            Fragment::new(FragmentKind::Paragraph, Rect::new(0.12, y, 0.6, 0.025), page)
                .with_text(format!("• Item {}", i)),
        );
        y += 0.04;
    }

    fragments.push(
        Fragment::new(FragmentKind::TextBlock, Rect::new(0.45, 0.96, 0.1, 0.02), page)
            .with_text(page.to_string()),
    );
    fragments
}

fn bench_config() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.headers.enabled = true;
    config.headers.numbered = vec![r"^(\d+(?:\.\d+)*)\s+\S".to_string()];
    config.lists.enabled = true;
    config.lists.bullet = vec![r"^([•\-])\s+".to_string()];
    config.markdown.include_toc = true;
    config
}

fn bench_stages(c: &mut Criterion) {
    let config = bench_config();
    let page = synthetic_page(1);
    let log = StageLog::quiet();

    c.bench_function("dedup_page", |b| {
        let dedup = Deduplicator::new(config.processing.overlap_threshold);
        b.iter(|| black_box(dedup.deduplicate(black_box(page.clone()), &log)));
    });

    c.bench_function("merge_page", |b| {
        let merger = Merger::new(&config.processing);
        b.iter(|| black_box(merger.merge(black_box(page.clone()), &log).unwrap()));
    });
}

fn bench_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("process_document");
    let pipeline = FragmentPipeline::new(bench_config().validate().unwrap());

    for pages in [1u32, 10, 50] {
        let document: Vec<Vec<Fragment>> = (1..=pages).map(synthetic_page).collect();
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{pages}_pages")),
            &document,
            |b, document| {
                b.iter(|| black_box(pipeline.process_document(document.clone()).unwrap()));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_stages, bench_document);
criterion_main!(benches);
