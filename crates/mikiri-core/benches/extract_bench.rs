use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mikiri_core::extract::VersionExtractor;
use mikiri_core::scoring::SimilarityScorer;

fn bench_extract(c: &mut Criterion) {
    let extractor = VersionExtractor::new().unwrap();

    let inputs = vec![
        "Game Name v1.1-CODEX",
        "Elden Ring [FitGirl Repack] (v1.10 + DLC)",
        "Baldurs Gate 3 Build 4821 PROPER-RUNE",
        "Factory Town 1.0.17a",
        "Some Indie Game 2024-01-15 Hotfix",
    ];

    c.bench_function("extract_single", |b| {
        b.iter(|| extractor.extract(black_box(inputs[0])));
    });

    c.bench_function("extract_batch_5", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = extractor.extract(black_box(input));
            }
        });
    });
}

fn bench_similarity(c: &mut Criterion) {
    let scorer = SimilarityScorer::new().unwrap();

    c.bench_function("similarity_pair", |b| {
        b.iter(|| scorer.score(black_box("Risk of Rain"), black_box("Risk of Rain 2")));
    });
}

criterion_group!(benches, bench_extract, bench_similarity);
criterion_main!(benches);
