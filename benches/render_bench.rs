use criterion::{black_box, criterion_group, criterion_main, Criterion};

use zhaomu::rendering::{BlockGlyphs, CardRenderer, CodeEncoder, QrEncoder};
use zhaomu::DailySummary;

fn sample() -> DailySummary {
    let raw = std::fs::read_to_string("tests/fixtures/summary_sample.json").expect("read fixture");
    serde_json::from_str(&raw).expect("parse fixture")
}

fn bench_compose(c: &mut Criterion) {
    let summary = sample();
    let mut renderer = CardRenderer::with_engine(BlockGlyphs::new());
    c.bench_function("compose_card", |b| {
        b.iter(|| {
            let _ = renderer.compose(black_box(&summary));
        })
    });
}

fn bench_render(c: &mut Criterion) {
    let summary = sample();
    let mut renderer = CardRenderer::with_engine(BlockGlyphs::new());
    c.bench_function("render_card_png", |b| {
        b.iter(|| {
            let _ = renderer.render(black_box(&summary)).unwrap();
        })
    });
}

fn bench_encode_code(c: &mut Criterion) {
    let encoder = QrEncoder::new();
    c.bench_function("encode_share_code", |b| {
        b.iter(|| {
            let _ = encoder.encode(black_box("https://zhaomu.app/zhaomu")).unwrap();
        })
    });
}

criterion_group!(benches, bench_compose, bench_render, bench_encode_code);
criterion_main!(benches);
