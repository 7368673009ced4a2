//! Criterion benchmarks for emogif.
//!
//! Covers the hot paths of a training run and of a prediction:
//! - Text normalization, with and without spelling correction
//! - TF-IDF fitting and transformation
//! - Spelling correction of misspelled words

use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use emogif::analysis::normalizer::{NormalizerSettings, TextNormalizer};
use emogif::ml::tfidf::TfIdfVectorizer;
use emogif::spelling::corrector::SpellingCorrector;

/// Generate chat-like messages for benchmarking.
fn generate_messages(count: usize) -> Vec<String> {
    let words = [
        "happy", "today", "can't", "believe", "lol", "@friend", "http://x.co",
        "crying", "alone", "furious", "traffic", "wonderful", "party", "omg",
        "scared", "running", "&amp;", "smh", "beleive", "amazing",
    ];

    (0..count)
        .map(|i| {
            (0..12)
                .map(|j| words[(i * 7 + j * 3) % words.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");
    let messages = generate_messages(1000);

    let normalizer = TextNormalizer::new().unwrap();
    let mut settings = NormalizerSettings::default();
    settings.spelling.enabled = false;
    let no_spelling = TextNormalizer::with_settings(settings).unwrap();

    group.bench_function("normalize_single_message", |b| {
        b.iter(|| black_box(normalizer.normalize(black_box(&messages[0]))))
    });

    group.bench_function("normalize_without_spelling", |b| {
        b.iter(|| black_box(no_spelling.normalize(black_box(&messages[0]))))
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("normalize_batch_messages", |b| {
        b.iter(|| {
            for message in messages.iter().take(100) {
                let _ = black_box(normalizer.normalize(black_box(message)));
            }
        })
    });

    group.finish();
}

fn bench_tfidf(c: &mut Criterion) {
    let mut group = c.benchmark_group("tfidf");
    let normalizer = TextNormalizer::new().unwrap();
    let documents: Vec<Vec<String>> = generate_messages(1000)
        .iter()
        .map(|m| normalizer.normalize(m).unwrap())
        .collect();

    group.throughput(Throughput::Elements(documents.len() as u64));
    group.bench_function("fit", |b| {
        b.iter(|| {
            let mut vectorizer = TfIdfVectorizer::new();
            vectorizer.fit(black_box(&documents)).unwrap();
            black_box(vectorizer)
        })
    });

    let mut vectorizer = TfIdfVectorizer::new();
    vectorizer.fit(&documents).unwrap();
    group.bench_function("transform_batch", |b| {
        b.iter(|| {
            for doc in &documents {
                let _ = black_box(vectorizer.transform(black_box(doc)));
            }
        })
    });

    group.finish();
}

fn bench_spell_correction(c: &mut Criterion) {
    let mut group = c.benchmark_group("spell_correction");
    group.sample_size(20);
    let corrector = SpellingCorrector::new();
    let words = ["beleive", "recieve", "happpy", "tommorow", "definately"];

    group.throughput(Throughput::Elements(words.len() as u64));
    group.bench_function("correct_misspelled_words", |b| {
        b.iter(|| {
            for word in words {
                black_box(corrector.correct(black_box(word)));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_normalization, bench_tfidf);

// Slower benchmarks
criterion_group!(slow_benches, bench_spell_correction);

criterion_main!(benches, slow_benches);
