use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pill_core::{
    EditEvent, EditKind, MemoryStore, ModelValue, Pill, PillInput, PillInputOptions, RawEdit,
    Selection, ThresholdScope, classify, diff, match_text,
};
use serde_json::json;

fn large_corpus(count: usize) -> Vec<Pill> {
    (0..count)
        .map(|i| {
            Pill::new(
                format!("user-{i}"),
                json!({ "id": i }),
                format!("Person{i:05} Surname{}", i % 97),
            )
            .with_prefix("@")
            .with_search_prefix("@")
            .with_min_search_characters(1)
            .with_max_search_words(2)
        })
        .collect()
}

/// A long comment with a pill every few words.
fn model_with_pills(pill_count: usize) -> ModelValue {
    let corpus = large_corpus(pill_count);
    let mut model = ModelValue::new("");
    for pill in corpus {
        let end = model.char_count();
        model.insert_pill(pill.with_suffix(" and some words ").with_position(end), None);
    }
    model
}

fn bench_typing_near_pills(c: &mut Criterion) {
    let model = model_with_pills(500);
    let input_corpus = large_corpus(16);

    c.bench_function("typing_near_pills/100_keypresses", |b| {
        b.iter_batched(
            || {
                let options = PillInputOptions::default();
                let mut input = PillInput::new(input_corpus.clone(), MemoryStore::new(), options);
                input.set_model_value(model.clone());
                input
            },
            |mut input| {
                let mut text = input.text().to_string();
                let mut caret = input.selection().start;
                for _ in 0..100 {
                    text.push('x');
                    input.handle_event(RawEdit {
                        event: Some(EditEvent::plain(EditKind::Keypress('x'))),
                        selection_before: Selection::caret(caret),
                        new_text: text.clone(),
                        selection_after: Selection::caret(caret + 1),
                    });
                    caret += 1;
                }
                black_box(input.model().pills().len());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_classify_unhinted_edit(c: &mut Criterion) {
    let model = model_with_pills(500);
    let old = model.text().to_string();
    let mid = old.len() / 2;
    let mut new = old.clone();
    let at = (0..=mid).rev().find(|&i| new.is_char_boundary(i)).unwrap_or(0);
    new.insert_str(at, "pasted text");

    c.bench_function("classify/diff_fallback_large_text", |b| {
        b.iter(|| {
            let class = classify(
                Selection::caret(0),
                Some(black_box(&old)),
                black_box(&new),
                None,
            );
            black_box(class);
        })
    });

    c.bench_function("diff/large_text", |b| {
        b.iter(|| black_box(diff(black_box(&old), black_box(&new))))
    });
}

fn bench_search_large_corpus(c: &mut Criterion) {
    let corpus = large_corpus(10_000);

    c.bench_function("search/10k_corpus_prefixed_query", |b| {
        b.iter(|| {
            let matches = match_text(
                black_box("please ask @person0012"),
                &corpus,
                ThresholdScope::Group,
            );
            black_box(matches.len());
        })
    });

    c.bench_function("search/10k_corpus_bare_prefix", |b| {
        b.iter(|| {
            let matches = match_text(black_box("cc @"), &corpus, ThresholdScope::Group);
            black_box(matches.len());
        })
    });
}

criterion_group!(
    benches,
    bench_typing_near_pills,
    bench_classify_unhinted_edit,
    bench_search_large_corpus
);
criterion_main!(benches);
