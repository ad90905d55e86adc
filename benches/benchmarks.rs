use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matchkey::{collate, match_key, nfd_to_match_key};

static SAMPLE: &str = "Der schnelle braune Fuchs springt über den faulen Hund. \
    Le cœur a ses raisons que la raison ne connaît point. \
    Быстрая бурая лисица прыгает через ленивую собаку. \
    敏捷的棕色狐狸跳过懒狗。 āčēļ ØÆŒß ǣ 0123456789";

fn match_key_mixed(c: &mut Criterion) {
    let text = SAMPLE.repeat(16);

    c.bench_function("match_key, mixed scripts", |b| {
        b.iter(|| match_key(black_box(&text)))
    });
}

fn match_key_prenormalized(c: &mut Criterion) {
    let codepoints = matchkey::get_nfd(&SAMPLE.repeat(16));

    c.bench_function("match_key, pre-decoded NFD input", |b| {
        b.iter(|| nfd_to_match_key(black_box(codepoints.clone())))
    });
}

fn sort_words(c: &mut Criterion) {
    let words: Vec<&str> = SAMPLE.split_whitespace().collect();

    c.bench_function("sort word list with collate", |b| {
        b.iter(|| {
            let mut words = words.clone();
            words.sort_unstable_by(|a, b| collate(a, b));
            words
        })
    });
}

criterion_group!(benches, match_key_mixed, match_key_prenormalized, sort_words);
criterion_main!(benches);
