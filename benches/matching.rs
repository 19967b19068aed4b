//! Benchmarks for compiled patterns versus the one-shot convenience functions.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rurex::{Flags, Options, Pattern, RegexSet};

const LOG_LINE: &str = "2024-03-17T10:22:05Z host-7 sshd[4410]: Accepted publickey for deploy from 10.0.3.17 port 52144";
const DATE: &str = r"(?P<y>\d{4})-(?P<m>\d{2})-(?P<d>\d{2})";

fn haystack(lines: usize) -> String {
    let mut text = String::with_capacity(lines * (LOG_LINE.len() + 1));
    for _ in 0..lines {
        text.push_str(LOG_LINE);
        text.push('\n');
    }
    text
}

/// Compile once and reuse versus compiling on every call.
fn bench_compile_reuse(c: &mut Criterion) {
    let options = Options::new();
    let pattern = Pattern::new(DATE).unwrap();

    let mut group = c.benchmark_group("compile_reuse");
    group.bench_function("compiled", |b| {
        b.iter(|| black_box(pattern.search(black_box(LOG_LINE)).is_some()))
    });
    group.bench_function("convenience", |b| {
        b.iter(|| black_box(rurex::search(DATE, black_box(LOG_LINE), Flags::DEFAULT, &options).unwrap().is_some()))
    });
    group.finish();
}

/// Lazy group resolution against eager submatches over growing inputs.
fn bench_finditer(c: &mut Criterion) {
    let lazy = Pattern::new(r"(\d+)\.(\d+)\.(\d+)\.(\d+)").unwrap();
    let eager =
        Pattern::with_options(r"(\d+)\.(\d+)\.(\d+)\.(\d+)", Flags::DEFAULT, &Options::new().submatches(true)).unwrap();

    let mut group = c.benchmark_group("finditer");
    for lines in [1, 16, 256] {
        let text = haystack(lines);
        group.bench_with_input(BenchmarkId::new("spans_only", lines), &text, |b, text| {
            b.iter(|| lazy.finditer(text).count())
        });
        group.bench_with_input(BenchmarkId::new("eager_groups", lines), &text, |b, text| {
            b.iter(|| eager.finditer(text).map(|m| m.lastindex().ok()).count())
        });
    }
    group.finish();
}

/// Anchored matching at offset zero reuses one cached program.
fn bench_anchored(c: &mut Criterion) {
    let pattern = Pattern::new(r"\d{4}-\d{2}").unwrap();
    c.bench_function("anchored_match", |b| {
        b.iter(|| black_box(pattern.anchored_match(black_box(LOG_LINE)).unwrap().is_some()))
    });
}

fn bench_set(c: &mut Criterion) {
    let set = RegexSet::new(["sshd", r"Failed \w+", r"port \d+", "sudo"]).unwrap();
    c.bench_function("set_matches", |b| b.iter(|| set.matches(black_box(LOG_LINE.as_bytes()))));
}

criterion_group!(benches, bench_compile_reuse, bench_finditer, bench_anchored, bench_set);
criterion_main!(benches);
