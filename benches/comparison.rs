//! Comparison benchmarks: safemark vs html-escape
//!
//! Run with: cargo bench --bench comparison
//!
//! safemark escapes more characters than html-escape (quotes, `=`, `+`,
//! `@` and friends), so this measures the price of the stricter output.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

/// Sample texts for benchmarking
mod samples {
    pub const TINY: &str = "Tom & Jerry";

    pub const PROSE: &str = "The quick brown fox jumps over the lazy dog. \
        It was a bright cold day in April, and the clocks were striking thirteen. ";

    pub const MARKUP: &str = "<a href=\"/x?a=1&b=2\" onclick='f()'>link</a> ";

    pub const ENCODED: &str = "&lt;p&gt;caf&eacute; &amp; cr&egrave;me &#8212; &quot;ok&quot;&lt;/p&gt; ";
}

fn inputs() -> Vec<(&'static str, String)> {
    vec![
        ("tiny", samples::TINY.to_string()),
        ("prose", samples::PROSE.repeat(50)),
        ("markup", samples::MARKUP.repeat(100)),
    ]
}

fn bench_text_escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_escaping");

    for (name, input) in inputs() {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("safemark", name), &input, |b, input| {
            b.iter(|| safemark::escape_text_to_string(black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("html-escape", name), &input, |b, input| {
            b.iter(|| html_escape::encode_text(black_box(input)).into_owned())
        });
    }

    group.finish();
}

fn bench_attribute_escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("attribute_escaping");

    for (name, input) in inputs() {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("safemark", name), &input, |b, input| {
            b.iter(|| {
                let mut out = String::with_capacity(input.len() * 2);
                safemark::encode_attr_onto(black_box(input), &mut out);
                out
            })
        });
        group.bench_with_input(BenchmarkId::new("html-escape", name), &input, |b, input| {
            b.iter(|| html_escape::encode_double_quoted_attribute(black_box(input)).into_owned())
        });
    }

    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    let input = samples::ENCODED.repeat(100);
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("safemark", |b| {
        b.iter(|| safemark::decode_html(black_box(&input), false))
    });
    group.bench_function("html-escape", |b| {
        b.iter(|| html_escape::decode_html_entities(black_box(&input)))
    });

    group.finish();
}

criterion_group!(benches, bench_text_escaping, bench_attribute_escaping, bench_decoding);
criterion_main!(benches);
