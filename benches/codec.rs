//! Performance benchmarks for safemark
//!
//! Run with: cargo bench --bench codec

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use safemark::{Event, HtmlStreamRenderer, RendererConfig, decode_html, escape_text_to_string, render_events};

/// Sample inputs of various shapes
mod samples {
    pub fn plain() -> String {
        "Hello, this is plain text without any special characters. ".repeat(100)
    }

    pub fn html_heavy() -> String {
        "<script>alert('xss')</script> & more <tags> here! ".repeat(100)
    }

    pub fn entity_heavy() -> String {
        "caf&eacute; &lt;b&gt; &#x1F600; &amp;amp; &notin; &copy 2024 &#169; ".repeat(100)
    }

    pub fn unicode() -> String {
        "Grüße aus Zürich, 東京, and 𝄞 music\u{2028}".repeat(100)
    }

    pub fn script_body() -> String {
        "<!-- if (a < b && c > d) { x--; } -->\n".repeat(100)
    }
}

fn bench_escaping(c: &mut Criterion) {
    let mut group = c.benchmark_group("escaping");

    for (name, input) in [
        ("plain_text", samples::plain()),
        ("html_heavy", samples::html_heavy()),
        ("unicode", samples::unicode()),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("pcdata", name), &input, |b, input| {
            b.iter(|| escape_text_to_string(black_box(input)))
        });
        group.bench_with_input(BenchmarkId::new("attribute", name), &input, |b, input| {
            b.iter(|| {
                let mut out = String::with_capacity(input.len() * 2);
                safemark::encode_attr_onto(black_box(input), &mut out);
                out
            })
        });
    }

    group.finish();
}

fn bench_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    for (name, input) in [
        ("no_references", samples::plain()),
        ("entity_heavy", samples::entity_heavy()),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("text", name), &input, |b, input| {
            b.iter(|| decode_html(black_box(input), false))
        });
        group.bench_with_input(BenchmarkId::new("attribute", name), &input, |b, input| {
            b.iter(|| decode_html(black_box(input), true))
        });
    }

    group.finish();
}

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");

    let text = samples::html_heavy();
    let script = samples::script_body();
    let events = [
        Event::OpenTag {
            name: "div",
            attrs: vec![("class", "post"), ("data-id", "42")],
        },
        Event::OpenTag {
            name: "p",
            attrs: vec![],
        },
        Event::Text(&text),
        Event::CloseTag("p"),
        Event::OpenTag {
            name: "script",
            attrs: vec![],
        },
        Event::Text(&script),
        Event::CloseTag("script"),
        Event::CloseTag("div"),
    ];
    let bytes = (text.len() + script.len()) as u64;
    group.throughput(Throughput::Bytes(bytes));

    for (name, config) in [
        ("permissive", RendererConfig::default()),
        ("strict", RendererConfig::new().strict()),
    ] {
        group.bench_with_input(BenchmarkId::new("document", name), &config, |b, config| {
            b.iter(|| render_events(black_box(&events), config))
        });
    }

    // Reuse the sink across documents.
    group.bench_function("buffer_reuse", |b| {
        let mut buffer = Vec::with_capacity(bytes as usize * 2);
        b.iter(|| {
            buffer.clear();
            let mut renderer = HtmlStreamRenderer::logging(&mut buffer, RendererConfig::default());
            renderer.open_document();
            renderer.open_tag("p", [("class", "x")]);
            renderer.text(black_box(&text));
            renderer.close_document();
        })
    });

    group.finish();
}

criterion_group!(benches, bench_escaping, bench_decoding, bench_rendering);
criterion_main!(benches);
