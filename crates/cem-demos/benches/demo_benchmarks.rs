//! Benchmarks for demo URL generation and microdata parsing.
//!
//! Performance targets:
//! - Pattern execution: < 5μs
//! - Template render: < 10μs
//! - Microdata parse of a small demo page: < 1ms

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cem_demos::{DemoDoc, UrlPattern, UrlTemplate};
use cem_syntax::{ParserPool, QueryManager};

const DEMO_HTML: &str = r#"<!doctype html>
<html>
  <head>
    <meta itemprop="demo-for" content="bench-button bench-card">
    <meta itemprop="description" content="Benchmark demo page">
  </head>
  <body>
    <bench-button variant="primary">Click</bench-button>
    <bench-card><p>Body</p></bench-card>
    <script type="text/markdown" itemprop="description">
      # Benchmark
      A demo used only for benchmarks.
    </script>
  </body>
</html>
"#;

fn bench_pattern_execute(c: &mut Criterion) {
    let pattern = UrlPattern::compile("/elements/:element/demo/:demo.html").unwrap();
    c.bench_function("url_pattern_execute", |b| {
        b.iter(|| {
            black_box(pattern.execute(black_box("/elements/bench-button/demo/primary.html")))
        });
    });
}

fn bench_template_render(c: &mut Criterion) {
    let template =
        UrlTemplate::compile("https://site.dev/elements/{{.element | alias | slug}}/demo/{{.demo}}/")
            .unwrap();
    let params: HashMap<String, String> = [
        ("element".to_string(), "bench-button".to_string()),
        ("demo".to_string(), "primary".to_string()),
    ]
    .into();
    let aliases: HashMap<String, String> =
        [("bench-button".to_string(), "button".to_string())].into();

    c.bench_function("url_template_render", |b| {
        b.iter(|| black_box(template.render(black_box(&params), &aliases)));
    });
}

fn bench_microdata_parse(c: &mut Criterion) {
    let pool = ParserPool::new();
    let queries = QueryManager::new();
    // Warm the pool and query cache.
    drop(DemoDoc::parse(&pool, &queries, DEMO_HTML));

    c.bench_function("microdata_parse_demo_page", |b| {
        b.iter(|| black_box(DemoDoc::parse(&pool, &queries, black_box(DEMO_HTML))));
    });
}

criterion_group!(
    benches,
    bench_pattern_execute,
    bench_template_render,
    bench_microdata_parse
);
criterion_main!(benches);
