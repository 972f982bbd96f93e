use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use teddy::compiler::compile_source;
use teddy::{EngineConfig, MemorySource, TeddyEngine};

const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <body>
    <include src="header"><arg title>{title}</arg></include>
    <if user.admin>
      <p>Admin tools</p>
    </if>
    <else>
      <p>Hello {user.name}</p>
    </else>
    <table>
      <foreach val="row" in="rows">
        <tr if-row.active true="class=on"><td>{row.name}</td><td>{row.score}</td></tr>
      </foreach>
    </table>
  </body>
</html>"#;

fn engine() -> TeddyEngine {
    let source = MemorySource::new()
        .with("page.html", PAGE)
        .with("header.html", "<header><h1>{title}</h1></header>");
    TeddyEngine::with_source(EngineConfig::default(), source)
}

fn model(rows: usize) -> serde_json::Value {
    let rows: Vec<_> = (0..rows)
        .map(|i| json!({ "name": format!("row {}", i), "score": i * 3, "active": i % 2 == 0 }))
        .collect();
    json!({ "title": "Scores", "user": { "name": "Ada", "admin": false }, "rows": rows })
}

fn benchmark_compile(c: &mut Criterion) {
    c.bench_function("compile_source", |b| {
        b.iter(|| {
            let compiled = compile_source(black_box(PAGE));
            black_box(compiled);
        })
    });
}

fn benchmark_render(c: &mut Criterion) {
    let engine = engine();
    let small = model(5);
    let large = model(100);

    c.bench_function("render_cached_5_rows", |b| {
        b.iter(|| {
            let html = engine.render("page", black_box(&small)).unwrap();
            black_box(html);
        })
    });

    c.bench_function("render_cached_100_rows", |b| {
        b.iter(|| {
            let html = engine.render("page", black_box(&large)).unwrap();
            black_box(html);
        })
    });

    let uncached = TeddyEngine::with_source(
        EngineConfig {
            compile_at_every_render: true,
            ..EngineConfig::default()
        },
        MemorySource::new()
            .with("page.html", PAGE)
            .with("header.html", "<header><h1>{title}</h1></header>"),
    );
    c.bench_function("render_uncached_5_rows", |b| {
        b.iter(|| {
            let html = uncached.render("page", black_box(&small)).unwrap();
            black_box(html);
        })
    });
}

criterion_group!(benches, benchmark_compile, benchmark_render);
criterion_main!(benches);
