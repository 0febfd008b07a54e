//! Criterion measurements of template resolution: parsing, binding named and
//! positional placeholders, and the effect of the template cache. No database
//! is touched; the numbers isolate the per-query overhead added before a
//! statement is sent.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde::Serialize;
use sql_template_middleware::codec::EncoderOptions;
use sql_template_middleware::query::Query;
use sql_template_middleware::sqlite::Sqlite;
use sql_template_middleware::template::{Template, TemplateCache, resolve_query};

#[derive(Serialize)]
struct Row {
    id: i64,
    title: String,
    done: bool,
    tags: Vec<String>,
}

fn insert_template(columns: usize) -> String {
    let names: Vec<String> = (0..columns).map(|i| format!("c{i}")).collect();
    let keys: Vec<String> = names.iter().map(|n| format!(":{n}:")).collect();
    format!(
        "INSERT INTO wide ({}) VALUES ({})",
        names.join(", "),
        keys.join(", ")
    )
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("template_parse");
    for columns in [4_usize, 32, 128] {
        let sql = insert_template(columns);
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(columns), &sql, |b, sql| {
            b.iter(|| Template::parse(black_box(sql)));
        });
    }
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let options = EncoderOptions::default();
    let record = Row {
        id: 7,
        title: "write benchmarks".into(),
        done: false,
        tags: vec!["perf".into(), "ci".into()],
    };
    let named = Query::new(
        "INSERT INTO todos (id, title, done, tags) VALUES (:id:, :title:, :done:, :tags:)",
    )
    .bind_serialize(&record)
    .expect("serializable record");
    let positional = Query::new("INSERT INTO todos (id, title, done) VALUES (?, ?, ?)")
        .bind(7_i64)
        .bind("write benchmarks")
        .bind(false);
    let cache = TemplateCache::default();

    let mut group = c.benchmark_group("template_resolve");
    group.bench_function("named_uncached", |b| {
        b.iter(|| resolve_query::<Sqlite>(black_box(&named), &options, None));
    });
    group.bench_function("named_cached", |b| {
        b.iter(|| resolve_query::<Sqlite>(black_box(&named), &options, Some(&cache)));
    });
    group.bench_function("positional_cached", |b| {
        b.iter(|| resolve_query::<Sqlite>(black_box(&positional), &options, Some(&cache)));
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_resolve);
criterion_main!(benches);
