/*!
# Filter Benchmarks

Measures filter resolution and query construction without a database.

## Usage

```bash
# Run all benchmarks
cargo bench --bench filter_benchmarks

# Run a single group
cargo bench --bench filter_benchmarks -- "Query Construction"

# Quick benchmark with fewer samples
cargo bench --bench filter_benchmarks -- --quick
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use filtercrate::{
    Applicator, EntitySchema, FieldType, FilterMap, FilterValidator, Operator, OperatorSet, Schema,
    config::FilterConfig, decode_key, decode_value,
};
use sea_orm::sea_query::{SelectStatement, SqliteQueryBuilder};
use std::collections::HashMap;
use std::hint::black_box;
use std::time::Duration;

fn schema() -> Schema {
    Schema::new()
        .register(
            EntitySchema::new("artist", "artist")
                .field("id", FieldType::Integer)
                .field("name", FieldType::String),
        )
        .register(
            EntitySchema::new("performance", "performance")
                .field("id", FieldType::Integer)
                .field("performance_date", FieldType::DateTime)
                .field("venue", FieldType::String)
                .field("city", FieldType::String)
                .field("state", FieldType::String)
                .belongs_to("artist", "artist", "artist_id", "id"),
        )
}

/// A realistic request: mixed operators plus one relationship filter.
fn request_filters() -> FilterMap {
    FilterMap::new()
        .with("state|neq", "Utah")
        .with("id|between", "1,500")
        .with("performance_date|gte", "1995-01-01")
        .with("venue|isnotnull", "")
        .with("city|in", "Chicago,Ithaca,Manchester")
        .with("city|sort", "asc")
        .with("artist", FilterMap::new().with("name|like", "Dead"))
}

/// The request filters plus `size` entries on undeclared fields, which are
/// resolved and skipped.
fn wide_filters(size: usize) -> FilterMap {
    let mut filters = request_filters();
    for i in 0..size {
        let key = if i % 2 == 0 {
            format!("undeclared_{i}")
        } else {
            format!("undeclared_{i}|neq")
        };
        filters.insert(key, format!("value {i}"));
    }
    filters
}

fn bench_decoding(c: &mut Criterion) {
    let operators = OperatorSet::all();
    let aliases = HashMap::from([("province".to_string(), "state".to_string())]);

    let mut group = c.benchmark_group("Decoding");
    group.bench_function("decode_key", |b| {
        b.iter(|| decode_key(black_box("province | NEQ"), &aliases, &operators));
    });
    group.bench_function("decode_value_datetime", |b| {
        b.iter(|| decode_value(black_box("1998-11-02T20:15:00"), &FieldType::DateTime, Operator::Gte));
    });
    group.bench_function("decode_value_list", |b| {
        b.iter(|| decode_value(black_box("1,2,3,4,5,6,7,8,9,10"), &FieldType::Integer, Operator::In));
    });
    group.finish();
}

fn bench_query_construction(c: &mut Criterion) {
    let schema = schema();
    let filters = request_filters();

    let mut group = c.benchmark_group("Query Construction");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("apply_request", |b| {
        b.iter(|| {
            let mut applicator = Applicator::new(&schema, "performance").enable_relationships();
            let select: SelectStatement = applicator.apply(black_box(&filters)).unwrap();
            select
        });
    });
    group.bench_function("apply_and_render", |b| {
        b.iter(|| {
            let mut applicator = Applicator::new(&schema, "performance").enable_relationships();
            let select: SelectStatement = applicator.apply(black_box(&filters)).unwrap();
            select.build(SqliteQueryBuilder)
        });
    });

    for size in [10, 100, 1000] {
        let filters = wide_filters(size);
        group.bench_with_input(BenchmarkId::new("apply_wide", size), &filters, |b, filters| {
            b.iter(|| {
                let select: SelectStatement = Applicator::new(&schema, "performance")
                    .enable_relationships()
                    .apply(filters)
                    .unwrap();
                select
            });
        });
    }
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let schema = schema();
    let filters = request_filters();
    let config = FilterConfig::default().with_relationships(true);

    let mut group = c.benchmark_group("Validation");
    group.bench_function("validate_request", |b| {
        b.iter(|| {
            FilterValidator::new(&schema, "performance")
                .with_config(config.clone())
                .validate(black_box(&filters))
                .unwrap()
        });
    });
    group.finish();
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_secs(1))
        .with_plots()
        .with_output_color(true)
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_decoding, bench_query_construction, bench_validation
}
criterion_main!(benches);
