//! Benchmarks for form cascades.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::BTreeSet;
use std::sync::Arc;
use targeting_engine::catalog::Catalog;
use targeting_engine::config::{validate_config, FieldValue};
use targeting_engine::form::ConfigurationForm;

fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin().expect("built-in catalog loads"))
}

/// Benchmark catalog loading and form initialization
fn bench_initialize(c: &mut Criterion) {
    c.bench_function("catalog_builtin", |b| {
        b.iter(|| Catalog::builtin().expect("built-in catalog loads"));
    });

    let catalog = catalog();
    c.bench_function("form_initialize", |b| {
        b.iter(|| ConfigurationForm::initialize(Arc::clone(&catalog), black_box("cbsi")));
    });
}

/// Benchmark the publisher-change cascade across every plan
fn bench_select_publisher(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_publisher");
    let catalog = catalog();

    for target in ["nypost", "sharethrough", "cbsi"] {
        group.bench_function(target, |b| {
            b.iter_batched(
                || {
                    let mut form = ConfigurationForm::initialize(Arc::clone(&catalog), "cbsi")
                        .expect("form initializes");
                    form.select_preset("mobile-viewable").expect("preset exists");
                    form
                },
                |mut form| form.select_publisher(black_box(target)),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark single-field edits and commit
fn bench_edit_and_commit(c: &mut Criterion) {
    let catalog = catalog();
    let mut form =
        ConfigurationForm::initialize(Arc::clone(&catalog), "cbsi").expect("form initializes");
    let devices: BTreeSet<String> = ["desktop", "mobile"].iter().map(|s| s.to_string()).collect();

    c.bench_function("set_field_viewability", |b| {
        let mut value = 0u8;
        b.iter(|| {
            value = (value + 1) % 100;
            form.set_field(black_box(FieldValue::Viewability(value)))
        });
    });

    c.bench_function("set_field_device", |b| {
        b.iter(|| form.set_field(black_box(FieldValue::Device(devices.clone()))));
    });

    c.bench_function("commit", |b| {
        b.iter(|| form.commit());
    });

    c.bench_function("validate_config", |b| {
        b.iter(|| validate_config(black_box(form.values())));
    });
}

criterion_group!(
    benches,
    bench_initialize,
    bench_select_publisher,
    bench_edit_and_commit
);
criterion_main!(benches);
