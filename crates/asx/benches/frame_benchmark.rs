//! # Frame Benchmarks
//!
//! 1. A full runtime frame on each demo page
//! 2. Navigation between two pages (unmount + mount)
//! 3. Store reads and writes through the namespaced store

#![allow(missing_docs)]

use asx::{demo, AsxConfig, AsxRuntime, KeyValueStore};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const STEP_MS: f64 = 1000.0 / 60.0;

fn runtime() -> AsxRuntime {
    let mut config = AsxConfig::default();
    config.frame.warn_slow_frames = false;
    let os = demo::document().unwrap_or_default();
    AsxRuntime::new(config, os, demo::behaviours()).unwrap_or_else(|err| panic!("runtime: {err}"))
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("runtime_frame");
    for route in ["/", "/space", "/stars"] {
        let mut rt = runtime();
        let _ = rt.navigate(route);
        let mut now = 0.0;
        group.bench_with_input(BenchmarkId::from_parameter(route), &route, |b, _| {
            b.iter(|| {
                now += STEP_MS;
                black_box(rt.frame(now).instances)
            });
        });
    }
    group.finish();
}

fn bench_navigation(c: &mut Criterion) {
    let mut rt = runtime();
    let mut flip = false;
    c.bench_function("navigate_store_space", |b| {
        b.iter(|| {
            flip = !flip;
            let _ = black_box(rt.navigate(if flip { "/store" } else { "/space" }));
        });
    });
}

fn bench_storage(c: &mut Criterion) {
    let store = KeyValueStore::in_memory("bench:");
    let cart: Vec<String> = (0..32).map(|i| format!("item-{i}")).collect();
    c.bench_function("storage_set_get_cart", |b| {
        b.iter(|| {
            store.set("cart", &cart);
            black_box(store.get::<Vec<String>>("cart"))
        });
    });
}

criterion_group!(benches, bench_frame, bench_navigation, bench_storage);
criterion_main!(benches);
