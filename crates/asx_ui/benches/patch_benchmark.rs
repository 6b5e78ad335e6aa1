//! # Patch Benchmarks
//!
//! 1. Initial mount of a list
//! 2. Re-patching an identical list (the per-frame steady state)
//! 3. Re-patching with one changed text leaf
//! 4. Rendering and patching a store HUD

#![allow(missing_docs)]

use asx_ui::hud::{HudContent, Product};
use asx_ui::{el, render, DomSurface, TreeReconciler, VNode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const SIZES: [usize; 3] = [10, 100, 1_000];

fn list(len: usize, marker: usize) -> VNode {
    el("ul")
        .prop("class", "rows")
        .children((0..len).map(|i| {
            let label = if i == marker { format!("row {i}*") } else { format!("row {i}") };
            el("li").prop("data-i", i as i64).child(label)
        }))
        .into()
}

fn mounted(tree: &VNode) -> (DomSurface, TreeReconciler) {
    let mut dom = DomSurface::default();
    let mut rec = TreeReconciler::new(dom.root());
    let _ = rec.patch(&mut dom, tree.clone());
    (dom, rec)
}

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("mount_list");
    for len in SIZES {
        let tree = list(len, usize::MAX);
        group.bench_with_input(BenchmarkId::from_parameter(len), &tree, |b, tree| {
            b.iter(|| black_box(mounted(tree).0.node_count()));
        });
    }
    group.finish();
}

fn bench_steady_state(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_identical");
    for len in SIZES {
        let tree = list(len, usize::MAX);
        let (mut dom, mut rec) = mounted(&tree);
        group.bench_with_input(BenchmarkId::from_parameter(len), &tree, |b, tree| {
            b.iter(|| black_box(rec.patch(&mut dom, tree.clone())));
        });
    }
    group.finish();
}

fn bench_single_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch_one_text");
    for len in SIZES {
        let trees = [list(len, len / 2), list(len, usize::MAX)];
        let (mut dom, mut rec) = mounted(&trees[1]);
        let mut flip = 0;
        group.bench_function(BenchmarkId::from_parameter(len), |b| {
            b.iter(|| {
                flip ^= 1;
                black_box(rec.patch(&mut dom, trees[flip].clone()))
            });
        });
    }
    group.finish();
}

fn bench_store_hud(c: &mut Criterion) {
    let content = HudContent::Store {
        hero: None,
        products: (0..24_i32)
            .map(|i| Product {
                id: i.into(),
                name: format!("Item {i}"),
                description: "Standard issue".into(),
                icon: "#".into(),
                price: f64::from(i) * 1.25,
            })
            .collect(),
    };
    let (mut dom, mut rec) = mounted(&render(&content));
    c.bench_function("render_and_patch_store", |b| {
        b.iter(|| black_box(rec.patch(&mut dom, render(&content))));
    });
}

criterion_group!(benches, bench_mount, bench_steady_state, bench_single_change, bench_store_hud);
criterion_main!(benches);
