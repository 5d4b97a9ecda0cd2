//! Dispatch and merge benchmarks
//!
//! - Area reduction: scoped lifecycle transition plus structural merge
//! - Root store dispatch: matched and unmatched actions across several areas
//!
//! Run with: `cargo bench -p reflux-runtime`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use reflux_core::action::{ActionTypes, DispatchedAction, Flavor};
use reflux_core::area::FeatureArea;
use reflux_core::environment::{NoopNavigator, Store};
use reflux_core::lifecycle::RegisteredLifecycle;
use reflux_core::merge::merge;
use reflux_core::reducer::{LifecycleReducer, Overrides};
use reflux_runtime::RootStore;
use serde_json::{Value, json};
use std::sync::Arc;

fn area(name: &str) -> FeatureArea {
    ["LOAD", "SAVE", "DELETE"]
        .into_iter()
        .fold(FeatureArea::new(name), |area, lifecycle| {
            area.with_lifecycle(RegisteredLifecycle::new(LifecycleReducer::new(
                ActionTypes::derive(&format!("{}_{lifecycle}", name.to_uppercase()), Flavor::Async),
                Overrides::default(),
            )))
        })
}

fn populated_state() -> Value {
    let items: Vec<Value> = (0..100).map(|i| json!({ "id": i, "name": format!("item-{i}") })).collect();
    json!({
        "list": { "data": items, "loading": false, "error": null },
        "detail": { "data": { "id": 1, "tags": ["a", "b"] }, "loading": false }
    })
}

fn benchmark_area_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("area_reduce");
    let area = area("shop");
    let state = Arc::new(populated_state());
    let action = DispatchedAction::new("SHOP_LOAD_SUCCESS")
        .with_store_index("detail")
        .with_data(json!({ "id": 2, "tags": ["c"] }));

    group.bench_function("scoped_success", |b| {
        b.iter(|| black_box(area.reduce(black_box(&state), black_box(&action))));
    });

    let unmatched = DispatchedAction::new("ELSEWHERE");
    group.bench_function("unmatched", |b| {
        b.iter(|| black_box(area.reduce(black_box(&state), black_box(&unmatched))));
    });

    group.finish();
}

fn benchmark_merge(c: &mut Criterion) {
    let base = populated_state();
    let partial = json!({ "detail": { "data": { "tags": [] }, "loading": true } });

    c.bench_function("merge_nested_partial", |b| {
        b.iter(|| {
            let mut target = base.clone();
            merge(&mut target, black_box(partial.clone()));
            black_box(target)
        });
    });
}

fn benchmark_store_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_dispatch");
    group.throughput(Throughput::Elements(1));

    let store = RootStore::new(Arc::new(NoopNavigator));
    for name in ["shop", "account", "search", "prefs"] {
        store.mount(area(name)).expect("unique area names");
    }

    let matched = DispatchedAction::new("SHOP_LOAD_REQUEST").with_store_index("list");
    group.bench_function("matched", |b| {
        b.iter(|| store.dispatch(black_box(matched.clone())));
    });

    let unmatched = DispatchedAction::new("ELSEWHERE");
    group.bench_function("unmatched", |b| {
        b.iter(|| store.dispatch(black_box(unmatched.clone())));
    });

    group.finish();
}

criterion_group!(benches, benchmark_area_reduce, benchmark_merge, benchmark_store_dispatch);
criterion_main!(benches);
