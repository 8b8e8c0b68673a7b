//! This bench test simulates building a large model one element at a time,
//! then querying the visible elements of a crowded level.

#![allow(missing_docs)]

use c4model::{Config, ElementKind, ElementPatch, Store};
use criterion::{Criterion, criterion_group, criterion_main};

/// Adds `systems` systems with ten containers of ten components each.
fn preseed_store(systems: usize) -> Store {
    let mut store = Store::new(Config::default());
    for s in 0..systems {
        store.navigate_to_root();
        let system = store.add_element(ElementKind::System, ElementPatch::named(format!("S{s}")));
        for c in 0..10 {
            store.navigate_to(Some(system.id.as_str()));
            let container =
                store.add_element(ElementKind::Container, ElementPatch::named(format!("C{c}")));
            store.navigate_to(Some(container.id.as_str()));
            for k in 0..10 {
                store.add_element(ElementKind::Component, ElementPatch::named(format!("K{k}")));
            }
        }
    }
    store.navigate_to_root();
    store
}

fn add_many(c: &mut Criterion) {
    c.bench_function("add 1110 elements", |b| b.iter(|| preseed_store(10)));
}

fn visible_elements(c: &mut Criterion) {
    let store = preseed_store(20);
    c.bench_function("visible elements at root", |b| {
        b.iter(|| store.visible_elements().len());
    });
}

criterion_group!(benches, add_many, visible_elements);
criterion_main!(benches);
