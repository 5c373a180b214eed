//! Entity table benchmarks.
//!
//! Measures the three hot paths of a simulation frame at RTS scale:
//! filling the table, broadcasting a message, and the per-frame update scan.
//!
//! Run with: `cargo bench --bench entity_benchmarks`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use phalanx_entity::prelude::*;

fn catalog() -> Arc<TemplateCatalog> {
    let mut catalog = TemplateCatalog::new();
    catalog.insert(EntityTemplate::new("spearman").with_speed(2.0));
    Arc::new(catalog)
}

fn populated(count: usize) -> EntityManager {
    let mut m = EntityManager::new(catalog(), ManagerConfig::with_capacity(count));
    for i in 0..count {
        m.create_named("spearman", Vec3::new(i as f32, 0.0, 0.0), 0.0)
            .unwrap();
    }
    m
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");
    for &count in &[1_000usize, 4_096] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| black_box(populated(count)));
        });
    }
    group.finish();
}

fn bench_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast");
    for &count in &[1_000usize, 4_096] {
        let mut m = populated(count);
        let msg = Message::MoveTo {
            target: Vec3::new(100.0, 0.0, 100.0),
        };
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(m.broadcast(&msg)));
        });
    }
    group.finish();
}

fn bench_update_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_all");
    for &count in &[1_000usize, 4_096] {
        let mut m = populated(count);
        m.broadcast(&Message::MoveTo {
            target: Vec3::new(100.0, 0.0, 100.0),
        });
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(m.update_all(1.0 / 60.0)));
        });
    }
    group.finish();
}

fn bench_churn(c: &mut Criterion) {
    // Half the table is destroyed and recreated every iteration.
    c.bench_function("churn_half_of_4096", |b| {
        let mut m = populated(4_096);
        b.iter(|| {
            let victims: Vec<_> = m.all_active().into_iter().step_by(2).collect();
            for h in victims {
                m.destroy(h).unwrap();
            }
            while m.len() < 4_096 {
                m.create_named("spearman", Vec3::ZERO, 0.0).unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_create,
    bench_broadcast,
    bench_update_all,
    bench_churn
);
criterion_main!(benches);
