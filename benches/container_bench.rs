//! Benchmarks for container assignment.
//!
//! Benchmarks cover:
//! - Mapping fresh entities into containers
//! - Re-mapping churn (entities moving between containers on upgrade)
//! - Priority recomputation on entity updates
//! - Diagnostic report serialization

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;

use prometheus_activity_manager::core::ContainerManager;
use prometheus_activity_manager::infra::InMemoryEntityRegistry;
use prometheus_activity_manager::util::{ActivityPriority, BusId};

// ============================================================================
// Fixtures
// ============================================================================

const PRIORITIES: [ActivityPriority; 4] = [
    ActivityPriority::Low,
    ActivityPriority::Normal,
    ActivityPriority::High,
    ActivityPriority::Highest,
];

fn registry_with(entities: usize) -> (Arc<InMemoryEntityRegistry>, Vec<BusId>) {
    let registry = Arc::new(InMemoryEntityRegistry::new());
    let ids: Vec<BusId> = (0..entities)
        .map(|i| BusId::service(format!("com.bench.service{i}")))
        .collect();
    for (i, id) in ids.iter().enumerate() {
        registry.insert(id.clone(), PRIORITIES[i % PRIORITIES.len()]);
    }
    (registry, ids)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_map_fresh(c: &mut Criterion) {
    let mut group = c.benchmark_group("map_fresh");
    for &entities in &[10usize, 100, 1000] {
        let (registry, ids) = registry_with(entities);
        group.throughput(Throughput::Elements(entities as u64));
        group.bench_with_input(BenchmarkId::from_parameter(entities), &ids, |b, ids| {
            b.iter(|| {
                let mut manager = ContainerManager::new(registry.clone());
                for (pid, chunk) in ids.chunks(4).enumerate() {
                    let name = format!("group{pid}");
                    manager
                        .map_container(&name, black_box(chunk), pid as u32)
                        .unwrap();
                }
                black_box(manager)
            });
        });
    }
    group.finish();
}

fn bench_remap_churn(c: &mut Criterion) {
    let (registry, ids) = registry_with(256);
    let mut manager = ContainerManager::new(registry);
    for (pid, chunk) in ids.chunks(4).enumerate() {
        manager
            .map_container(&format!("v1-{pid}"), chunk, pid as u32)
            .unwrap();
    }

    let mut generation = 0u32;
    c.bench_function("remap_churn_256", |b| {
        b.iter(|| {
            generation = generation.wrapping_add(1);
            for (pid, chunk) in ids.chunks(4).enumerate() {
                let name = format!("v{}-{pid}", generation % 2);
                manager.map_container(&name, chunk, pid as u32).unwrap();
            }
        });
    });
}

fn bench_inform_updated(c: &mut Criterion) {
    let (registry, ids) = registry_with(64);
    let mut manager = ContainerManager::new(registry);
    manager.map_container("all", &ids, 1).unwrap();

    c.bench_function("inform_entity_updated_64_members", |b| {
        b.iter(|| manager.inform_entity_updated(black_box(&ids[0])));
    });
}

fn bench_serialize(c: &mut Criterion) {
    let (registry, ids) = registry_with(500);
    let mut manager = ContainerManager::new(registry);
    for (pid, chunk) in ids.chunks(5).enumerate() {
        manager
            .map_container(&format!("group{pid}"), chunk, pid as u32)
            .unwrap();
    }

    c.bench_function("serialize_100_containers", |b| {
        b.iter(|| black_box(manager.serialize().unwrap()));
    });
}

criterion_group!(
    benches,
    bench_map_fresh,
    bench_remap_churn,
    bench_inform_updated,
    bench_serialize
);
criterion_main!(benches);
