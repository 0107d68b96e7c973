//! Entity table lookup benchmarks.
//!
//! Measures the three lookup paths the façade leans on: id lookup, typed
//! variant scan, and component join across the whole table.
//!
//! Run with: `cargo bench --bench table_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cms_core::prelude::*;

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct Health(u32);

#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct Loot {
    gold: u32,
}

cms_core::component_definition!(Health);
cms_core::component_definition!(Loot);

#[derive(Debug, Default)]
struct Config {
    entity: Entity,
}

cms_core::entity_variant!(Config, entity);

fn build_table(entity_count: usize) -> EntityTable {
    let mut table: EntityTable = EntityTable::new();
    for i in 0..entity_count {
        let mut entity = Entity::new(format!("CMS/Monsters/M{i}"));
        entity.define::<Health>().0 = i as u32;
        if i % 4 == 0 {
            entity.define::<Loot>().gold = 10;
        }
        entity.add(Box::new(TagSprite {
            sprite: format!("m{i}.png"),
        }));
        table.add(Box::new(entity)).unwrap();
    }
    table.add(Box::new(Config::default())).unwrap();
    table
}

fn bench_find_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_by_id");
    for &count in &[100usize, 1_000, 10_000] {
        let table = build_table(count);
        let id = format!("CMS/Monsters/M{}", count / 2);
        group.bench_with_input(BenchmarkId::from_parameter(count), &id, |b, id| {
            b.iter(|| black_box(table.find_by_id(black_box(id))));
        });
    }
    group.finish();
}

fn bench_find_by_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_by_type");
    for &count in &[100usize, 1_000, 10_000] {
        let table = build_table(count);
        // Config is registered last, so this is a worst-case scan.
        group.bench_function(BenchmarkId::from_parameter(count), |b| {
            b.iter(|| black_box(table.find_by_type::<Config>()));
        });
    }
    group.finish();
}

fn bench_component_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("component_join");
    for &count in &[100usize, 1_000, 10_000] {
        let table = build_table(count);
        group.bench_function(BenchmarkId::new("exact", count), |b| {
            b.iter(|| {
                let joined: Vec<_> = table
                    .get_all()
                    .filter_map(|e| e.entity().get::<Loot>().map(|loot| (e.entity(), loot)))
                    .collect();
                black_box(joined)
            });
        });
        group.bench_function(BenchmarkId::new("capability", count), |b| {
            b.iter(|| {
                let joined: Vec<_> = table
                    .get_all()
                    .filter_map(|e| e.entity().get_abstract::<dyn Visual>().map(|v| (e.entity(), v)))
                    .collect();
                black_box(joined)
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_find_by_id,
    bench_find_by_type,
    bench_component_join
);
criterion_main!(benches);
