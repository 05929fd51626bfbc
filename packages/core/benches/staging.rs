//! Performance benchmarks for the staging hot path
//!
//! Run with: `cargo bench -p catalog-core`
//!
//! These benchmarks measure:
//! - Repeated edits of one record (merge into a single log entry)
//! - Staging edits across a large hierarchy (lookup + snapshot + projection)
//! - Renaming a label with many values (propagation to values)

use catalog_core::models::{LabelChanges, LabelFields, LabelRecord, ValueChanges, ValueFields, ValueRecord};
use catalog_core::operations::StagedChange;
use catalog_core::services::CatalogStaging;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// Hierarchy with `labels` labels of `values` values each
fn hierarchy(labels: usize, values: usize) -> Vec<LabelRecord> {
    (0..labels)
        .map(|l| {
            let label_id = format!("L{}", l);
            LabelRecord::with_values(
                LabelFields {
                    label_id: label_id.clone(),
                    name: format!("Label {}", l),
                    ..Default::default()
                },
                (0..values)
                    .map(|v| {
                        ValueRecord::new(ValueFields {
                            value_id: format!("L{}-V{}", l, v),
                            label_id: label_id.clone(),
                            value: format!("Value {}", v),
                            ..Default::default()
                        })
                    })
                    .collect(),
            )
        })
        .collect()
}

fn bench_merge_repeated_updates(c: &mut Criterion) {
    c.bench_function("merge_100_updates_same_value", |b| {
        b.iter_batched(
            || CatalogStaging::new().with_labels(hierarchy(10, 10)),
            |mut staging| {
                for i in 0..100 {
                    staging.add_operation(StagedChange::update_value(
                        "L5-V5",
                        Some("L5".to_string()),
                        ValueChanges::new().with_alias(format!("alias {}", i)),
                    ));
                }
                black_box(staging.operations().len())
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_stage_across_hierarchy(c: &mut Criterion) {
    c.bench_function("stage_1000_value_edits_200x50", |b| {
        b.iter_batched(
            || CatalogStaging::new().with_labels(hierarchy(200, 50)),
            |mut staging| {
                for i in 0..1000 {
                    let l = i % 200;
                    let v = i % 50;
                    // No parent hint: exercises the full scan
                    staging.add_operation(StagedChange::update_value(
                        format!("L{}-V{}", l, v),
                        None,
                        ValueChanges::new().with_value(format!("edit {}", i)),
                    ));
                }
                black_box(staging.operations().len())
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_rename_large_label(c: &mut Criterion) {
    c.bench_function("rename_label_with_5000_values", |b| {
        b.iter_batched(
            || CatalogStaging::new().with_labels(hierarchy(1, 5000)),
            |mut staging| {
                staging.add_operation(StagedChange::update_label(
                    "L0",
                    LabelChanges::new().with_label_id("RENAMED"),
                ));
                black_box(staging.labels()[0].values.len())
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_merge_repeated_updates,
    bench_stage_across_hierarchy,
    bench_rename_large_label
);
criterion_main!(benches);
