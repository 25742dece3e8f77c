use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dtg_directory::catalog::{LevelCode, PartialCatalog};
use dtg_directory::{default_catalog, filter, merge};
use serde_json::json;

fn uk_overlay() -> PartialCatalog {
    PartialCatalog::from_value(&json!({
        "h": {
            "label": "Secondary",
            "subjects": {
                "History": [
                    { "t": "British Library - Learning", "u": "https://www.bl.uk/learning", "d": "Primary sources (UK)." },
                    { "t": "The National Archives", "u": "https://www.nationalarchives.gov.uk/education/", "d": "Classroom resources." }
                ]
            }
        }
    }))
}

fn bench_merge(c: &mut Criterion) {
    let base = default_catalog();
    let empty = PartialCatalog::default();
    let overlay = uk_overlay();
    c.bench_function("merge::no_op", |b| {
        b.iter(|| {
            let merged = merge::merge(base, &empty);
            black_box(merged.h.subjects.len());
        });
    });
    c.bench_function("merge::region_overlay", |b| {
        b.iter(|| {
            let merged = merge::merge(base, &overlay);
            black_box(merged.h.subjects.len());
        });
    });
}

fn bench_filter(c: &mut Criterion) {
    let catalog = default_catalog();
    const QUERIES: &[&str] = &["", "phet", "bbc.co.uk", "no-such-term"];
    for &query in QUERIES {
        let label = if query.is_empty() { "empty" } else { query };
        c.bench_with_input(
            BenchmarkId::new("visible_items", label),
            &query,
            |b, &query| {
                b.iter(|| {
                    let items =
                        filter::visible_items(catalog, LevelCode::H, "Science", query);
                    black_box(items.len());
                });
            },
        );
    }
}

criterion_group!(benches, bench_merge, bench_filter);
criterion_main!(benches);
