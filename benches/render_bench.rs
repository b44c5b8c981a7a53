use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dbview::graph::{DotFull, DotLight, DotMedium, Layout, RenderConfig, Renderer};
use dbview::loader::Loader;
use dbview::schema::Database;
use std::hint::black_box;

/// A chain of tables, each referencing its predecessor plus a shared lookup table
fn generate_schema(tables: usize) -> String {
    let mut sql = String::from(
        "CREATE TABLE lookup (id INT NOT NULL, label VARCHAR(64), PRIMARY KEY (id));\n",
    );
    for t in 0..tables {
        sql.push_str(&format!(
            "CREATE TABLE table_{t} (\n  id INT NOT NULL,\n  lookup_id INT NOT NULL,\n  parent_id INT,\n  name VARCHAR(255),\n  created_at DATETIME NOT NULL,\n  PRIMARY KEY (id),\n  KEY idx_name_created (name, created_at),\n  FOREIGN KEY (lookup_id) REFERENCES lookup (id)"
        ));
        if t > 0 {
            sql.push_str(&format!(
                ",\n  FOREIGN KEY (parent_id) REFERENCES table_{} (id)",
                t - 1
            ));
        }
        sql.push_str("\n);\n");
    }
    sql
}

fn load(tables: usize) -> Database {
    Loader::new().load_str(&generate_schema(tables)).unwrap()
}

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for tables in [50, 500] {
        let sql = generate_schema(tables);
        group.throughput(Throughput::Bytes(sql.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(tables), &sql, |b, sql| {
            b.iter(|| Loader::new().load_str(black_box(sql)).unwrap())
        });
    }

    group.finish();
}

fn bench_relations(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_relations");

    for tables in [50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(tables), &tables, |b, &tables| {
            b.iter_batched(
                || load(tables),
                |db| black_box(db.compute_relations().relation_count()),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let db = load(200);
    let config = RenderConfig::new(Layout::LR);
    db.compute_relations();

    let renderers: Vec<Box<dyn Renderer>> = vec![Box::new(DotFull), Box::new(DotMedium), Box::new(DotLight)];
    for renderer in &renderers {
        group.bench_function(renderer.name(), |b| {
            b.iter(|| renderer.render(black_box(&db), &[], &config).unwrap())
        });
    }

    group.finish();
}

fn bench_zoom(c: &mut Criterion) {
    let mut group = c.benchmark_group("zoom");
    let db = load(200);
    let seed = db.require_table("table_100").unwrap();

    for level in [1, 4, 16] {
        group.bench_with_input(BenchmarkId::from_parameter(level), &level, |b, &level| {
            b.iter(|| db.zoom(black_box(&[seed]), level).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_load, bench_relations, bench_render, bench_zoom);
criterion_main!(benches);
