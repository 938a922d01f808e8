use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use schema_atlas::analyzer::find_implied_constraints;
use schema_atlas::graph::{table_diagram, Degrees, DotSettings};
use schema_atlas::schema::{Column, ColumnId, Schema, Table, TableId};
use std::hint::black_box;

fn int_column(name: &str) -> Column {
    let mut column = Column::new(name, "int", ColumnId(0));
    column.type_code = Some(4);
    column.length = 4;
    column
}

/// `t<i>` keyed by `t<i>_key`, each referencing up to three earlier tables
/// by name only.
fn generate_schema(tables: usize) -> Schema {
    let mut schema = Schema::new();
    for i in 0..tables {
        let mut table = Table::new(format!("t{}", i), TableId(0));
        table.add_column(int_column(&format!("t{}_key", i)));
        for j in 1..=3 {
            if i >= j * 7 {
                table.add_column(int_column(&format!("t{}_key", i - j * 7)));
            }
        }
        let mut note = Column::new("note", "text", ColumnId(0));
        note.length = 0;
        table.add_column(note);
        table.set_primary_key(vec![ColumnId(0)]);
        schema.add_table(table);
    }
    schema
}

fn bench_find_implied(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_implied");

    for tables in [10, 50, 200] {
        let schema = generate_schema(tables);
        group.throughput(Throughput::Elements(tables as u64));
        group.bench_with_input(
            BenchmarkId::new("tables", tables),
            &schema,
            |b, schema| b.iter(|| black_box(find_implied_constraints(schema))),
        );
    }

    group.finish();
}

fn bench_table_diagram(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_diagram");
    let mut schema = generate_schema(200);
    let implied = find_implied_constraints(&schema);
    schema.link_constraints(implied);
    let settings = DotSettings::default();
    let focal = schema.get_table_id("t100").unwrap();

    for degrees in [Degrees::One, Degrees::Two] {
        group.bench_with_input(
            BenchmarkId::new("degrees", degrees),
            &degrees,
            |b, &degrees| {
                b.iter(|| black_box(table_diagram(&schema, &settings, focal, degrees, true)))
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_find_implied, bench_table_diagram);

criterion_main!(benches);
