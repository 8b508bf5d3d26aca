//! Benchmarks for row import and export.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use xmlrow_core::{
    import_all, ColumnDescriptor, Datum, Exporter, Importer, RowValues, ScalarKind, Schema,
    StreamBuffer, Step,
};

fn schema() -> Schema {
    Schema::new(vec![
        ColumnDescriptor::new("id", ScalarKind::Integer),
        ColumnDescriptor::new("user.name", ScalarKind::Text),
        ColumnDescriptor::new("user.score", ScalarKind::Float),
        ColumnDescriptor::new("missing", ScalarKind::Integer),
    ])
}

/// `rows` exported rows, as one stream.
fn stream(rows: usize) -> Vec<u8> {
    let mut exporter = Exporter::new(schema());
    let mut out = Vec::new();
    for i in 0..rows {
        let row = RowValues::new(vec![
            Some(Datum::Integer(i as i64)),
            Some(Datum::Text(format!("user & {}", i))),
            Some(Datum::Float(i as f64 * 0.25)),
            None,
        ]);
        exporter.format_row_into(&row, &mut out);
    }
    out
}

fn import_in_chunks(input: &[u8], chunk: usize) -> usize {
    let mut importer = Importer::new(schema());
    let mut buf = StreamBuffer::new();
    let mut chunks = input.chunks(chunk);
    let mut count = 0;
    loop {
        match importer.next_row(&mut buf) {
            Ok(Step::Row(_)) => count += 1,
            Ok(Step::NeedMoreInput) => match chunks.next() {
                Some(c) => buf.push(c),
                None => buf.finish(),
            },
            Ok(Step::EndOfStream) | Err(_) => return count,
        }
    }
}

/// Whole-buffer import against small and large chunking.
fn bench_import(c: &mut Criterion) {
    let input = stream(1_000);

    let mut group = c.benchmark_group("import");
    group.throughput(Throughput::Bytes(input.len() as u64));

    group.bench_function("whole_buffer", |b| {
        b.iter(|| import_all(schema(), black_box(&input)).map(|rows| rows.len()))
    });

    for chunk in [16usize, 4096] {
        group.bench_function(format!("chunks_{}", chunk), |b| {
            b.iter(|| import_in_chunks(black_box(&input), chunk))
        });
    }

    group.finish();
}

/// Export with the cached tree.
fn bench_export(c: &mut Criterion) {
    let row = RowValues::new(vec![
        Some(Datum::Integer(42)),
        Some(Datum::from("ada <lovelace>")),
        Some(Datum::Float(2.5)),
        None,
    ]);

    let mut group = c.benchmark_group("export");
    group.bench_function("format_row", |b| {
        let mut exporter = Exporter::new(schema());
        let mut out = Vec::with_capacity(256);
        b.iter(|| {
            out.clear();
            exporter.format_row_into(black_box(&row), &mut out);
            out.len()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_import, bench_export);
criterion_main!(benches);
