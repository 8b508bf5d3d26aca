//! Test infrastructure for the row formatter
//!
//! Provides chunked feeding helpers and seeded document generation.
#![allow(dead_code)]

mod generators;

pub use generators::{Gen, GeneratedRow};

use xmlrow_core::{
    ColumnDescriptor, FormatError, Importer, RowValues, ScalarKind, Schema, StreamBuffer, Step,
};

/// Schema used by generated documents.
pub fn test_schema() -> Schema {
    Schema::new(vec![
        ColumnDescriptor::new("id", ScalarKind::Integer),
        ColumnDescriptor::new("name", ScalarKind::Text),
        ColumnDescriptor::new("a.b", ScalarKind::Float),
        ColumnDescriptor::new("missing.field", ScalarKind::Integer),
    ])
}

/// Feed `chunks` one at a time, only when the importer asks for more.
pub fn import_chunked(schema: &Schema, chunks: &[&[u8]]) -> Result<Vec<RowValues>, FormatError> {
    let mut importer = Importer::new(schema.clone());
    let mut buf = StreamBuffer::new();
    let mut chunks = chunks.iter();
    let mut rows = Vec::new();

    loop {
        match importer.next_row(&mut buf)? {
            Step::Row(row) => rows.push(row),
            Step::NeedMoreInput => match chunks.next() {
                Some(chunk) => buf.push(chunk),
                None => buf.finish(),
            },
            Step::EndOfStream => return Ok(rows),
        }
    }
}

/// Split `input` at the given (unsorted, possibly repeated) positions.
pub fn split_at_positions<'a>(input: &'a [u8], positions: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = positions.iter().map(|&p| p.min(input.len())).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(&input[start..cut]);
        start = cut;
    }
    chunks.push(&input[start..]);
    chunks
}
