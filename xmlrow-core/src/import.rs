//! Import: byte stream to rows.
//!
//! Each call to [`Importer::next_row`] yields at most one row:
//!
//! ```text
//! cursor ─▶ scanner (prolog, root, depth) ─▶ tree ─▶ column paths ─▶ codec ─▶ row
//! ```
//!
//! The tree is rebuilt for every row and dropped once the row is assembled.

use log::{debug, warn};

use crate::cursor::{StreamBuffer, StreamCursor};
use crate::error::{FormatError, Result};
use crate::options::ImportOptions;
use crate::scanner::{ParseState, ScanOutcome};
use crate::schema::Schema;
use crate::tree::ElementTree;
use crate::value::{decode, RowValues};

/// What one import call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Row(RowValues),
    /// The host must append bytes (or mark end of stream) and call again.
    NeedMoreInput,
    /// No rows remain.
    EndOfStream,
}

/// An import session over a fixed schema.
#[derive(Debug)]
pub struct Importer {
    schema: Schema,
    options: ImportOptions,
    state: ParseState,
    /// First fatal error; the session ends with it
    failed: Option<FormatError>,
}

impl Importer {
    pub fn new(schema: impl Into<Schema>) -> Self {
        Self::with_options(schema, ImportOptions::default())
    }

    pub fn with_options(schema: impl Into<Schema>, options: ImportOptions) -> Self {
        Self {
            schema: schema.into(),
            options,
            state: ParseState::new(),
            failed: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Scanner state, persisted across [`Step::NeedMoreInput`].
    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// The error that ended this session, if any.
    pub fn failed(&self) -> Option<&FormatError> {
        self.failed.as_ref()
    }

    /// Produce the next row from the host's bytes.
    ///
    /// After a fatal error every call returns that error again without
    /// touching the cursor.
    pub fn next_row<C: StreamCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<Step> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        let result = self.advance(cursor);
        if let Err(err) = &result {
            self.failed = Some(err.clone());
        }
        result
    }

    fn advance<C: StreamCursor + ?Sized>(&mut self, cursor: &mut C) -> Result<Step> {
        match self.state.scan(cursor, &self.options)? {
            ScanOutcome::Complete => {}
            ScanOutcome::NeedMoreInput => return Ok(Step::NeedMoreInput),
            ScanOutcome::EndOfStream => return Ok(Step::EndOfStream),
        }

        let row_index = self.state.row_index();
        let data = self.state.element();
        let tree = match ElementTree::parse(data) {
            Ok(tree) => tree,
            Err(err) => {
                let err = FormatError::TreeParseFailure {
                    row: row_index,
                    range: self.state.element_range(),
                    data: data.to_vec(),
                    message: err.to_string(),
                };
                warn!("{}", err);
                cursor.report_bad_row(row_index, data);
                return Err(err);
            }
        };

        let row = assemble_row(&self.schema, &tree, row_index);
        debug!("row {}: emitted from {} bytes", row_index, data.len());
        Ok(Step::Row(row))
    }
}

/// Resolve every column against `tree` and decode it.
///
/// A column whose path does not resolve is null; the tree is left untouched
/// so later columns see the same shape.
pub fn assemble_row(schema: &Schema, tree: &ElementTree, row_index: u64) -> RowValues {
    let mut row = RowValues::with_capacity(schema.len());
    for column in schema.columns() {
        let value = match tree.resolve(column.path()) {
            Some(id) => {
                let node = tree.node(id);
                decode(column.kind(), node.tag(), node.text())
            }
            None => {
                debug!("row {}: column `{}` not present, null", row_index, column.name());
                None
            }
        };
        row.push(value);
    }
    row
}

/// Import every row of a complete byte string.
pub fn import_all(schema: impl Into<Schema>, input: &[u8]) -> Result<Vec<RowValues>> {
    let mut importer = Importer::new(schema);
    let mut buf = StreamBuffer::complete(input);
    let mut rows = Vec::new();
    loop {
        match importer.next_row(&mut buf)? {
            Step::Row(row) => rows.push(row),
            Step::NeedMoreInput | Step::EndOfStream => return Ok(rows),
        }
    }
}
