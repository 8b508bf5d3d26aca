//! Export: rows to XML text.
//!
//! The element structure for a schema is built once, on the first row, and
//! reused: every later row only overwrites leaf text before the tree is
//! serialized again.

use log::debug;

use crate::options::ExportOptions;
use crate::schema::Schema;
use crate::tree::{ElementTree, NodeId};
use crate::value::{encode, RowValues};

/// The persisted export structure plus one cached leaf per column.
#[derive(Debug, Clone)]
pub struct ExportTree {
    tree: ElementTree,
    leaves: Vec<NodeId>,
}

impl ExportTree {
    /// Create an element for every column path under a `root_tag` element.
    pub fn build(schema: &Schema, root_tag: &str) -> Self {
        let mut tree = ElementTree::new(root_tag);
        let leaves = schema
            .columns()
            .iter()
            .map(|column| tree.resolve_or_create(column.path()))
            .collect();
        debug!("export tree built: {} elements for {} columns", tree.len(), schema.len());
        Self { tree, leaves }
    }

    pub fn tree(&self) -> &ElementTree {
        &self.tree
    }

    /// Leaf element for column `i`.
    pub fn leaf(&self, i: usize) -> Option<NodeId> {
        self.leaves.get(i).copied()
    }

    fn update(&mut self, schema: &Schema, row: &RowValues) {
        for (i, column) in schema.columns().iter().enumerate() {
            let text = encode(column.kind(), row.get(i));
            self.tree.set_text(self.leaves[i], &text);
        }
    }
}

/// An export session over a fixed schema.
#[derive(Debug)]
pub struct Exporter {
    schema: Schema,
    options: ExportOptions,
    tree: Option<ExportTree>,
}

impl Exporter {
    pub fn new(schema: impl Into<Schema>) -> Self {
        Self::with_options(schema, ExportOptions::default())
    }

    pub fn with_options(schema: impl Into<Schema>, options: ExportOptions) -> Self {
        Self {
            schema: schema.into(),
            options,
            tree: None,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The cached structure, once the first row has been formatted.
    pub fn export_tree(&self) -> Option<&ExportTree> {
        self.tree.as_ref()
    }

    /// Format one row as a prolog-prefixed element and a trailing newline.
    ///
    /// Null values are written as `0`, `0.0` or empty text.
    pub fn format_row(&mut self, row: &RowValues) -> Vec<u8> {
        let mut out = Vec::new();
        self.format_row_into(row, &mut out);
        out
    }

    /// Like [`format_row`](Self::format_row), appending to `out`.
    pub fn format_row_into(&mut self, row: &RowValues, out: &mut Vec<u8>) {
        let schema = &self.schema;
        let root_tag = &self.options.root_tag;
        let tree = self
            .tree
            .get_or_insert_with(|| ExportTree::build(schema, root_tag));
        tree.update(schema, row);

        if let Some(declaration) = &self.options.declaration {
            out.extend_from_slice(b"<?xml ");
            out.extend_from_slice(declaration.as_bytes());
            out.extend_from_slice(b"?>");
        }
        tree.tree.write_xml(out);
        out.push(b'\n');
    }
}
