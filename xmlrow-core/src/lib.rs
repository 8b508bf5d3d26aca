//! XML Row Formatter Core
//!
//! Converts between a chunked byte stream of concatenated XML elements and a
//! sequence of typed rows, and back.
//!
//! # Architecture
//!
//! - **cursor.rs** - Host capability trait and an owned stream buffer
//! - **scanner.rs** - Resumable prolog/root/depth scanner, one element per call
//! - **tree.rs** - Arena element tree, dotted-path resolution, serialization
//! - **schema.rs** - Columns, dotted paths, host type names
//! - **value.rs** - Scalar codec and row values
//! - **import.rs** / **export.rs** - The two session types
//!
//! # Example
//!
//! ```
//! use xmlrow_core::{import_all, ColumnDescriptor, Datum, ScalarKind};
//!
//! let columns = vec![
//!     ColumnDescriptor::new("id", ScalarKind::Integer),
//!     ColumnDescriptor::new("a.b", ScalarKind::Text),
//! ];
//! let rows = import_all(columns, b"<row><id>1</id><a><b>x</b></a></row>").unwrap();
//! assert_eq!(rows[0].get(0), Some(&Datum::Integer(1)));
//! assert_eq!(rows[0].get(1), Some(&Datum::from("x")));
//! ```

pub mod cursor;
pub mod error;
pub mod export;
pub mod import;
pub mod options;
pub mod scanner;
pub mod schema;
pub mod tree;
pub mod value;

pub use cursor::{StreamBuffer, StreamCursor};
pub use error::{FormatError, Result, ScanErrorCode};
pub use export::{ExportTree, Exporter};
pub use import::{assemble_row, import_all, Importer, Step};
pub use options::{ExportOptions, ImportOptions, SelfClosingPolicy};
pub use scanner::{ParseState, ScanOutcome, ScanState};
pub use schema::{ColumnDescriptor, ColumnPath, ScalarKind, Schema};
pub use tree::{ElementTree, NodeId};
pub use value::{Datum, RowValues, NULL_MARKER};
