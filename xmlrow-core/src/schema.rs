//! Row schema: column names, dotted paths and scalar families.

use std::fmt;

use crate::error::{FormatError, Result};

/// The three scalar families the codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Integer,
    Float,
    Text,
}

/// Host type names accepted by [`ColumnDescriptor::from_type_name`].
static TYPE_NAMES: phf::Map<&'static str, ScalarKind> = phf::phf_map! {
    "int2" => ScalarKind::Integer,
    "int4" => ScalarKind::Integer,
    "int8" => ScalarKind::Integer,
    "smallint" => ScalarKind::Integer,
    "int" => ScalarKind::Integer,
    "integer" => ScalarKind::Integer,
    "bigint" => ScalarKind::Integer,
    "float4" => ScalarKind::Float,
    "float8" => ScalarKind::Float,
    "real" => ScalarKind::Float,
    "double" => ScalarKind::Float,
    "double precision" => ScalarKind::Float,
    "text" => ScalarKind::Text,
    "varchar" => ScalarKind::Text,
    "character varying" => ScalarKind::Text,
    "char" => ScalarKind::Text,
    "bpchar" => ScalarKind::Text,
};

impl ScalarKind {
    /// Look up a host type name (case-insensitive).
    pub fn from_type_name(name: &str) -> Option<Self> {
        let name = name.trim();
        TYPE_NAMES
            .get(name)
            .or_else(|| TYPE_NAMES.get(name.to_ascii_lowercase().as_str()))
            .copied()
    }
}

/// A column name split on `.` into element tags.
///
/// `a.b.c` resolves to `c` found below `b` found below `a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPath {
    segments: Vec<String>,
}

impl ColumnPath {
    pub fn parse(name: &str) -> Self {
        Self {
            segments: name.split('.').map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for ColumnPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// One column of the row schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    name: String,
    path: ColumnPath,
    kind: ScalarKind,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        let name = name.into();
        let path = ColumnPath::parse(&name);
        Self { name, path, kind }
    }

    /// Build a column from a host type name such as `int4` or `varchar`.
    pub fn from_type_name(name: impl Into<String>, type_name: &str) -> Result<Self> {
        let name = name.into();
        match ScalarKind::from_type_name(type_name) {
            Some(kind) => Ok(Self::new(name, kind)),
            None => Err(FormatError::UnsupportedColumnType {
                column: name,
                type_name: type_name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &ColumnPath {
        &self.path
    }

    pub fn kind(&self) -> ScalarKind {
        self.kind
    }
}

/// Ordered columns of a formatting session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<ColumnDescriptor>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Build from `(name, host type name)` pairs, failing on the first
    /// type without a codec.
    pub fn from_type_names<'n, I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'n str, &'n str)>,
    {
        let columns = columns
            .into_iter()
            .map(|(name, type_name)| ColumnDescriptor::from_type_name(name, type_name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Position of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

impl From<Vec<ColumnDescriptor>> for Schema {
    fn from(columns: Vec<ColumnDescriptor>) -> Self {
        Self::new(columns)
    }
}
