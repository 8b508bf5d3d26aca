//! Scalar codec and row values.
//!
//! Numeric decoding is lax, like C `atoi`/`atof`: leading
//! whitespace is skipped, the longest numeric prefix is used, and text with no
//! numeric prefix decodes as zero instead of failing.

use std::fmt;

use crate::schema::{ScalarKind, Schema};

/// Reserved tag/text marking an absent value.
pub const NULL_MARKER: &str = "null";

/// A typed column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Datum {
    /// The value a null of `kind` is written as on export.
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Integer => Datum::Integer(0),
            ScalarKind::Float => Datum::Float(0.0),
            ScalarKind::Text => Datum::Text(String::new()),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Datum::Integer(_) => ScalarKind::Integer,
            Datum::Float(_) => ScalarKind::Float,
            Datum::Text(_) => ScalarKind::Text,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Datum::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Datum::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Datum::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert into `kind`, using the same lax rules as decoding.
    pub fn coerce(self, kind: ScalarKind) -> Datum {
        match (self, kind) {
            (d @ Datum::Integer(_), ScalarKind::Integer)
            | (d @ Datum::Float(_), ScalarKind::Float)
            | (d @ Datum::Text(_), ScalarKind::Text) => d,
            (Datum::Float(f), ScalarKind::Integer) => Datum::Integer(f as i64),
            (Datum::Text(s), ScalarKind::Integer) => Datum::Integer(parse_integer(&s)),
            (Datum::Integer(i), ScalarKind::Float) => Datum::Float(i as f64),
            (Datum::Text(s), ScalarKind::Float) => Datum::Float(parse_float(&s)),
            (d, ScalarKind::Text) => Datum::Text(d.to_string()),
        }
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Integer(i) => write!(f, "{}", i),
            // Debug keeps the fraction on whole numbers ("0.0", not "0")
            Datum::Float(v) => write!(f, "{:?}", v),
            Datum::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Datum {
    fn from(v: i64) -> Self {
        Datum::Integer(v)
    }
}

impl From<f64> for Datum {
    fn from(v: f64) -> Self {
        Datum::Float(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Text(v.to_string())
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Text(v)
    }
}

/// C `isspace`.
#[inline]
fn is_c_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn trim_c_space(text: &str) -> &[u8] {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| !is_c_space(b)).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Longest integer prefix of `text`, or 0.
pub fn parse_integer(text: &str) -> i64 {
    lexical_core::parse_partial::<i64>(trim_c_space(text))
        .map(|(value, _)| value)
        .unwrap_or(0)
}

/// Longest float prefix of `text`, or 0.0.
pub fn parse_float(text: &str) -> f64 {
    let bytes = trim_c_space(text);
    match lexical_core::parse_partial::<f64>(bytes) {
        Ok((value, _)) => value,
        // A dangling exponent ("1e", "2.5e+") ends the prefix at the `e`
        Err(_) => bytes
            .iter()
            .position(|&b| b == b'e' || b == b'E')
            .and_then(|i| lexical_core::parse_partial::<f64>(&bytes[..i]).ok())
            .map_or(0.0, |(value, _)| value),
    }
}

/// Decode a node into a column value. `None` is SQL null.
///
/// A node tagged `null` or holding the text `null` is null whatever `kind`
/// says. A node without text decodes as the kind's zero.
pub fn decode(kind: ScalarKind, tag: &str, text: Option<&str>) -> Option<Datum> {
    if tag == NULL_MARKER || text == Some(NULL_MARKER) {
        return None;
    }
    let text = text.unwrap_or("");
    Some(match kind {
        ScalarKind::Integer => Datum::Integer(parse_integer(text)),
        ScalarKind::Float => Datum::Float(parse_float(text)),
        ScalarKind::Text => Datum::Text(text.to_string()),
    })
}

/// Encode a column value as node text. Nulls become the kind's zero.
pub fn encode(kind: ScalarKind, value: Option<&Datum>) -> String {
    match value {
        None => Datum::zero(kind).to_string(),
        Some(d) if d.kind() == kind => d.to_string(),
        Some(d) => d.clone().coerce(kind).to_string(),
    }
}

/// One row of column values in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowValues {
    values: Vec<Option<Datum>>,
}

impl RowValues {
    pub fn new(values: Vec<Option<Datum>>) -> Self {
        Self { values }
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            values: Vec::with_capacity(n),
        }
    }

    /// Reorder named fields into `schema` order, coercing each to its
    /// column's kind. Columns without a field are null; unknown names are
    /// ignored.
    pub fn from_fields<'n, I>(schema: &Schema, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'n str, Option<Datum>)>,
    {
        let mut values = vec![None; schema.len()];
        for (name, value) in fields {
            if let Some(i) = schema.position(name) {
                let kind = schema.columns()[i].kind();
                values[i] = value.map(|d| d.coerce(kind));
            }
        }
        Self { values }
    }

    pub fn push(&mut self, value: Option<Datum>) {
        self.values.push(value);
    }

    /// Value of column `i`, `None` when null or out of range.
    pub fn get(&self, i: usize) -> Option<&Datum> {
        self.values.get(i).and_then(Option::as_ref)
    }

    pub fn is_null(&self, i: usize) -> bool {
        self.get(i).is_none()
    }

    /// Null flags in column order.
    pub fn nulls(&self) -> impl Iterator<Item = bool> + '_ {
        self.values.iter().map(Option::is_none)
    }

    pub fn values(&self) -> &[Option<Datum>] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Option<Datum>> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnDescriptor;

    #[test]
    fn test_integer_leniency() {
        assert_eq!(parse_integer("42"), 42);
        assert_eq!(parse_integer("  -17"), -17);
        assert_eq!(parse_integer("12abc"), 12);
        assert_eq!(parse_integer("abc"), 0);
        assert_eq!(parse_integer(""), 0);
        assert_eq!(parse_integer("\n 7 "), 7);
    }

    #[test]
    fn test_float_leniency() {
        assert_eq!(parse_float("3.5"), 3.5);
        assert_eq!(parse_float(" 2.25kg"), 2.25);
        assert_eq!(parse_float("-1e3"), -1000.0);
        assert_eq!(parse_float("x1.0"), 0.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("2.5e+"), 2.5);
        assert_eq!(parse_float(" -4E-kg"), -4.0);
        assert_eq!(parse_float("e5"), 0.0);
        assert_eq!(parse_float(".5"), 0.5);
    }

    #[test]
    fn test_null_marker_wins() {
        assert_eq!(decode(ScalarKind::Integer, "null", Some("5")), None);
        assert_eq!(decode(ScalarKind::Text, "name", Some("null")), None);
        assert_eq!(decode(ScalarKind::Float, "v", Some("null")), None);
        assert_eq!(decode(ScalarKind::Text, "name", Some("nullable")), Some(Datum::from("nullable")));
    }

    #[test]
    fn test_missing_text_decodes_as_zero() {
        assert_eq!(decode(ScalarKind::Integer, "a", None), Some(Datum::Integer(0)));
        assert_eq!(decode(ScalarKind::Float, "a", None), Some(Datum::Float(0.0)));
        assert_eq!(decode(ScalarKind::Text, "a", None), Some(Datum::from("")));
    }

    #[test]
    fn test_encode_nulls_lossy() {
        assert_eq!(encode(ScalarKind::Integer, None), "0");
        assert_eq!(encode(ScalarKind::Float, None), "0.0");
        assert_eq!(encode(ScalarKind::Text, None), "");
    }

    #[test]
    fn test_encode_coerces_kind() {
        assert_eq!(encode(ScalarKind::Integer, Some(&Datum::from("12"))), "12");
        assert_eq!(encode(ScalarKind::Float, Some(&Datum::Integer(3))), "3.0");
        assert_eq!(encode(ScalarKind::Text, Some(&Datum::Float(1.5))), "1.5");
    }

    #[test]
    fn test_from_fields_uses_schema_order() {
        let schema = Schema::new(vec![
            ColumnDescriptor::new("id", ScalarKind::Integer),
            ColumnDescriptor::new("name", ScalarKind::Text),
            ColumnDescriptor::new("score", ScalarKind::Float),
        ]);
        let row = RowValues::from_fields(
            &schema,
            [
                ("name", Some(Datum::from("ada"))),
                ("extra", Some(Datum::Integer(9))),
                ("id", Some(Datum::from("7"))),
            ],
        );
        assert_eq!(
            row.values(),
            &[Some(Datum::Integer(7)), Some(Datum::from("ada")), None]
        );
        assert_eq!(row.nulls().collect::<Vec<_>>(), vec![false, false, true]);
    }
}
