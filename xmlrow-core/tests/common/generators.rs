//! Stochastic document generators for boundary tests
//!
//! Uses seeded RNG for reproducibility. Print seed on failure for replay.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use xmlrow_core::{Datum, RowValues};

/// Seeded generator for reproducible stochastic tests
pub struct Gen {
    pub rng: StdRng,
    pub seed: u64,
}

/// One generated row: its XML text and the values it should import as
/// under [`test_schema`](super::test_schema).
pub struct GeneratedRow {
    pub xml: Vec<u8>,
    pub expected: RowValues,
}

impl Gen {
    /// Create with specific seed (for reproduction)
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create from environment or random seed
    pub fn from_env_or_random() -> Self {
        let seed = std::env::var("XMLROW_TEST_SEED")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(rand::random);
        Self::new(seed)
    }

    /// Random boolean with probability p
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen::<f64>() < p
    }

    /// Run of XML whitespace, often empty
    pub fn whitespace(&mut self) -> Vec<u8> {
        let len = if self.chance(0.5) { 0 } else { self.rng.gen_range(1..4) };
        (0..len)
            .map(|_| [b' ', b'\n', b'\r', b'\t'][self.rng.gen_range(0..4)])
            .collect()
    }

    /// Text value with characters that need escaping
    pub fn text(&mut self) -> String {
        let chars = ['a', 'b', 'z', ' ', '<', '>', '&', 'é', '1'];
        let len = self.rng.gen_range(1..12);
        let mut s: String = (0..len).map(|_| chars[self.rng.gen_range(0..chars.len())]).collect();
        // Leading/trailing spaces survive, but a whitespace-only value is
        // indistinguishable from indentation
        if s.trim().is_empty() {
            s.push('x');
        }
        s
    }

    /// One row element with random layout. Columns are independently
    /// present, absent, or the null marker.
    pub fn row(&mut self) -> GeneratedRow {
        let mut xml = Vec::new();
        let mut expected = RowValues::with_capacity(4);

        if self.chance(0.4) {
            xml.extend_from_slice(b"<?xml version=\"1.0\"?>");
        }
        xml.extend(self.whitespace());
        xml.extend_from_slice(b"<row>");

        // id
        xml.extend(self.whitespace());
        if self.chance(0.8) {
            let id: i64 = self.rng.gen_range(-100_000..100_000);
            xml.extend_from_slice(format!("<id>{}</id>", id).as_bytes());
            expected.push(Some(Datum::Integer(id)));
        } else {
            expected.push(None);
        }

        // name
        xml.extend(self.whitespace());
        if self.chance(0.1) {
            xml.extend_from_slice(b"<name>null</name>");
            expected.push(None);
        } else if self.chance(0.8) {
            let name = self.text();
            let escaped = name.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;");
            xml.extend_from_slice(format!("<name>{}</name>", escaped).as_bytes());
            expected.push(Some(Datum::Text(name)));
        } else {
            expected.push(None);
        }

        // a.b, optionally behind a comment and an empty sibling
        xml.extend(self.whitespace());
        if self.chance(0.2) {
            xml.extend_from_slice(b"<!-- note --><skip/>");
        }
        if self.chance(0.8) {
            let v: f64 = self.rng.gen_range(-1.0e6..1.0e6);
            xml.extend_from_slice(format!("<a>{}<b>{:?}</b></a>", self.whitespace_str(), v).as_bytes());
            expected.push(Some(Datum::Float(v)));
        } else {
            expected.push(None);
        }

        // missing.field is never present
        expected.push(None);

        xml.extend(self.whitespace());
        xml.extend_from_slice(b"</row>");
        xml.extend(self.whitespace());

        GeneratedRow { xml, expected }
    }

    /// Several rows concatenated into one stream.
    pub fn stream(&mut self, rows: usize) -> (Vec<u8>, Vec<RowValues>) {
        let mut xml = Vec::new();
        let mut expected = Vec::with_capacity(rows);
        for _ in 0..rows {
            let row = self.row();
            xml.extend(row.xml);
            expected.push(row.expected);
        }
        (xml, expected)
    }

    /// Random cut positions within `len`.
    pub fn cuts(&mut self, len: usize) -> Vec<usize> {
        let count = self.rng.gen_range(0..=len.min(16));
        (0..count).map(|_| self.rng.gen_range(0..=len)).collect()
    }

    fn whitespace_str(&mut self) -> String {
        String::from_utf8(self.whitespace()).unwrap_or_default()
    }
}
