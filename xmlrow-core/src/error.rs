//! Error taxonomy for the formatter.
//!
//! Every variant is fatal for the session: once an [`Importer`](crate::Importer)
//! has returned one, it returns the same error on every later call. Running
//! out of input is not an error: the scanner reports it as [`Step::NeedMoreInput`](crate::Step).

use std::ops::Range;

/// Reason a byte was rejected while locating or scanning a row element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanErrorCode {
    /// Leading byte that is neither whitespace nor `<`
    PrologStart = 0,
    /// End of stream before the prolog's `?>`
    UnterminatedProlog,
    /// Byte before the root `<` that is neither whitespace nor a prolog
    UnexpectedByte,
    /// `</` where the root element should open
    CloseBeforeOpen,
    /// `<!` or a second `<?` where the root element should open
    MarkupBeforeRoot,
    /// `<` inside an open or close tag
    NestedTagOpen,
    /// `<tag/>` while self-closing tags are rejected
    SelfClosingTag,
    /// End of stream inside the root element's open tag
    TruncatedTag,
}

impl ScanErrorCode {
    /// Get a human-readable message for this error code.
    pub fn message(self) -> &'static str {
        match self {
            Self::PrologStart => "expected '<?' or an element",
            Self::UnterminatedProlog => "stream ended inside prolog",
            Self::UnexpectedByte => "unexpected byte before root element",
            Self::CloseBeforeOpen => "closing tag before root element",
            Self::MarkupBeforeRoot => "markup before root element",
            Self::NestedTagOpen => "'<' inside a tag",
            Self::SelfClosingTag => "self-closing tag not allowed",
            Self::TruncatedTag => "stream ended inside a tag",
        }
    }
}

impl std::fmt::Display for ScanErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

pub type Result<T> = std::result::Result<T, FormatError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FormatError {
    #[error("invalid XML prolog in row {row} at offset {offset}: {code}")]
    MalformedProlog {
        row: u64,
        offset: u64,
        code: ScanErrorCode,
    },

    #[error("invalid XML element in row {row} at offset {offset}: {code}")]
    MalformedElement {
        row: u64,
        offset: u64,
        code: ScanErrorCode,
    },

    #[error(
        "unbalanced XML element in row {row}: stream ended at depth {depth} (bytes {}..{})",
        .range.start, .range.end
    )]
    UnbalancedElement {
        row: u64,
        depth: u32,
        range: Range<u64>,
        data: Vec<u8>,
    },

    #[error("could not parse XML of row {row} (bytes {}..{}): {message}", .range.start, .range.end)]
    TreeParseFailure {
        row: u64,
        range: Range<u64>,
        data: Vec<u8>,
        message: String,
    },

    #[error("unsupported data type `{type_name}` for column `{column}`")]
    UnsupportedColumnType { column: String, type_name: String },
}

impl FormatError {
    /// Row index the error was raised for, if it belongs to a row.
    pub fn row(&self) -> Option<u64> {
        match self {
            Self::MalformedProlog { row, .. }
            | Self::MalformedElement { row, .. }
            | Self::UnbalancedElement { row, .. }
            | Self::TreeParseFailure { row, .. } => Some(*row),
            Self::UnsupportedColumnType { .. } => None,
        }
    }

    /// Offending bytes, where the error carries them.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::UnbalancedElement { data, .. } | Self::TreeParseFailure { data, .. } => {
                Some(data.as_slice())
            }
            _ => None,
        }
    }
}
