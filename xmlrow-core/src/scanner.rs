//! Resumable element-boundary scanner.
//!
//! Locates exactly one complete top-level element per call, copying its bytes
//! out of the host buffer as they are consumed so the host is free to discard
//! them between calls. When the buffer runs dry before the element balances,
//! the scanner saves its position in [`ParseState`] and asks for more input.
//!
//! # States
//!
//! ```text
//! AwaitProlog ──"<?"──▶ InProlog ──"?>"──▶ AwaitRoot
//!      └──────────"<x"─────────────────────────┘
//! AwaitRoot ──"<"──▶ InOpenTag ──">"──▶ Outside ◀──">"── InCloseTag
//!                       ▲   "/>" at depth 0 ─▶ Balanced      ▲
//!                       └──"<"── Outside ──"</"──────────────┘
//!                                  └──"<!" / "<?"──▶ InMarkup ──">"──▶ Outside
//! InCloseTag ──">" at depth 0──▶ Balanced
//! ```
//!
//! Any byte with no transition in this table is an error; in particular a
//! `<` inside an open or close tag is rejected rather than silently toggling
//! state.

use std::ops::Range;

use log::{trace, warn};
use memchr::{memchr, memchr2};

use crate::cursor::StreamCursor;
use crate::error::{FormatError, Result, ScanErrorCode};
use crate::options::{ImportOptions, SelfClosingPolicy};

/// Where the scanner is within the current row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Skipping whitespace before an optional `<?...?>` prolog
    AwaitProlog,
    /// Inside the prolog, looking for `?>`
    InProlog,
    /// Skipping whitespace before the root element's `<`
    AwaitRoot,
    /// Character data between tags (depth >= 1)
    Outside,
    /// After `<name`, waiting for `>`
    InOpenTag,
    /// After `</`, waiting for `>`
    InCloseTag,
    /// After `<!` or `<?` inside the body, waiting for `>`
    InMarkup,
    /// The root element has been closed
    Balanced,
}

/// Result of one scan call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A full element is available through [`ParseState::element`].
    Complete,
    /// The buffer was exhausted; call again once the host has more bytes.
    NeedMoreInput,
    /// End of stream with no row started.
    EndOfStream,
}

/// Scanner state persisted across suspensions.
///
/// Offsets are absolute stream positions, so a resumed scan does not depend
/// on where the host's buffer happens to start.
#[derive(Debug, Clone)]
pub struct ParseState {
    state: ScanState,
    /// Bytes of the row element consumed so far
    accumulated: Vec<u8>,
    /// Stream offset of the root element's `<`
    element_start: Option<u64>,
    depth: u32,
    row_index: u64,
    /// Last byte consumed inside the prolog was `?`
    prolog_question: bool,
}

/// The host bytes visible to one scan call.
struct Input<'b> {
    bytes: &'b [u8],
    base: u64,
    eof: bool,
}

impl Input<'_> {
    #[inline]
    fn offset(&self, pos: usize) -> u64 {
        self.base + pos as u64
    }
}

impl ParseState {
    pub fn new() -> Self {
        Self {
            state: ScanState::AwaitProlog,
            accumulated: Vec::new(),
            element_start: None,
            depth: 0,
            row_index: 0,
            prolog_question: false,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Count of unclosed elements in the row being scanned.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Zero-based index of the row being scanned.
    pub fn row_index(&self) -> u64 {
        self.row_index
    }

    /// Bytes of the current row element (complete after [`ScanOutcome::Complete`]).
    pub fn element(&self) -> &[u8] {
        &self.accumulated
    }

    /// Half-open stream range of [`element`](Self::element).
    pub fn element_range(&self) -> Range<u64> {
        match self.element_start {
            Some(start) => start..start + self.accumulated.len() as u64,
            None => 0..0,
        }
    }

    /// Scan forward from the host's cursor until one element balances.
    ///
    /// Calling again after [`ScanOutcome::Complete`] starts the next row.
    pub fn scan<C: StreamCursor + ?Sized>(
        &mut self,
        cursor: &mut C,
        options: &ImportOptions,
    ) -> Result<ScanOutcome> {
        if self.state == ScanState::Balanced {
            self.next_row();
        }

        let mut pos = cursor.cursor();
        let result = {
            let input = Input {
                bytes: cursor.buffer(),
                base: cursor.stream_offset(),
                eof: cursor.end_of_stream(),
            };
            self.run(&input, &mut pos, options)
        };
        cursor.set_cursor(pos);

        if let Err(err) = &result {
            warn!("row {}: {}", self.row_index, err);
            cursor.report_bad_row(self.row_index, &self.accumulated);
        }
        result
    }

    /// Clear per-row buffers and counters, keeping allocated capacity.
    fn next_row(&mut self) {
        self.state = ScanState::AwaitProlog;
        self.accumulated.clear();
        self.element_start = None;
        self.depth = 0;
        self.prolog_question = false;
        self.row_index += 1;
    }

    fn run(&mut self, input: &Input<'_>, pos: &mut usize, options: &ImportOptions) -> Result<ScanOutcome> {
        let bytes = input.bytes;
        loop {
            match self.state {
                ScanState::AwaitProlog => {
                    *pos = skip_whitespace(bytes, *pos);
                    let Some(&b) = bytes.get(*pos) else {
                        return self.exhausted(input, *pos);
                    };
                    if b != b'<' {
                        return Err(self.prolog_error(input, *pos, ScanErrorCode::PrologStart));
                    }
                    match bytes.get(*pos + 1) {
                        None => return self.exhausted(input, *pos),
                        Some(b'?') => {
                            *pos += 2;
                            self.prolog_question = false;
                            self.state = ScanState::InProlog;
                        }
                        Some(_) => self.state = ScanState::AwaitRoot,
                    }
                }

                ScanState::InProlog => {
                    let rest = &bytes[*pos..];
                    match find_prolog_end(rest, self.prolog_question) {
                        Some(end) => {
                            *pos += end;
                            self.state = ScanState::AwaitRoot;
                        }
                        None => {
                            if let Some(&last) = rest.last() {
                                self.prolog_question = last == b'?';
                            }
                            *pos = bytes.len();
                            return self.exhausted(input, *pos);
                        }
                    }
                }

                ScanState::AwaitRoot => {
                    *pos = skip_whitespace(bytes, *pos);
                    let Some(&b) = bytes.get(*pos) else {
                        return self.exhausted(input, *pos);
                    };
                    if b != b'<' {
                        return Err(self.element_error(input, *pos, ScanErrorCode::UnexpectedByte));
                    }
                    match bytes.get(*pos + 1) {
                        None => return self.exhausted(input, *pos),
                        Some(b'/') => {
                            return Err(self.element_error(input, *pos, ScanErrorCode::CloseBeforeOpen));
                        }
                        Some(b'?') | Some(b'!') => {
                            return Err(self.element_error(input, *pos, ScanErrorCode::MarkupBeforeRoot));
                        }
                        Some(_) => {
                            self.element_start = Some(input.offset(*pos));
                            self.accumulated.push(b'<');
                            *pos += 1;
                            self.state = ScanState::InOpenTag;
                        }
                    }
                }

                ScanState::Outside => {
                    let start = *pos;
                    let Some(i) = memchr(b'<', &bytes[start..]) else {
                        self.consume(bytes, pos, bytes.len());
                        return self.exhausted(input, *pos);
                    };
                    let lt = start + i;
                    let Some(&next) = bytes.get(lt + 1) else {
                        // Need the byte after '<' to pick a state
                        self.consume(bytes, pos, lt);
                        return self.exhausted(input, *pos);
                    };
                    let (state, len) = match next {
                        b'/' => (ScanState::InCloseTag, 2),
                        b'!' | b'?' => (ScanState::InMarkup, 2),
                        _ => (ScanState::InOpenTag, 1),
                    };
                    self.consume(bytes, pos, lt + len);
                    self.state = state;
                }

                ScanState::InOpenTag | ScanState::InCloseTag => {
                    let start = *pos;
                    let Some(i) = memchr2(b'<', b'>', &bytes[start..]) else {
                        self.consume(bytes, pos, bytes.len());
                        return self.exhausted(input, *pos);
                    };
                    let at = start + i;
                    self.consume(bytes, pos, at);
                    if bytes[at] == b'<' {
                        return Err(self.element_error(input, at, ScanErrorCode::NestedTagOpen));
                    }
                    let self_closing =
                        self.state == ScanState::InOpenTag && self.accumulated.last() == Some(&b'/');
                    if self_closing && options.self_closing == SelfClosingPolicy::Reject {
                        return Err(self.element_error(input, at, ScanErrorCode::SelfClosingTag));
                    }
                    self.consume(bytes, pos, at + 1);
                    self.close_tag(self_closing);
                    if self.state == ScanState::Balanced {
                        trace!(
                            "row {}: element complete at {:?}",
                            self.row_index,
                            self.element_range()
                        );
                        return Ok(ScanOutcome::Complete);
                    }
                }

                ScanState::InMarkup => {
                    let start = *pos;
                    let Some(i) = memchr(b'>', &bytes[start..]) else {
                        self.consume(bytes, pos, bytes.len());
                        return self.exhausted(input, *pos);
                    };
                    self.consume(bytes, pos, start + i + 1);
                    self.state = ScanState::Outside;
                }

                ScanState::Balanced => return Ok(ScanOutcome::Complete),
            }
        }
    }

    /// Apply the `>` that ends the current tag.
    fn close_tag(&mut self, self_closing: bool) {
        match self.state {
            ScanState::InOpenTag if self_closing => {}
            ScanState::InOpenTag => self.depth += 1,
            ScanState::InCloseTag => {
                debug_assert!(self.depth > 0, "close tag outside the root element");
                self.depth = self.depth.saturating_sub(1);
            }
            _ => unreachable!("close_tag called in {:?}", self.state),
        }
        self.state = if self.depth == 0 {
            ScanState::Balanced
        } else {
            ScanState::Outside
        };
    }

    /// Copy `bytes[*pos..end]` into the row and advance.
    #[inline]
    fn consume(&mut self, bytes: &[u8], pos: &mut usize, end: usize) {
        self.accumulated.extend_from_slice(&bytes[*pos..end]);
        *pos = end;
    }

    /// The buffer ran out at `pos`.
    fn exhausted(&self, input: &Input<'_>, pos: usize) -> Result<ScanOutcome> {
        if !input.eof {
            trace!(
                "row {}: need more input in {:?} (depth {}, {} bytes held)",
                self.row_index,
                self.state,
                self.depth,
                self.accumulated.len()
            );
            return Ok(ScanOutcome::NeedMoreInput);
        }

        let pending = pos < input.bytes.len();
        match self.state {
            ScanState::AwaitProlog | ScanState::AwaitRoot if !pending => Ok(ScanOutcome::EndOfStream),
            ScanState::AwaitProlog | ScanState::AwaitRoot => {
                Err(self.element_error(input, pos, ScanErrorCode::TruncatedTag))
            }
            ScanState::InProlog => Err(self.prolog_error(input, pos, ScanErrorCode::UnterminatedProlog)),
            ScanState::InOpenTag if self.depth == 0 => {
                Err(self.element_error(input, pos, ScanErrorCode::TruncatedTag))
            }
            _ => Err(FormatError::UnbalancedElement {
                row: self.row_index,
                depth: self.depth,
                range: self.element_range(),
                data: self.accumulated.clone(),
            }),
        }
    }

    fn prolog_error(&self, input: &Input<'_>, pos: usize, code: ScanErrorCode) -> FormatError {
        FormatError::MalformedProlog {
            row: self.row_index,
            offset: input.offset(pos),
            code,
        }
    }

    fn element_error(&self, input: &Input<'_>, pos: usize, code: ScanErrorCode) -> FormatError {
        FormatError::MalformedElement {
            row: self.row_index,
            offset: input.offset(pos),
            code,
        }
    }
}

impl Default for ParseState {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

fn skip_whitespace(bytes: &[u8], pos: usize) -> usize {
    bytes[pos..]
        .iter()
        .position(|&b| !is_whitespace(b))
        .map_or(bytes.len(), |i| pos + i)
}

/// Index just past the `?>` closing a prolog, if `rest` contains it.
///
/// `question` says whether the byte consumed just before `rest` was `?`.
fn find_prolog_end(rest: &[u8], question: bool) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = memchr(b'>', &rest[from..]) {
        let gt = from + i;
        let prev_is_question = if gt == 0 { question } else { rest[gt - 1] == b'?' };
        if prev_is_question {
            return Some(gt + 1);
        }
        from = gt + 1;
    }
    None
}
