//! Host-side byte delivery.
//!
//! The core never reads input on its own. A host hands it a cursor over the
//! bytes it currently holds, and the core advances the cursor past whatever
//! it consumed. When the core answers [`Step::NeedMoreInput`](crate::Step),
//! the host may drop the consumed prefix, append more bytes, and call again.
//!
//! # Architecture
//!
//! ```text
//!  Host buffer                  Core
//!  ┌──────────────┬────────┐
//!  │  consumed    │ unread │ ──buffer()/cursor()──▶ scanner
//!  └──────────────┴────────┘ ◀──set_cursor(pos)──── (bytes copied into ParseState)
//!         ▲ compacted on push()
//! ```

/// Capabilities the core needs from the host.
///
/// `buffer()` is the whole slice the host currently holds; its length is the
/// number of valid bytes. Positions passed to `set_cursor` are indices into
/// that slice.
pub trait StreamCursor {
    /// Bytes currently held by the host.
    fn buffer(&self) -> &[u8];

    /// Index of the first unread byte in `buffer()`.
    fn cursor(&self) -> usize;

    /// Mark every byte before `pos` as consumed.
    fn set_cursor(&mut self, pos: usize);

    /// True once the host has delivered its final bytes.
    fn end_of_stream(&self) -> bool;

    /// Absolute stream offset of `buffer()[0]`, used for diagnostics.
    fn stream_offset(&self) -> u64 {
        0
    }

    /// Diagnostic sink invoked right before a fatal row error is returned.
    fn report_bad_row(&mut self, _row_index: u64, _data: &[u8]) {}
}

/// An owned host buffer.
///
/// Appending compacts away consumed bytes, the way a loading pipeline keeps
/// only the unread tail of its previous buffer.
#[derive(Debug, Default)]
pub struct StreamBuffer {
    data: Vec<u8>,
    cursor: usize,
    /// Offset of `data[0]` in the overall input stream
    stream_offset: u64,
    eof: bool,
    bad_rows: Vec<(u64, Vec<u8>)>,
}

impl StreamBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding the whole stream, already at end of stream.
    pub fn complete(data: &[u8]) -> Self {
        let mut buf = Self::new();
        buf.push(data);
        buf.finish();
        buf
    }

    /// Append bytes, discarding everything before the cursor first.
    pub fn push(&mut self, bytes: &[u8]) {
        if self.cursor > 0 {
            self.data.drain(..self.cursor);
            self.stream_offset += self.cursor as u64;
            self.cursor = 0;
        }
        self.data.extend_from_slice(bytes);
    }

    /// Signal that no more bytes will arrive.
    pub fn finish(&mut self) {
        self.eof = true;
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.cursor..]
    }

    /// Rows reported through [`StreamCursor::report_bad_row`].
    pub fn bad_rows(&self) -> &[(u64, Vec<u8>)] {
        &self.bad_rows
    }
}

impl StreamCursor for StreamBuffer {
    #[inline]
    fn buffer(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn cursor(&self) -> usize {
        self.cursor
    }

    #[inline]
    fn set_cursor(&mut self, pos: usize) {
        debug_assert!(pos <= self.data.len());
        self.cursor = pos.min(self.data.len());
    }

    fn end_of_stream(&self) -> bool {
        self.eof
    }

    fn stream_offset(&self) -> u64 {
        self.stream_offset
    }

    fn report_bad_row(&mut self, row_index: u64, data: &[u8]) {
        self.bad_rows.push((row_index, data.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_compacts_consumed_prefix() {
        let mut buf = StreamBuffer::new();
        buf.push(b"hello world");
        assert_eq!(buf.buffer(), b"hello world");

        buf.set_cursor(6);
        assert_eq!(buf.remaining(), b"world");

        buf.push(b"!");
        assert_eq!(buf.buffer(), b"world!");
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.stream_offset(), 6);
    }

    #[test]
    fn test_complete_sets_eof() {
        let buf = StreamBuffer::complete(b"<a/>");
        assert!(buf.end_of_stream());
        assert_eq!(buf.remaining(), b"<a/>");
    }

    #[test]
    fn test_bad_rows_recorded() {
        let mut buf = StreamBuffer::new();
        assert!(buf.bad_rows().is_empty());
        buf.report_bad_row(2, b"<row>");
        assert_eq!(buf.bad_rows(), &[(2, b"<row>".to_vec())]);
    }
}
