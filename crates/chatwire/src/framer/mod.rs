//! CRLF line framing over an unbounded byte stream.
//!
//! The protocol delimits every line with `\r\n`. Bytes arrive in arbitrary
//! chunks, so the framer keeps whatever trails the last terminator and joins
//! it with the next chunk:
//!
//! ```text
//! chunk 1: "PING :tmi\r\nhel"   -> yields "PING :tmi", keeps "hel"
//! chunk 2: "lo\r\n"             -> yields "hello", keeps ""
//! ```
//!
//! No line length limit is imposed. A peer that never sends a terminator
//! grows the buffer without bound; this is an accepted resource risk for a
//! client talking to a single trusted server.

/// Two-byte line terminator.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Accumulates received bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Offset below which the buffer is known to hold no terminator.
    scanned: usize,
}

impl LineFramer {
    /// Creates a framer with an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns the complete lines now available.
    ///
    /// Lines are produced lazily and removed from the buffer as they are
    /// yielded. Lines left unconsumed when the iterator is dropped stay
    /// buffered and come out of the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Lines<'_> {
        self.buffer.extend_from_slice(chunk);
        Lines {
            framer: self,
            consumed: 0,
        }
    }

    /// Number of buffered bytes not yet returned as a line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn find_terminator(&self, from: usize) -> Option<usize> {
        let start = from.max(self.scanned);
        self.buffer
            .get(start..)?
            .windows(LINE_TERMINATOR.len())
            .position(|window| window == LINE_TERMINATOR)
            .map(|offset| start + offset)
    }
}

/// Lazy iterator over the complete lines of a [`LineFramer`].
#[derive(Debug)]
pub struct Lines<'a> {
    framer: &'a mut LineFramer,
    consumed: usize,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(end) = self.framer.find_terminator(self.consumed) else {
            // A terminator may still straddle the final byte.
            self.framer.scanned = self
                .framer
                .buffer
                .len()
                .saturating_sub(LINE_TERMINATOR.len() - 1)
                .max(self.consumed);
            return None;
        };
        let bytes = self.framer.buffer.get(self.consumed..end)?;
        let line = String::from_utf8_lossy(bytes).into_owned();
        self.consumed = end + LINE_TERMINATOR.len();
        self.framer.scanned = self.consumed;
        Some(line)
    }
}

impl Drop for Lines<'_> {
    fn drop(&mut self) {
        self.framer.buffer.drain(..self.consumed);
        self.framer.scanned = self.framer.scanned.saturating_sub(self.consumed);
    }
}
