//! Pattern buffer with efficient tail-search optimization.
//!
//! Only the last N bytes of the buffer are searched for prompt patterns,
//! rather than the entire output. For large outputs this is critical for
//! performance, and it keeps an old prompt buried in command output from
//! being mistaken for the current one.

use std::fmt;

use bytes::{Bytes, BytesMut};
use regex::bytes::{Match, Regex};
use vte::{Parser, Perform};

use super::patterns::find_at_tail;

/// Buffer for accumulating output and efficiently searching for patterns.
pub struct PatternBuffer {
    /// The accumulated output buffer, ANSI sequences already removed.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape-sequence parser. Kept across `extend` calls so a sequence
    /// split between two reads is still removed.
    parser: Parser,
}

impl PatternBuffer {
    /// Create a new pattern buffer with the specified search depth.
    ///
    /// # Arguments
    ///
    /// * `search_depth` - Number of bytes from the end to search for patterns.
    ///   Default recommendation is 1000 bytes.
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: Parser::new(),
        }
    }

    /// Extend the buffer with new data, stripping ANSI escape codes.
    pub fn extend(&mut self, data: &[u8]) {
        let mut sink = AnsiStripper {
            out: &mut self.buffer,
        };
        for byte in data {
            self.parser.advance(&mut sink, *byte);
        }
    }

    /// Search only the tail of the buffer for a prompt.
    ///
    /// The match must end the buffer (only whitespace may follow). Offsets
    /// are relative to the start of the search region.
    pub fn search_tail(&self, pattern: &Regex) -> Option<Match<'_>> {
        find_at_tail(pattern, self.tail())
    }

    /// Check if the tail ends in a pattern match.
    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// The region searched for prompts.
    pub fn tail(&self) -> &[u8] {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        &self.buffer[start..]
    }

    /// Take ownership of the buffer contents and reset.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    /// Get a reference to the buffer contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the search depth setting.
    pub fn search_depth(&self) -> usize {
        self.search_depth
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Keeps printable text and line control characters, drops everything else.
struct AnsiStripper<'a> {
    out: &'a mut BytesMut,
}

impl Perform for AnsiStripper<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}
