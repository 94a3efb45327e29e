//! SIMD-accelerated XML scanning using memchr
//!
//! Uses memchr crate for fast byte searching with SIMD acceleration:
//! - SSE2 (default x86_64)
//! - AVX2 (runtime detection)
//! - NEON (aarch64)

use memchr::{memchr, memmem};

/// Scanner for XML delimiter detection
///
/// The scanner only ever borrows the input; every position it reports is a
/// byte offset into that same slice.
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// Get the current position
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Set the current position
    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Total input length
    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    /// Check if we've reached the end
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at current byte without advancing
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Peek at byte at offset from current position
    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Advance by n bytes
    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    /// Skip whitespace characters (space, tab, newline, carriage return)
    #[inline]
    pub fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
            self.pos += 1;
        }
    }

    /// Find next '<' (tag start) using SIMD
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        memchr(b'<', &self.input[self.pos..]).map(|i| self.pos + i)
    }

    /// Find tag end while handling quotes properly
    /// Returns the position of '>' that is not inside quotes
    pub fn find_tag_end_quoted(&self) -> Option<usize> {
        let mut pos = self.pos;
        let mut in_single_quote = false;
        let mut in_double_quote = false;

        while pos < self.input.len() {
            match self.input[pos] {
                b'"' if !in_single_quote => in_double_quote = !in_double_quote,
                b'\'' if !in_double_quote => in_single_quote = !in_single_quote,
                b'>' if !in_single_quote && !in_double_quote => return Some(pos),
                _ => {}
            }
            pos += 1;
        }
        None
    }

    /// Find the next occurrence of a multi-byte terminator such as `-->`
    #[inline]
    pub fn find_sequence(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.input[self.pos..], needle).map(|i| self.pos + i)
    }

    /// Check if input starts with a byte sequence at current position
    #[inline]
    pub fn starts_with(&self, needle: &[u8]) -> bool {
        self.input[self.pos..].starts_with(needle)
    }

    /// Read an XML name, returning its (start, end) span
    pub fn read_name(&mut self) -> Option<(usize, usize)> {
        let start = self.pos;
        if !self.peek().is_some_and(is_name_start_char) {
            return None;
        }

        self.pos += 1;
        while self.pos < self.input.len() && is_name_char(self.input[self.pos]) {
            self.pos += 1;
        }

        Some((start, self.pos))
    }
}

/// XML whitespace: space, tab, newline, carriage return
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Check if byte is valid XML name start character
/// Allows ASCII letters, underscore, colon, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

/// Check if byte is valid XML name character
/// Allows ASCII alphanumeric, punctuation, and non-ASCII (UTF-8 Unicode)
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b'.' | b':') || b >= 0x80
}
