//! XML Entity Codec
//!
//! Decoding handles:
//! - Built-in entities: &lt; &gt; &amp; &apos; &quot;
//! - Numeric character references: &#123; &#x7B;
//!
//! Any other `&` sequence is an error. Encoding replaces the five reserved
//! characters and passes every other byte through untouched.
//!
//! Both directions return Cow so untouched input is never copied.

use crate::error::{Error, Result, Stage};
use memchr::memchr;
use std::borrow::Cow;
use std::collections::TryReserveError;

/// Named references, matched exactly and case-sensitively
const NAMED: [(&[u8], u8); 5] = [
    (b"&lt;", b'<'),
    (b"&gt;", b'>'),
    (b"&amp;", b'&'),
    (b"&apos;", b'\''),
    (b"&quot;", b'"'),
];

/// Largest code point the 4-byte UTF-8 layout can carry
pub const MAX_CODEPOINT: u32 = 0x1F_FFFF;

/// How many bytes of the offending text go into error messages
const EXCERPT_LEN: usize = 16;

/// What a reference resolves to
enum Reference {
    Byte(u8),
    CodePoint(u32),
}

/// Decode text content or an attribute value
///
/// Returns Borrowed if no references are present. Code points are written
/// with the plain 1 to 4 byte UTF-8 layout up to [`MAX_CODEPOINT`], without
/// checking for surrogates, so the result is not always valid UTF-8.
pub fn decode_bytes(input: &[u8]) -> Result<Cow<'_, [u8]>> {
    if memchr(b'&', input).is_none() {
        return Ok(Cow::Borrowed(input));
    }

    let mut out = Vec::new();
    // A reference never expands: the shortest form (`&lt;`, `&#1;`) is
    // four bytes and the longest expansion is four bytes.
    out.try_reserve(input.len()).map_err(Error::allocation(Stage::XmlDecodeFail))?;

    let mut pos = 0;
    while let Some(offset) = memchr(b'&', &input[pos..]) {
        out.extend_from_slice(&input[pos..pos + offset]);
        pos += offset;

        let reference = &input[pos..];
        let (resolved, consumed) = parse_reference(reference)?;
        match resolved {
            Reference::Byte(b) => out.push(b),
            Reference::CodePoint(cp) => {
                if !push_codepoint(cp, &mut out) {
                    return Err(invalid_codepoint(reference));
                }
            }
        }
        pos += consumed;
    }
    out.extend_from_slice(&input[pos..]);

    Ok(Cow::Owned(out))
}

/// Resolve the reference at the start of `input` (which begins with '&')
fn parse_reference(input: &[u8]) -> Result<(Reference, usize)> {
    for (pattern, byte) in NAMED {
        if input.starts_with(pattern) {
            return Ok((Reference::Byte(byte), pattern.len()));
        }
    }

    if !input.starts_with(b"&#") {
        return Err(invalid_escape(input));
    }

    let (radix, digits_start) = if input.get(2) == Some(&b'x') {
        (16, 3)
    } else {
        (10, 2)
    };

    let digits_len = input[digits_start..]
        .iter()
        .take_while(|&&b| (b as char).is_digit(radix))
        .count();
    let semi = digits_start + digits_len;
    if digits_len == 0 || input.get(semi) != Some(&b';') {
        return Err(invalid_escape(input));
    }

    let cp = parse_codepoint(&input[digits_start..semi], radix)
        .ok_or_else(|| invalid_codepoint(input))?;
    Ok((Reference::CodePoint(cp), semi + 1))
}

/// Parse ASCII digits, failing on overflow or above [`MAX_CODEPOINT`]
fn parse_codepoint(digits: &[u8], radix: u32) -> Option<u32> {
    digits
        .iter()
        .try_fold(0u32, |acc, &b| {
            let digit = (b as char).to_digit(radix)?;
            acc.checked_mul(radix)?.checked_add(digit)
        })
        .filter(|&cp| cp <= MAX_CODEPOINT)
}

/// Append the UTF-8 encoding of `cp`; false if it needs more than 4 bytes
fn push_codepoint(cp: u32, out: &mut Vec<u8>) -> bool {
    match cp {
        0..=0x7F => out.push(cp as u8),
        0x80..=0x7FF => {
            out.push(0xC0 | (cp >> 6) as u8);
            out.push(0x80 | (cp & 0x3F) as u8);
        }
        0x800..=0xFFFF => {
            out.push(0xE0 | (cp >> 12) as u8);
            out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
            out.push(0x80 | (cp & 0x3F) as u8);
        }
        0x1_0000..=MAX_CODEPOINT => {
            out.push(0xF0 | (cp >> 18) as u8);
            out.push(0x80 | ((cp >> 12) & 0x3F) as u8);
            out.push(0x80 | ((cp >> 6) & 0x3F) as u8);
            out.push(0x80 | (cp & 0x3F) as u8);
        }
        _ => return false,
    }
    true
}

/// The reference text for error messages: up to the ';' or a short prefix
fn excerpt(input: &[u8]) -> String {
    let limit = input.len().min(EXCERPT_LEN);
    let end = memchr(b';', &input[..limit]).map_or(limit, |semi| semi + 1);
    String::from_utf8_lossy(&input[..end]).into_owned()
}

fn invalid_escape(input: &[u8]) -> Error {
    Error::InvalidEscapeSequence(excerpt(input))
}

fn invalid_codepoint(input: &[u8]) -> Error {
    Error::InvalidCodepoint(excerpt(input))
}

/// Replacement text for a reserved byte
#[inline]
fn escape_for(b: u8) -> Option<&'static [u8]> {
    match b {
        b'<' => Some(b"&lt;"),
        b'>' => Some(b"&gt;"),
        b'&' => Some(b"&amp;"),
        b'"' => Some(b"&quot;"),
        b'\'' => Some(b"&apos;"),
        _ => None,
    }
}

/// Length of `input` once escaped
pub fn escaped_len(input: &[u8]) -> usize {
    input
        .iter()
        .map(|&b| escape_for(b).map_or(1, <[u8]>::len))
        .sum()
}

/// Escape the five reserved characters
///
/// Never fails; returns Borrowed when nothing needs escaping. Every other
/// byte, including non-UTF-8 ones, passes through.
pub fn escape(input: &[u8]) -> Cow<'_, [u8]> {
    if !input.iter().any(|&b| escape_for(b).is_some()) {
        return Cow::Borrowed(input);
    }
    let mut out = Vec::with_capacity(escaped_len(input));
    for &b in input {
        match escape_for(b) {
            Some(entity) => out.extend_from_slice(entity),
            None => out.push(b),
        }
    }
    Cow::Owned(out)
}

/// Append the escaped form of `input` to `out`
///
/// The only failure is being unable to grow `out`.
pub fn escape_into(input: &[u8], out: &mut Vec<u8>) -> std::result::Result<(), TryReserveError> {
    out.try_reserve(escaped_len(input))?;

    let mut last = 0;
    for (i, &b) in input.iter().enumerate() {
        if let Some(entity) = escape_for(b) {
            out.extend_from_slice(&input[last..i]);
            out.extend_from_slice(entity);
            last = i + 1;
        }
    }
    out.extend_from_slice(&input[last..]);
    Ok(())
}
