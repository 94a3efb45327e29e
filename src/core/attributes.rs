//! XML Attribute Parsing
//!
//! Splits the attribute section of a tag into raw name/value spans.
//! Values are left exactly as written; entity references are resolved later
//! by the tree builder.

use super::scanner::{is_name_char, is_name_start_char, is_whitespace};
use super::tokenizer::{ParseError, Span};

/// A raw attribute: spans into the document input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    /// Attribute name span
    pub name: Span,
    /// Attribute value span, without the surrounding quotes
    pub value: Span,
}

/// Parse the attributes in `section` of `input`
///
/// `section` is the span between the element name and the closing `>` or
/// `/>`. Attributes are returned in document order; duplicate names are
/// kept as they appear.
pub fn parse_attributes(input: &[u8], section: Span) -> Result<Vec<RawAttribute>, ParseError> {
    let (start, end) = section;
    let mut attrs = Vec::new();
    let mut pos = start;

    loop {
        let ws_start = pos;
        while pos < end && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= end {
            return Ok(attrs);
        }
        // Attributes must be separated from the name and from each other
        if pos == ws_start {
            return Err(ParseError::new("expected whitespace before attribute", pos));
        }

        // Name
        let name_start = pos;
        if !is_name_start_char(input[pos]) {
            return Err(ParseError::new("expected attribute name", pos));
        }
        pos += 1;
        while pos < end && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = (name_start, pos);

        // Eq = S? '=' S?
        while pos < end && is_whitespace(input[pos]) {
            pos += 1;
        }
        if pos >= end || input[pos] != b'=' {
            return Err(ParseError::new("expected =", pos));
        }
        pos += 1;
        while pos < end && is_whitespace(input[pos]) {
            pos += 1;
        }

        // Quoted value
        let quote = match input.get(pos) {
            Some(&q @ (b'"' | b'\'')) if pos < end => q,
            _ => return Err(ParseError::new("expected ' or \"", pos)),
        };
        pos += 1;
        let value_start = pos;
        while pos < end && input[pos] != quote {
            if input[pos] == b'<' {
                return Err(ParseError::new("'<' not allowed in attribute value", pos));
            }
            pos += 1;
        }
        if pos >= end {
            return Err(ParseError::new("unterminated attribute value", value_start - 1));
        }
        attrs.push(RawAttribute {
            name,
            value: (value_start, pos),
        });
        pos += 1;
    }
}
