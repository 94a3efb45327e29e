//! XML Tokenizer - pull tokenizer over a borrowed byte slice
//!
//! Extracts XML tokens without copying or modifying the input:
//! - Element start/end/empty tags
//! - Text content (raw, entity references left in place)
//! - CDATA sections
//! - Comments
//! - Processing instructions and the XML declaration
//! - DOCTYPE declarations
//!
//! Every token carries byte spans into the input. Malformed markup is
//! reported as a [`ParseError`] and ends tokenization.

use super::scanner::{is_whitespace, Scanner};
use thiserror::Error;

/// Byte range `(start, end)` into the tokenizer input
pub type Span = (usize, usize);

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of input
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Raw span of the whole construct
    pub span: Span,
    /// Tag name or PI target
    pub name: Option<Span>,
    /// Text, CDATA, comment or PI body; for tags, the attribute section
    pub content: Option<Span>,
}

impl Token {
    fn new(kind: TokenKind, span: Span) -> Self {
        Token {
            kind,
            span,
            name: None,
            content: None,
        }
    }

    fn with_name(mut self, name: Span) -> Self {
        self.name = Some(name);
        self
    }

    fn with_content(mut self, content: Span) -> Self {
        self.content = Some(content);
        self
    }
}

/// Malformed markup, with the byte offset where it was detected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {position}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        ParseError {
            message: message.into(),
            position,
        }
    }
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    input: &'a [u8],
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input),
        }
    }

    /// Get the next token; returns an `Eof` token once the input is exhausted
    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        if self.scanner.is_eof() {
            let end = self.scanner.len();
            return Ok(Token::new(TokenKind::Eof, (end, end)));
        }

        if self.scanner.peek() == Some(b'<') {
            self.parse_markup()
        } else {
            Ok(self.parse_text())
        }
    }

    /// Dispatch on the byte following '<'
    fn parse_markup(&mut self) -> Result<Token, ParseError> {
        let start = self.scanner.position();
        match self.scanner.peek_at(1) {
            Some(b'/') => self.parse_end_tag(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'?') => self.parse_pi(start),
            _ => self.parse_start_tag(start),
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Result<Token, ParseError> {
        self.scanner.advance(1);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("expected element name", start + 1))?;

        let gt = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| ParseError::new("expected >", self.scanner.len()))?;

        let (kind, attrs_end) = if gt > name.1 && self.input.get(gt - 1) == Some(&b'/') {
            (TokenKind::EmptyTag, gt - 1)
        } else {
            (TokenKind::StartTag, gt)
        };

        self.scanner.set_position(gt + 1);
        Ok(Token::new(kind, (start, gt + 1))
            .with_name(name)
            .with_content((name.1, attrs_end)))
    }

    fn parse_end_tag(&mut self, start: usize) -> Result<Token, ParseError> {
        self.scanner.advance(2);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("expected element name", start + 2))?;

        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(ParseError::new("expected >", self.scanner.position()));
        }
        self.scanner.advance(1);

        Ok(Token::new(TokenKind::EndTag, (start, self.scanner.position())).with_name(name))
    }

    /// Comments, CDATA sections and DOCTYPE all start with "<!"
    fn parse_bang_markup(&mut self, start: usize) -> Result<Token, ParseError> {
        if self.scanner.starts_with(b"<!--") {
            self.parse_delimited(start, 4, b"-->", TokenKind::Comment, "unterminated comment")
        } else if self.scanner.starts_with(b"<![CDATA[") {
            self.parse_delimited(start, 9, b"]]>", TokenKind::CData, "unterminated CDATA section")
        } else if self.scanner.starts_with(b"<!DOCTYPE") {
            self.parse_doctype(start)
        } else {
            Err(ParseError::new("unrecognized markup after <!", start))
        }
    }

    /// Scan a construct with a fixed opening length and a fixed terminator
    fn parse_delimited(
        &mut self,
        start: usize,
        open_len: usize,
        terminator: &[u8],
        kind: TokenKind,
        unterminated: &'static str,
    ) -> Result<Token, ParseError> {
        self.scanner.advance(open_len);
        let body_start = self.scanner.position();
        let body_end = self
            .scanner
            .find_sequence(terminator)
            .ok_or_else(|| ParseError::new(unterminated, start))?;

        let end = body_end + terminator.len();
        self.scanner.set_position(end);
        Ok(Token::new(kind, (start, end)).with_content((body_start, body_end)))
    }

    /// DOCTYPE may carry an internal subset in brackets and quoted literals
    fn parse_doctype(&mut self, start: usize) -> Result<Token, ParseError> {
        self.scanner.advance(9);
        let body_start = self.scanner.position();
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(b) = self.scanner.peek() {
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => {
                    let body_end = self.scanner.position();
                    self.scanner.advance(1);
                    return Ok(Token::new(TokenKind::DocType, (start, body_end + 1))
                        .with_content((body_start, body_end)));
                }
                _ => {}
            }
            self.scanner.advance(1);
        }

        Err(ParseError::new("unterminated DOCTYPE declaration", start))
    }

    fn parse_pi(&mut self, start: usize) -> Result<Token, ParseError> {
        self.scanner.advance(2);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| ParseError::new("expected processing instruction target", start + 2))?;

        let body_end = self
            .scanner
            .find_sequence(b"?>")
            .ok_or_else(|| ParseError::new("unterminated processing instruction", start))?;

        let end = body_end + 2;
        self.scanner.set_position(end);

        let target = self.input.get(name.0..name.1).unwrap_or(&[]);
        let kind = if target.eq_ignore_ascii_case(b"xml") {
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };

        Ok(Token::new(kind, (start, end))
            .with_name(name)
            .with_content((name.1, body_end)))
    }

    /// Text runs up to the next '<' or the end of input
    fn parse_text(&mut self) -> Token {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.len());
        self.scanner.set_position(end);
        Token::new(TokenKind::Text, (start, end)).with_content((start, end))
    }
}

/// True when every byte of the span is XML whitespace
pub fn is_blank(input: &[u8]) -> bool {
    input.iter().all(|&b| is_whitespace(b))
}
