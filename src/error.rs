//! Error types for decode and encode calls.
//!
//! Every error is terminal for the call that produced it. The `Display`
//! form is `"<stage>: <detail>"`, ready to hand back to the host.

use crate::core::ParseError;
use crate::dom::NodeKind;
use std::collections::TryReserveError;
use std::fmt;
use thiserror::Error;

/// Which step of a call failed; the prefix of every error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building the structured tree from parsed nodes
    DecodeElement,
    /// Resolving text and attribute content
    XmlDecode,
    /// Decode-side resource failures
    XmlDecodeFail,
    /// The parser rejected the markup
    InvalidXmlString,
    /// Serializing a structured tree
    EncodeElement,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::DecodeElement => "decode element",
            Stage::XmlDecode => "xml decode",
            Stage::XmlDecodeFail => "xml decode fail",
            Stage::InvalidXmlString => "invalid xml string",
            Stage::EncodeElement => "encode element",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The primary error type for all codec operations.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The node handed to the tree builder is not an element.
    #[error("decode element: not a xml element")]
    NotAnElement,

    /// A comment, processing instruction or DOCTYPE inside the decoded tree.
    #[error("xml decode: unsupported xml type ({0})")]
    UnsupportedNodeType(NodeKind),

    /// An `&` not followed by a recognized reference.
    #[error("xml decode: invalid escape sequence {0}")]
    InvalidEscapeSequence(String),

    /// A numeric reference outside the encodable range.
    #[error("xml decode: invalid unicode codepoint {0}")]
    InvalidCodepoint(String),

    /// Nesting deeper than the configured limit.
    #[error("{stage}: xml nesting exceeds {limit} levels")]
    OutOfResources { stage: Stage, limit: usize },

    /// Malformed markup reported by the parser.
    #[error("invalid xml string: {0}")]
    Parse(#[from] ParseError),

    /// Missing, empty or non-string element tag.
    #[error("encode element: {0}")]
    InvalidTag(String),

    /// Attribute table of the wrong shape, or a non-string name or value.
    #[error("encode element: {0}")]
    InvalidAttributeTable(String),

    /// A content item that is neither text, number nor element.
    #[error("encode element: {0}")]
    InvalidContentType(String),

    /// An output buffer could not grow.
    #[error("{stage}: out of memory")]
    AllocationFailure {
        stage: Stage,
        source: TryReserveError,
    },
}

/// Payload-free discriminant of [`Error`], for matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotAnElement,
    UnsupportedNodeType,
    InvalidEscapeSequence,
    InvalidCodepoint,
    OutOfResources,
    ParseError,
    InvalidTag,
    InvalidAttributeTable,
    InvalidContentType,
    AllocationFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotAnElement => ErrorKind::NotAnElement,
            Error::UnsupportedNodeType(_) => ErrorKind::UnsupportedNodeType,
            Error::InvalidEscapeSequence(_) => ErrorKind::InvalidEscapeSequence,
            Error::InvalidCodepoint(_) => ErrorKind::InvalidCodepoint,
            Error::OutOfResources { .. } => ErrorKind::OutOfResources,
            Error::Parse(_) => ErrorKind::ParseError,
            Error::InvalidTag(_) => ErrorKind::InvalidTag,
            Error::InvalidAttributeTable(_) => ErrorKind::InvalidAttributeTable,
            Error::InvalidContentType(_) => ErrorKind::InvalidContentType,
            Error::AllocationFailure { .. } => ErrorKind::AllocationFailure,
        }
    }

    /// The stage prefix of this error's message
    pub fn stage(&self) -> Stage {
        match self {
            Error::NotAnElement => Stage::DecodeElement,
            Error::UnsupportedNodeType(_)
            | Error::InvalidEscapeSequence(_)
            | Error::InvalidCodepoint(_) => Stage::XmlDecode,
            Error::Parse(_) => Stage::InvalidXmlString,
            Error::InvalidTag(_) | Error::InvalidAttributeTable(_) | Error::InvalidContentType(_) => {
                Stage::EncodeElement
            }
            Error::OutOfResources { stage, .. } | Error::AllocationFailure { stage, .. } => *stage,
        }
    }

    /// Map a failed `try_reserve` at `stage`
    pub(crate) fn allocation(stage: Stage) -> impl FnOnce(TryReserveError) -> Error {
        move |source| Error::AllocationFailure { stage, source }
    }
}

/// A convenience `Result` type alias using the crate's `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_stage_prefix() {
        let cases = [
            (Error::NotAnElement, "decode element: not a xml element"),
            (
                Error::UnsupportedNodeType(NodeKind::Comment),
                "xml decode: unsupported xml type (comment)",
            ),
            (
                Error::OutOfResources { stage: Stage::EncodeElement, limit: 8 },
                "encode element: xml nesting exceeds 8 levels",
            ),
            (
                Error::Parse(ParseError::new("expected >", 4)),
                "invalid xml string: expected > at byte 4",
            ),
            (
                Error::InvalidTag("missing tag".into()),
                "encode element: missing tag",
            ),
        ];
        for (err, message) in cases {
            assert_eq!(err.to_string(), message);
            assert!(message.starts_with(err.stage().as_str()));
        }
    }

    #[test]
    fn test_allocation_failure() {
        let source = Vec::<u8>::new().try_reserve(usize::MAX).unwrap_err();
        let err = Error::allocation(Stage::XmlDecodeFail)(source);
        assert_eq!(err.kind(), ErrorKind::AllocationFailure);
        assert_eq!(err.to_string(), "xml decode fail: out of memory");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_error_converts() {
        let err: Error = ParseError::new("unclosed element <a>", 3).into();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.stage(), Stage::InvalidXmlString);
    }
}
