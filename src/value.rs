//! Loosely typed host values and their validated conversion to content.
//!
//! A host runtime hands the encoder whatever its users built: maps with
//! `tag`/`attr`/`children` keys, table-style maps with positional integer
//! keys, strings, numbers and anything else. [`ContentConverter`] checks
//! that shape and produces [`ContentItem`]s, reporting wrong-typed tags,
//! attribute tables and content with the matching error kind.

use crate::error::{Error, Result, Stage};
use crate::model::{ContentItem, StructuredNode};
use crate::options::CodecOptions;

/// A host value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Atom(String),
    /// Numeric literal in canonical string form
    Number(String),
    String(String),
    /// A binary that is not valid UTF-8; usable as text like a string
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Map entries in iteration order
    Map(Vec<(Value, Value)>),
    /// Anything else the host has (pids, references, functions)
    Opaque(&'static str),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn atom(s: impl Into<String>) -> Self {
        Value::Atom(s.into())
    }

    pub fn number(n: impl std::fmt::Display) -> Self {
        Value::Number(n.to_string())
    }

    /// Type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Atom(_) => "atom",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "binary",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Map(_) => "map",
            Value::Opaque(name) => *name,
        }
    }

    fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Strings and binaries both carry text bytes
    fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s.as_bytes()),
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Map keys may be atoms or strings
    fn key_name(&self) -> Option<&str> {
        match self {
            Value::Atom(s) | Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer map keys mark positional content
    fn position(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.parse().ok(),
            _ => None,
        }
    }

    /// How a map key reads in error messages
    fn describe_key(&self) -> String {
        match self {
            Value::Atom(s) | Value::String(s) | Value::Number(s) => s.clone(),
            other => other.type_name().to_owned(),
        }
    }
}

/// Converts host values into content items
pub struct ContentConverter {
    options: CodecOptions,
}

impl ContentConverter {
    pub fn new(options: &CodecOptions) -> Self {
        ContentConverter { options: *options }
    }

    /// Convert top-level items; at least one is required
    pub fn convert_all(&self, values: &[Value]) -> Result<Vec<ContentItem>> {
        if values.is_empty() {
            return Err(Error::InvalidContentType("nothing to encode".into()));
        }
        let mut items = Vec::new();
        items
            .try_reserve(values.len())
            .map_err(Error::allocation(Stage::EncodeElement))?;
        for value in values {
            items.push(self.convert(value)?);
        }
        Ok(items)
    }

    /// Convert one top-level item
    pub fn convert(&self, value: &Value) -> Result<ContentItem> {
        self.to_item(value, 0)
    }

    fn to_item(&self, value: &Value, depth: usize) -> Result<ContentItem> {
        match value {
            Value::String(s) => Ok(ContentItem::text(s.as_str())),
            Value::Bytes(b) => Ok(ContentItem::text(b.as_slice())),
            Value::Number(n) => Ok(ContentItem::Number(n.clone())),
            Value::Map(entries) => Ok(ContentItem::Element(self.to_node(entries, depth + 1)?)),
            other => Err(Error::InvalidContentType(format!(
                "unsupported content type {}",
                other.type_name()
            ))),
        }
    }

    fn to_node(&self, entries: &[(Value, Value)], depth: usize) -> Result<StructuredNode> {
        if depth > self.options.max_depth {
            return Err(Error::OutOfResources {
                stage: Stage::EncodeElement,
                limit: self.options.max_depth,
            });
        }

        let mut tag = None;
        let mut attr = None;
        let mut children = None;
        let mut positional: Vec<(i64, &Value)> = Vec::new();

        for (key, value) in entries {
            match key.key_name() {
                Some("tag") => tag = Some(value),
                Some("attr") => attr = Some(value),
                Some("children") => children = Some(value),
                _ => match key.position() {
                    Some(n) => positional.push((n, value)),
                    None => {
                        return Err(Error::InvalidContentType(format!(
                            "unexpected element key {}",
                            key.describe_key()
                        )))
                    }
                },
            }
        }

        let tag = match tag {
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Err(Error::InvalidTag(format!(
                    "tag must be a string, got {}",
                    other.type_name()
                )))
            }
            None => return Err(Error::InvalidTag("element has no tag".into())),
        };

        let attributes = match attr {
            None => Vec::new(),
            Some(value) => self.to_attributes(value)?,
        };

        let content: Vec<&Value> = match (children, positional.is_empty()) {
            (Some(_), false) => {
                return Err(Error::InvalidContentType(
                    "element has both children and positional content".into(),
                ))
            }
            (Some(Value::List(list)), true) => list.iter().collect(),
            (Some(Value::Nil), true) | (None, true) => Vec::new(),
            (Some(other), true) => {
                return Err(Error::InvalidContentType(format!(
                    "children must be a list, got {}",
                    other.type_name()
                )))
            }
            (None, false) => contiguous(positional)?,
        };

        let mut node = StructuredNode::new(tag);
        node.attributes = attributes;
        node.children
            .try_reserve(content.len())
            .map_err(Error::allocation(Stage::EncodeElement))?;
        for value in content {
            node.children.push(self.to_item(value, depth)?);
        }
        Ok(node)
    }

    /// `attr` may be nil, a map, or a list of `{name, value}` tuples
    fn to_attributes(&self, value: &Value) -> Result<Vec<(String, Vec<u8>)>> {
        let pairs: Vec<(&Value, &Value)> = match value {
            Value::Nil => return Ok(Vec::new()),
            Value::Map(entries) => entries.iter().map(|(k, v)| (k, v)).collect(),
            Value::List(items) => items
                .iter()
                .map(|item| match item {
                    Value::Tuple(pair) if pair.len() == 2 => Ok((&pair[0], &pair[1])),
                    other => Err(Error::InvalidAttributeTable(format!(
                        "attribute entries must be {{name, value}} pairs, got {}",
                        other.type_name()
                    ))),
                })
                .collect::<Result<_>>()?,
            other => {
                return Err(Error::InvalidAttributeTable(format!(
                    "attr must be a map or a list of pairs, got {}",
                    other.type_name()
                )))
            }
        };

        pairs
            .into_iter()
            .map(|(name, value)| match (name.as_str(), value.as_bytes()) {
                (Some(name), Some(value)) => Ok((name.to_owned(), value.to_vec())),
                _ => Err(Error::InvalidAttributeTable(format!(
                    "attribute names and values must be strings, got {} => {}",
                    name.type_name(),
                    value.type_name()
                ))),
            })
            .collect()
    }
}

/// Order positional content by key, requiring keys 1..=n with no gaps
fn contiguous(mut positional: Vec<(i64, &Value)>) -> Result<Vec<&Value>> {
    positional.sort_by_key(|(n, _)| *n);
    positional
        .into_iter()
        .zip(1i64..)
        .map(|((n, value), expected)| {
            if n == expected {
                Ok(value)
            } else {
                Err(Error::InvalidContentType(format!(
                    "positional content must be numbered 1..n without gaps, missing {}",
                    expected
                )))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn element(entries: Vec<(Value, Value)>) -> Value {
        Value::Map(entries)
    }

    fn convert(value: &Value) -> Result<ContentItem> {
        ContentConverter::new(&CodecOptions::default()).convert(value)
    }

    #[test]
    fn test_map_element_with_children_list() {
        let value = element(vec![
            (Value::atom("tag"), Value::str("oppn")),
            (
                Value::atom("attr"),
                Value::List(vec![Value::Tuple(vec![Value::str("id"), Value::str("1")])]),
            ),
            (
                Value::atom("children"),
                Value::List(vec![Value::str("x"), Value::number(2)]),
            ),
        ]);
        let expected = StructuredNode::new("oppn")
            .with_attribute("id", "1")
            .with_child("x")
            .with_child(2i64);
        assert_eq!(convert(&value).unwrap(), ContentItem::Element(expected));
    }

    #[test]
    fn test_table_style_positional_content() {
        let value = element(vec![
            (Value::number(2), Value::str("b")),
            (Value::str("tag"), Value::str("t")),
            (Value::number(1), Value::str("a")),
            (
                Value::str("attr"),
                Value::Map(vec![(Value::str("k"), Value::str("v"))]),
            ),
        ]);
        let expected = StructuredNode::new("t")
            .with_attribute("k", "v")
            .with_child("a")
            .with_child("b");
        assert_eq!(convert(&value).unwrap(), ContentItem::Element(expected));
    }

    #[test]
    fn test_positional_gap_is_rejected() {
        let value = element(vec![
            (Value::atom("tag"), Value::str("t")),
            (Value::number(1), Value::str("a")),
            (Value::number(2), Value::str("b")),
            (Value::number(4), Value::str("d")),
        ]);
        let err = convert(&value).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidContentType);
        assert!(err.to_string().ends_with("missing 3"));
    }

    #[test]
    fn test_unknown_or_fractional_keys_are_rejected() {
        let keys = [
            (Value::number(1.5), "unexpected element key 1.5"),
            (Value::str("1"), "unexpected element key 1"),
            (Value::atom("childs"), "unexpected element key childs"),
            (Value::Nil, "unexpected element key nil"),
        ];
        for (key, message) in keys {
            let value = element(vec![
                (Value::atom("tag"), Value::str("a")),
                (key, Value::str("x")),
            ]);
            let err = convert(&value).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidContentType);
            assert_eq!(err.to_string(), format!("encode element: {}", message));
        }
    }

    #[test]
    fn test_binary_text_is_kept_as_bytes() {
        let value = element(vec![
            (Value::atom("tag"), Value::str("t")),
            (
                Value::atom("attr"),
                Value::Map(vec![(Value::str("k"), Value::Bytes(vec![0xED, 0xA0, 0x80]))]),
            ),
            (Value::atom("children"), Value::List(vec![Value::Bytes(vec![0xFF])])),
        ]);
        let expected = StructuredNode::new("t")
            .with_attribute("k", vec![0xED, 0xA0, 0x80])
            .with_child(ContentItem::text([0xFF]));
        assert_eq!(convert(&value).unwrap(), ContentItem::Element(expected));
    }

    #[test]
    fn test_missing_or_wrong_tag() {
        let err = convert(&element(vec![])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTag);

        let err = convert(&element(vec![(Value::atom("tag"), Value::number(1))])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTag);
        assert_eq!(err.to_string(), "encode element: tag must be a string, got number");
    }

    #[test]
    fn test_non_string_attribute_value() {
        let value = element(vec![
            (Value::atom("tag"), Value::str("t")),
            (
                Value::atom("attr"),
                Value::Map(vec![(Value::str("n"), Value::number(1))]),
            ),
        ]);
        assert_eq!(convert(&value).unwrap_err().kind(), ErrorKind::InvalidAttributeTable);

        let value = element(vec![
            (Value::atom("tag"), Value::str("t")),
            (Value::atom("attr"), Value::str("id=1")),
        ]);
        assert_eq!(convert(&value).unwrap_err().kind(), ErrorKind::InvalidAttributeTable);
    }

    #[test]
    fn test_nil_attr_and_children() {
        let value = element(vec![
            (Value::atom("tag"), Value::str("t")),
            (Value::atom("attr"), Value::Nil),
            (Value::atom("children"), Value::Nil),
        ]);
        assert_eq!(
            convert(&value).unwrap(),
            ContentItem::Element(StructuredNode::new("t"))
        );
    }

    #[test]
    fn test_unsupported_content() {
        let unsupported = [
            Value::Bool(true),
            Value::atom("x"),
            Value::Opaque("pid"),
            Value::Tuple(vec![]),
        ];
        for value in unsupported {
            assert_eq!(convert(&value).unwrap_err().kind(), ErrorKind::InvalidContentType);
        }
        let converter = ContentConverter::new(&CodecOptions::default());
        assert_eq!(
            converter.convert_all(&[]).unwrap_err().kind(),
            ErrorKind::InvalidContentType
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut value = element(vec![(Value::atom("tag"), Value::str("leaf"))]);
        for _ in 0..3 {
            value = element(vec![
                (Value::atom("tag"), Value::str("n")),
                (Value::atom("children"), Value::List(vec![value])),
            ]);
        }
        let converter = ContentConverter::new(&CodecOptions::default().with_max_depth(3));
        assert_eq!(converter.convert(&value).unwrap_err().kind(), ErrorKind::OutOfResources);

        let converter = ContentConverter::new(&CodecOptions::default().with_max_depth(4));
        assert!(converter.convert(&value).is_ok());
    }
}
