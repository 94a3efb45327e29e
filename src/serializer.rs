//! Tree Serializer: structured object tree to XML text.
//!
//! Appends to a caller-owned byte buffer. Every append goes through
//! `try_reserve`, which grows the buffer geometrically and turns
//! exhaustion into an error instead of an abort.

use crate::core::entities::escape_into;
use crate::error::{Error, Result, Stage};
use crate::model::{ContentItem, StructuredNode};
use crate::options::CodecOptions;

/// Writes content items as XML into an output buffer
pub struct Serializer<'o> {
    out: &'o mut Vec<u8>,
    options: CodecOptions,
}

impl<'o> Serializer<'o> {
    pub fn new(out: &'o mut Vec<u8>, options: &CodecOptions) -> Self {
        Serializer {
            out,
            options: *options,
        }
    }

    /// Write one top-level item
    pub fn write_item(&mut self, item: &ContentItem) -> Result<()> {
        self.write_content(item, 0)
    }

    /// Write one element and everything below it
    pub fn write_element(&mut self, node: &StructuredNode) -> Result<()> {
        self.write_node(node, 1)
    }

    fn write_content(&mut self, item: &ContentItem, depth: usize) -> Result<()> {
        match item {
            ContentItem::Text(text) => escape_into(text, self.out)
                .map_err(Error::allocation(Stage::EncodeElement)),
            ContentItem::Number(number) => {
                check_number(number)?;
                self.push(number.as_bytes())
            }
            ContentItem::Element(node) => self.write_node(node, depth + 1),
        }
    }

    fn write_node(&mut self, node: &StructuredNode, depth: usize) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(Error::OutOfResources {
                stage: Stage::EncodeElement,
                limit: self.options.max_depth,
            });
        }
        if node.tag.is_empty() {
            return Err(Error::InvalidTag("element tag must be a non-empty string".into()));
        }

        self.push(b"<")?;
        self.push(node.tag.as_bytes())?;

        for (name, value) in &node.attributes {
            if name.is_empty() {
                return Err(Error::InvalidAttributeTable(format!(
                    "empty attribute name in <{}>",
                    node.tag
                )));
            }
            self.push(b" ")?;
            self.push(name.as_bytes())?;
            self.push(b"=\"")?;
            escape_into(value, self.out).map_err(Error::allocation(Stage::EncodeElement))?;
            self.push(b"\"")?;
        }

        if node.is_self_closing() {
            return self.push(b"/>");
        }

        self.push(b">")?;
        for child in &node.children {
            self.write_content(child, depth)?;
        }
        self.push(b"</")?;
        self.push(node.tag.as_bytes())?;
        self.push(b">")
    }

    #[inline]
    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.out
            .try_reserve(bytes.len())
            .map_err(Error::allocation(Stage::EncodeElement))?;
        self.out.extend_from_slice(bytes);
        Ok(())
    }
}

/// Number items are written raw, so they must really be numbers
fn check_number(number: &str) -> Result<()> {
    match number.parse::<f64>() {
        Ok(_) => Ok(()),
        Err(_) => Err(Error::InvalidContentType(format!(
            "number content {:?} is not a numeric literal",
            number
        ))),
    }
}

/// Serialize `items` in order, appending to `out`
///
/// On failure `out` is truncated back to its length on entry, so no
/// partial output is left behind.
pub fn serialize(items: &[ContentItem], out: &mut Vec<u8>, options: &CodecOptions) -> Result<()> {
    let mark = out.len();
    let result = write_all(items, out, options);
    if result.is_err() {
        out.truncate(mark);
    }
    result
}

fn write_all(items: &[ContentItem], out: &mut Vec<u8>, options: &CodecOptions) -> Result<()> {
    let mut serializer = Serializer::new(out, options);
    for item in items {
        serializer.write_item(item)?;
    }
    Ok(())
}
