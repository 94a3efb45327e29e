//! The structured object tree: what XML decodes into and what encode consumes.
//!
//! Text and attribute values are byte strings. Numeric references decode
//! with the plain UTF-8 layout up to U+1FFFFF, surrogates included, so
//! decoded content is not always valid UTF-8.

/// An XML element: tag, ordered attributes and ordered content
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredNode {
    pub tag: String,
    /// Attributes in insertion order; duplicates are preserved
    pub attributes: Vec<(String, Vec<u8>)>,
    pub children: Vec<ContentItem>,
}

/// One entry of an element's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    /// Literal text, escaped on output
    Text(Vec<u8>),
    /// A numeric literal in canonical string form, written unescaped
    Number(String),
    /// A nested element
    Element(StructuredNode),
}

impl StructuredNode {
    pub fn new(tag: impl Into<String>) -> Self {
        StructuredNode {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_child(mut self, child: impl Into<ContentItem>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Value of the first attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    /// Serializes as `<tag/>` when true
    pub fn is_self_closing(&self) -> bool {
        self.children.is_empty()
    }
}

impl ContentItem {
    /// A number item from anything with a numeric `Display`
    pub fn number(value: impl std::fmt::Display) -> Self {
        ContentItem::Number(value.to_string())
    }

    /// Text item from raw bytes
    pub fn text(bytes: impl Into<Vec<u8>>) -> Self {
        ContentItem::Text(bytes.into())
    }
}

impl From<StructuredNode> for ContentItem {
    fn from(node: StructuredNode) -> Self {
        ContentItem::Element(node)
    }
}

impl From<String> for ContentItem {
    fn from(text: String) -> Self {
        ContentItem::Text(text.into_bytes())
    }
}

impl From<&str> for ContentItem {
    fn from(text: &str) -> Self {
        ContentItem::text(text)
    }
}

impl From<i64> for ContentItem {
    fn from(value: i64) -> Self {
        ContentItem::number(value)
    }
}

impl From<u64> for ContentItem {
    fn from(value: u64) -> Self {
        ContentItem::number(value)
    }
}

impl From<i32> for ContentItem {
    fn from(value: i32) -> Self {
        ContentItem::number(value)
    }
}

impl From<f64> for ContentItem {
    fn from(value: f64) -> Self {
        ContentItem::number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_helpers() {
        let node = StructuredNode::new("item")
            .with_attribute("id", "7")
            .with_attribute("id", "8")
            .with_child("text")
            .with_child(3i64)
            .with_child(StructuredNode::new("leaf"));

        assert_eq!(node.attribute("id"), Some(&b"7"[..]));
        assert_eq!(node.attribute("missing"), None);
        assert_eq!(node.children.len(), 3);
        assert_eq!(node.children[0], ContentItem::Text(b"text".to_vec()));
        assert_eq!(node.children[1], ContentItem::Number("3".into()));
        assert!(matches!(&node.children[2], ContentItem::Element(leaf) if leaf.is_self_closing()));
    }

    #[test]
    fn test_text_holds_raw_bytes() {
        let item = ContentItem::text([0xED, 0xA0, 0x80]);
        assert_eq!(item, ContentItem::Text(vec![0xED, 0xA0, 0x80]));
        assert_eq!(ContentItem::from(String::from("x")), ContentItem::text("x"));
    }

    #[test]
    fn test_float_numbers_use_shortest_form() {
        assert_eq!(ContentItem::from(1.5), ContentItem::Number("1.5".into()));
        assert_eq!(ContentItem::from(2.0), ContentItem::Number("2".into()));
        assert_eq!(ContentItem::from(-4i64), ContentItem::Number("-4".into()));
    }
}
