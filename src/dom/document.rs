//! XML Document - Arena-based DOM representation
//!
//! Efficient DOM storage with:
//! - Arena allocation for nodes and attributes
//! - NodeId indices for traversal
//! - Zero-copy names and values via spans into the borrowed input
//!
//! The input is never modified. Values are stored raw: entity references
//! and whitespace are left exactly as written.

use super::node::{NodeId, NodeKind, XmlAttribute, XmlNode};
use crate::core::attributes::parse_attributes;
use crate::core::tokenizer::{is_blank, ParseError, Span, TokenKind, Tokenizer};

/// An XML document stored in arena format
#[derive(Debug)]
pub struct Document<'a> {
    /// Original input (for zero-copy text extraction)
    input: &'a str,
    /// Arena of nodes; index 0 is the document node
    nodes: Vec<XmlNode>,
    /// Arena of attributes
    attributes: Vec<XmlAttribute>,
}

impl<'a> Document<'a> {
    /// Parse an XML document, failing on malformed markup
    pub fn parse(input: &'a str) -> Result<Self, ParseError> {
        let mut doc = Document {
            input,
            nodes: Vec::with_capacity(64),
            attributes: Vec::new(),
        };

        // Create document root node
        doc.nodes.push(XmlNode::document());
        doc.build()?;

        Ok(doc)
    }

    /// Build the arena from the token stream
    fn build(&mut self) -> Result<(), ParseError> {
        let bytes = self.input.as_bytes();
        let mut tokenizer = Tokenizer::new(bytes);
        let mut stack: Vec<NodeId> = vec![0];
        let mut has_root = false;

        loop {
            let token = tokenizer.next_token()?;
            let parent = *stack.last().unwrap_or(&0);
            let at_top = stack.len() == 1;

            match token.kind {
                TokenKind::StartTag | TokenKind::EmptyTag => {
                    if at_top {
                        if has_root {
                            return Err(ParseError::new("multiple root elements", token.span.0));
                        }
                        has_root = true;
                    }
                    let name = token.name.unwrap_or_default();
                    let section = token.content.unwrap_or((name.1, name.1));
                    let id = self.push_element(name, section, parent)?;
                    if token.kind == TokenKind::StartTag {
                        stack.push(id);
                    }
                }

                TokenKind::EndTag => {
                    let name = self.slice(token.name.unwrap_or_default());
                    if at_top {
                        return Err(ParseError::new(
                            format!("unexpected closing tag </{}>", name),
                            token.span.0,
                        ));
                    }
                    let open = self.name(parent);
                    if open != name {
                        return Err(ParseError::new(
                            format!("mismatched closing tag: expected </{}>, found </{}>", open, name),
                            token.span.0,
                        ));
                    }
                    stack.pop();
                }

                TokenKind::Text => {
                    let span = token.content.unwrap_or(token.span);
                    if at_top {
                        // Whitespace between top-level constructs is dropped
                        if !is_blank(&bytes[span.0..span.1]) {
                            return Err(ParseError::new("text outside the root element", span.0));
                        }
                    } else {
                        self.push_node(XmlNode::leaf(NodeKind::Text, span, parent), token.span.0)?;
                    }
                }

                TokenKind::CData => {
                    if at_top {
                        return Err(ParseError::new("CDATA outside the root element", token.span.0));
                    }
                    let span = token.content.unwrap_or_default();
                    self.push_node(XmlNode::leaf(NodeKind::CData, span, parent), token.span.0)?;
                }

                TokenKind::Comment => {
                    let span = token.content.unwrap_or_default();
                    self.push_node(XmlNode::leaf(NodeKind::Comment, span, parent), token.span.0)?;
                }

                TokenKind::ProcessingInstruction => {
                    let mut node = XmlNode::leaf(
                        NodeKind::ProcessingInstruction,
                        token.content.unwrap_or_default(),
                        parent,
                    );
                    node.name = token.name.unwrap_or_default();
                    self.push_node(node, token.span.0)?;
                }

                TokenKind::DocType => {
                    if !at_top {
                        return Err(ParseError::new("DOCTYPE inside an element", token.span.0));
                    }
                    let span = token.content.unwrap_or_default();
                    self.push_node(XmlNode::leaf(NodeKind::DocType, span, parent), token.span.0)?;
                }

                TokenKind::XmlDeclaration => {
                    // Consumed, never a node; only leading whitespace may precede it
                    if !at_top || self.nodes.len() > 1 {
                        return Err(ParseError::new(
                            "XML declaration must start the document",
                            token.span.0,
                        ));
                    }
                }

                TokenKind::Eof => {
                    if !at_top {
                        return Err(ParseError::new(
                            format!("unclosed element <{}>", self.name(parent)),
                            token.span.0,
                        ));
                    }
                    return Ok(());
                }
            }
        }
    }

    /// Add an element and its attributes, returning its id
    fn push_element(&mut self, name: Span, section: Span, parent: NodeId) -> Result<NodeId, ParseError> {
        let raw = parse_attributes(self.input.as_bytes(), section)?;
        let attr_start = arena_index(self.attributes.len(), section.0)?;
        let attr_count = arena_index(raw.len(), section.0)?;

        self.attributes.extend(raw.into_iter().map(|attr| XmlAttribute {
            name: attr.name,
            value: attr.value,
        }));

        let mut node = XmlNode::element(name, parent);
        node.attr_start = attr_start;
        node.attr_count = attr_count;
        self.push_node(node, name.0)
    }

    /// Append a node to the arena and link it under its parent
    fn push_node(&mut self, node: XmlNode, position: usize) -> Result<NodeId, ParseError> {
        let parent = node.parent.unwrap_or(0);
        let id = arena_index(self.nodes.len(), position)?;
        self.nodes.push(node);
        self.link_child(parent, id);
        Ok(id)
    }

    fn link_child(&mut self, parent_id: NodeId, child_id: NodeId) {
        let last_child = self.nodes.get(parent_id as usize).and_then(|p| p.last_child);

        if let Some(last_id) = last_child {
            if let Some(last) = self.nodes.get_mut(last_id as usize) {
                last.next_sibling = Some(child_id);
            }
        } else if let Some(parent) = self.nodes.get_mut(parent_id as usize) {
            parent.first_child = Some(child_id);
        }
        if let Some(parent) = self.nodes.get_mut(parent_id as usize) {
            parent.last_child = Some(child_id);
        }
    }

    #[inline]
    fn slice(&self, span: Span) -> &'a str {
        self.input.get(span.0..span.1).unwrap_or("")
    }

    /// The top-level element
    pub fn root_element_id(&self) -> Option<NodeId> {
        self.children(0).find(|&id| self.kind(id) == Some(NodeKind::Element))
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&XmlNode> {
        self.nodes.get(id as usize)
    }

    /// Get a node's kind
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| n.kind)
    }

    /// Element name or PI target; empty for other nodes
    pub fn name(&self, id: NodeId) -> &'a str {
        self.node(id).map_or("", |n| self.slice(n.name))
    }

    /// Raw value of a text, CDATA, comment, PI or DOCTYPE node
    pub fn value(&self, id: NodeId) -> &'a str {
        self.node(id).map_or("", |n| self.slice(n.value))
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.first_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next_sibling)
    }

    /// Iterate over children of a node
    pub fn children(&self, id: NodeId) -> ChildIter<'_, 'a> {
        ChildIter {
            doc: self,
            next: self.first_child(id),
        }
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Get attributes for an element, in document order
    pub fn attributes(&self, id: NodeId) -> &[XmlAttribute] {
        self.node(id)
            .and_then(|node| {
                let start = node.attr_start as usize;
                let end = start + node.attr_count as usize;
                self.attributes.get(start..end)
            })
            .unwrap_or(&[])
    }

    pub fn attribute_name(&self, attr: &XmlAttribute) -> &'a str {
        self.slice(attr.name)
    }

    /// Raw attribute value, entity references not resolved
    pub fn attribute_value(&self, attr: &XmlAttribute) -> &'a str {
        self.slice(attr.value)
    }
}

/// Arena indices are u32; larger documents are rejected
fn arena_index(len: usize, position: usize) -> Result<u32, ParseError> {
    u32::try_from(len).map_err(|_| ParseError::new("document too large", position))
}

/// Iterator over child nodes
pub struct ChildIter<'d, 'a> {
    doc: &'d Document<'a>,
    next: Option<NodeId>,
}

impl Iterator for ChildIter<'_, '_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root(doc: &Document<'_>) -> NodeId {
        doc.root_element_id().unwrap()
    }

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse("<root>hello</root>").unwrap();
        let root = root(&doc);
        assert_eq!(doc.name(root), "root");
        assert_eq!(doc.children(0).collect::<Vec<_>>(), vec![root]);

        let text = doc.first_child(root).unwrap();
        assert_eq!(doc.kind(text), Some(NodeKind::Text));
        assert_eq!(doc.value(text), "hello");
    }

    #[test]
    fn test_parse_nested() {
        let doc = Document::parse("<a><b><c/></b></a>").unwrap();
        let a = root(&doc);
        let b = doc.first_child(a).unwrap();
        let c = doc.first_child(b).unwrap();
        assert_eq!((doc.name(a), doc.name(b), doc.name(c)), ("a", "b", "c"));
        assert_eq!(doc.node(c).unwrap().parent, Some(b));
        assert_eq!(doc.first_child(c), None);
    }

    #[test]
    fn test_siblings() {
        let doc = Document::parse("<r><a/>x<b/><![CDATA[y]]></r>").unwrap();
        let kinds: Vec<_> = doc
            .children(root(&doc))
            .map(|id| doc.kind(id).unwrap())
            .collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Element, NodeKind::Text, NodeKind::Element, NodeKind::CData]
        );
        assert_eq!(doc.child_count(root(&doc)), 4);
    }

    #[test]
    fn test_attributes_in_document_order() {
        let doc = Document::parse("<e z=\"1\" a='&lt;' m=\"3\"/>").unwrap();
        let e = root(&doc);
        let attrs: Vec<_> = doc
            .attributes(e)
            .iter()
            .map(|a| (doc.attribute_name(a), doc.attribute_value(a)))
            .collect();
        assert_eq!(attrs, vec![("z", "1"), ("a", "&lt;"), ("m", "3")]);
    }

    #[test]
    fn test_values_are_left_raw() {
        let input = String::from("<a>x &amp; y</a>");
        let doc = Document::parse(&input).unwrap();
        let text = doc.first_child(root(&doc)).unwrap();
        assert_eq!(doc.value(text), "x &amp; y");
        assert_eq!(input, "<a>x &amp; y</a>");
    }

    #[test]
    fn test_whitespace_text_kept_inside_elements() {
        let doc = Document::parse("  <a>\n  <b/>\n</a>\n").unwrap();
        let a = root(&doc);
        assert_eq!(doc.child_count(a), 3);
        assert_eq!(doc.value(doc.first_child(a).unwrap()), "\n  ");
        // Leading and trailing document whitespace is not a node
        assert_eq!(doc.child_count(0), 1);
    }

    #[test]
    fn test_declaration_is_not_a_node() {
        let doc = Document::parse("<?xml version=\"1.0\"?>\n<a/>").unwrap();
        assert_eq!(doc.child_count(0), 1);
        assert_eq!(doc.first_child(0), doc.root_element_id());
    }

    #[test]
    fn test_misc_nodes_are_kept() {
        let doc = Document::parse("<!DOCTYPE a><!-- c --><a><?pi x?></a>").unwrap();
        let first = doc.first_child(0).unwrap();
        assert_eq!(doc.kind(first), Some(NodeKind::DocType));
        let comment = doc.next_sibling(first).unwrap();
        assert_eq!(doc.kind(comment), Some(NodeKind::Comment));
        assert_eq!(doc.value(comment), " c ");

        let pi = doc.first_child(root(&doc)).unwrap();
        assert_eq!(doc.kind(pi), Some(NodeKind::ProcessingInstruction));
        assert_eq!(doc.name(pi), "pi");
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = Document::parse("<a><b></a></b>").unwrap_err();
        assert_eq!(err.message, "mismatched closing tag: expected </b>, found </a>");
        assert_eq!(err.position, 6);
    }

    #[test]
    fn test_structural_errors() {
        let cases = [
            ("</a>", "unexpected closing tag </a>"),
            ("<a><b>", "unclosed element <b>"),
            ("<a/>junk", "text outside the root element"),
            ("<![CDATA[x]]><a/>", "CDATA outside the root element"),
            ("<a><!DOCTYPE a></a>", "DOCTYPE inside an element"),
            ("<a/><?xml version=\"1.0\"?>", "XML declaration must start the document"),
            ("<a/><b>x</b>", "multiple root elements"),
            ("<a b=\"1\" b></a>", "expected ="),
        ];
        for (input, message) in cases {
            let err = Document::parse(input).unwrap_err();
            assert_eq!(err.message, message, "{input}");
        }
    }

    #[test]
    fn test_empty_document_has_no_nodes() {
        let doc = Document::parse("  \n").unwrap();
        assert_eq!(doc.first_child(0), None);
        assert_eq!(doc.root_element_id(), None);
    }

    #[test]
    fn test_misc_nodes_after_root_are_kept() {
        let doc = Document::parse("<a/><!-- c --><?pi x?>").unwrap();
        let kinds: Vec<_> = doc.children(0).map(|id| doc.kind(id).unwrap()).collect();
        assert_eq!(
            kinds,
            vec![NodeKind::Element, NodeKind::Comment, NodeKind::ProcessingInstruction]
        );
    }
}
