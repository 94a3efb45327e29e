//! XML Node representation
//!
//! Uses NodeId (u32) for compact, cache-friendly node references.

use crate::core::Span;
use std::fmt;

/// Compact node identifier (index into arena)
pub type NodeId = u32;

/// Type of XML node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root
    Document,
    /// Element node
    Element,
    /// Text content
    Text,
    /// CDATA section
    CData,
    /// Comment
    Comment,
    /// Processing instruction
    ProcessingInstruction,
    /// DOCTYPE declaration
    DocType,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::CData => "cdata",
            NodeKind::Comment => "comment",
            NodeKind::ProcessingInstruction => "processing instruction",
            NodeKind::DocType => "doctype",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An XML node in the arena
#[derive(Debug, Clone)]
pub struct XmlNode {
    /// Type of this node
    pub kind: NodeKind,
    /// Parent node (None for document root)
    pub parent: Option<NodeId>,
    /// First child node
    pub first_child: Option<NodeId>,
    /// Last child node
    pub last_child: Option<NodeId>,
    /// Next sibling
    pub next_sibling: Option<NodeId>,
    /// Element name or PI target
    pub name: Span,
    /// Raw text, CDATA, comment, PI or DOCTYPE body
    pub value: Span,
    /// Start of attributes in attribute arena (for elements)
    pub attr_start: u32,
    /// Number of attributes
    pub attr_count: u32,
}

impl XmlNode {
    /// Create a node of the given kind with no links
    pub fn new(kind: NodeKind, parent: Option<NodeId>) -> Self {
        XmlNode {
            kind,
            parent,
            first_child: None,
            last_child: None,
            next_sibling: None,
            name: (0, 0),
            value: (0, 0),
            attr_start: 0,
            attr_count: 0,
        }
    }

    /// Create a new document root node
    pub fn document() -> Self {
        XmlNode::new(NodeKind::Document, None)
    }

    /// Create a new element node
    pub fn element(name: Span, parent: NodeId) -> Self {
        XmlNode {
            name,
            ..XmlNode::new(NodeKind::Element, Some(parent))
        }
    }

    /// Create a leaf node (text, CDATA, comment, PI, DOCTYPE) holding a raw value
    pub fn leaf(kind: NodeKind, value: Span, parent: NodeId) -> Self {
        XmlNode {
            value,
            ..XmlNode::new(kind, Some(parent))
        }
    }
}

/// Stored attribute: raw spans into the document input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: Span,
    pub value: Span,
}
