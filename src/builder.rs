//! Tree Builder: parsed node tree to structured object tree.
//!
//! Walks the arena depth-first, resolving entity references in text and
//! attribute values. The result owns all of its data and holds no
//! reference to the document.

use crate::core::entities::decode_bytes;
use crate::dom::{Document, NodeId, NodeKind};
use crate::error::{Error, Result, Stage};
use crate::model::{ContentItem, StructuredNode};
use crate::options::CodecOptions;

/// Builds [`StructuredNode`]s from a parsed [`Document`]
pub struct TreeBuilder<'d, 'a> {
    doc: &'d Document<'a>,
    options: CodecOptions,
}

impl<'d, 'a> TreeBuilder<'d, 'a> {
    pub fn new(doc: &'d Document<'a>, options: &CodecOptions) -> Self {
        TreeBuilder {
            doc,
            options: *options,
        }
    }

    /// Build the element `id` and everything below it
    pub fn build(&self, id: NodeId) -> Result<StructuredNode> {
        self.build_element(id, 1)
    }

    fn build_element(&self, id: NodeId, depth: usize) -> Result<StructuredNode> {
        if self.doc.kind(id) != Some(NodeKind::Element) {
            return Err(Error::NotAnElement);
        }
        if depth > self.options.max_depth {
            return Err(Error::OutOfResources {
                stage: Stage::DecodeElement,
                limit: self.options.max_depth,
            });
        }

        // Children first, then attributes
        let mut children = Vec::new();
        children
            .try_reserve(self.doc.child_count(id))
            .map_err(Error::allocation(Stage::XmlDecodeFail))?;

        for child in self.doc.children(id) {
            let item = match self.doc.kind(child) {
                Some(NodeKind::Element) => ContentItem::Element(self.build_element(child, depth + 1)?),
                Some(NodeKind::Text | NodeKind::CData) => {
                    ContentItem::Text(decode_bytes(self.doc.value(child).as_bytes())?.into_owned())
                }
                Some(other) => return Err(Error::UnsupportedNodeType(other)),
                None => return Err(Error::NotAnElement),
            };
            children.push(item);
        }

        let raw_attributes = self.doc.attributes(id);
        let mut attributes = Vec::new();
        attributes
            .try_reserve(raw_attributes.len())
            .map_err(Error::allocation(Stage::XmlDecodeFail))?;

        for attr in raw_attributes {
            let value = decode_bytes(self.doc.attribute_value(attr).as_bytes())?;
            attributes.push((self.doc.attribute_name(attr).to_owned(), value.into_owned()));
        }

        Ok(StructuredNode {
            tag: self.doc.name(id).to_owned(),
            attributes,
            children,
        })
    }
}

/// Build the document's root element
///
/// Every top-level node is checked: a comment, PI or DOCTYPE on either side
/// of the root is unsupported, and a document without an element has
/// nothing to build.
pub fn build_document(doc: &Document<'_>, options: &CodecOptions) -> Result<StructuredNode> {
    for id in doc.children(0) {
        match doc.kind(id) {
            Some(NodeKind::Element) => {}
            Some(other) => return Err(Error::UnsupportedNodeType(other)),
            None => return Err(Error::NotAnElement),
        }
    }
    let root = doc.root_element_id().ok_or(Error::NotAnElement)?;
    TreeBuilder::new(doc, options).build(root)
}
