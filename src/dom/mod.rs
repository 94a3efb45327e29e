//! DOM Module - Arena-based XML Document
//!
//! The parsed node tree the codec decodes from:
//! - Arena allocation for nodes and attributes
//! - NodeId (u32) indices for cache-friendly traversal
//! - Raw spans into the borrowed input, never copied or modified

pub mod document;
pub mod node;

pub use document::{ChildIter, Document};
pub use node::{NodeId, NodeKind, XmlAttribute, XmlNode};
