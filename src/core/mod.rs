//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: pull tokenizer producing byte spans
//! - Attributes: attribute section splitting
//! - Entities: entity decoding and escaping with Cow (zero-copy when possible)

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;

pub use tokenizer::{ParseError, Span};
