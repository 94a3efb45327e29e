//! XmlCodec - XML to structured object tree codec, and back
//!
//! Pipelines:
//! Decode: XML text -> parser (core, dom) -> TreeBuilder -> StructuredNode
//! Encode: StructuredNode / host values -> Serializer -> XML bytes
//!
//! The codec itself is plain Rust; the NIF functions at the bottom expose it
//! to the BEAM as `XmlCodec.Native.decode/1` and `XmlCodec.Native.encode/1`.

use rustler::{Binary, Encoder, Env, NifResult, Term};

pub mod builder;
pub mod codec;
pub mod core;
pub mod dom;
pub mod error;
pub mod model;
pub mod options;
pub mod serializer;
pub mod term;
pub mod value;

pub use codec::{decode, decode_with, encode, encode_into, encode_values, encode_with};
pub use error::{Error, ErrorKind, Result, Stage};
pub use model::{ContentItem, StructuredNode};
pub use options::CodecOptions;
pub use value::Value;

use crate::core::ParseError;
use term::{bytes_to_binary, node_to_term, str_to_binary, term_to_value};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// NIFs
// ============================================================================

/// Decode an XML binary: `{:ok, element}` or `{:error, message}`
#[rustler::nif(name = "decode", schedule = "DirtyCpu")]
fn decode_nif<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let options = CodecOptions::default();
    let result = std::str::from_utf8(input.as_slice())
        .map_err(|e| Error::from(ParseError::new("input is not valid UTF-8", e.valid_up_to())))
        .and_then(|text| decode_with(text, &options));

    match result {
        Ok(node) => Ok((term::ok(), node_to_term(env, &node)?).encode(env)),
        Err(err) => Ok(error_tuple(env, &err)),
    }
}

/// Encode one item or a list of items: `{:ok, binary}` or `{:error, message}`
#[rustler::nif(name = "encode", schedule = "DirtyCpu")]
fn encode_nif<'a>(env: Env<'a>, input: Term<'a>) -> NifResult<Term<'a>> {
    let options = CodecOptions::default();
    let result = term_to_value(input, &options).and_then(|value| {
        let values = match value {
            Value::List(items) => items,
            single => vec![single],
        };
        encode_values(&values, &options)
    });

    match result {
        Ok(xml) => Ok((term::ok(), bytes_to_binary(env, &xml)).encode(env)),
        Err(err) => Ok(error_tuple(env, &err)),
    }
}

fn error_tuple<'a>(env: Env<'a>, err: &Error) -> Term<'a> {
    log::debug!("xmlcodec call rejected ({:?}): {}", err.kind(), err);
    (term::error(), str_to_binary(env, &err.to_string())).encode(env)
}

// ============================================================================
// NIF Initialization
// ============================================================================

rustler::init!("Elixir.XmlCodec.Native");
