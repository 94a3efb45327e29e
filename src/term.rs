//! Elixir Term Conversion Utilities
//!
//! Decoded trees become maps of the form
//! `%{tag: binary, attr: [{name, value}], children: [item]}`, with `attr`
//! left out when the element has none. Encode input is read into [`Value`]s
//! so all shape checking happens in plain Rust.

use crate::error::{Error, Result, Stage};
use crate::model::{ContentItem, StructuredNode};
use crate::options::CodecOptions;
use crate::value::Value;
use rustler::types::map::MapIterator;
use rustler::types::tuple::get_tuple;
use rustler::{Binary, Encoder, Env, NewBinary, NifResult, Term};

// Pre-defined atoms for efficiency - created once at compile time
rustler::atoms! {
    ok,
    error,
    tag,
    attr,
    children,
}

/// Convert a structured node to an Elixir map
pub fn node_to_term<'a>(env: Env<'a>, node: &StructuredNode) -> NifResult<Term<'a>> {
    let mut pairs: Vec<(Term<'a>, Term<'a>)> = Vec::with_capacity(3);
    pairs.push((tag().encode(env), str_to_binary(env, &node.tag)));

    if !node.attributes.is_empty() {
        // Build in reverse so prepending keeps document order
        let mut attrs = Term::list_new_empty(env);
        for (name, value) in node.attributes.iter().rev() {
            let pair = (str_to_binary(env, name), bytes_to_binary(env, value));
            attrs = attrs.list_prepend(pair.encode(env));
        }
        pairs.push((attr().encode(env), attrs));
    }

    let mut list = Term::list_new_empty(env);
    for child in node.children.iter().rev() {
        list = list.list_prepend(item_to_term(env, child)?);
    }
    pairs.push((children().encode(env), list));

    Term::map_from_pairs(env, &pairs)
}

fn item_to_term<'a>(env: Env<'a>, item: &ContentItem) -> NifResult<Term<'a>> {
    match item {
        ContentItem::Text(text) => Ok(bytes_to_binary(env, text)),
        ContentItem::Number(number) => Ok(str_to_binary(env, number)),
        ContentItem::Element(node) => node_to_term(env, node),
    }
}

/// Convert bytes to a binary term; decoded text need not be valid UTF-8
#[inline]
pub fn bytes_to_binary<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// Convert a string to a binary term (more efficient than .encode())
#[inline]
pub fn str_to_binary<'a>(env: Env<'a>, s: &str) -> Term<'a> {
    bytes_to_binary(env, s.as_bytes())
}

/// Read an encode argument into a [`Value`]
///
/// Each element level is a map plus a children list, and attribute pairs
/// sit two terms below their map, so the term walk allows a little over
/// twice the element limit before giving up.
pub fn term_to_value(term: Term<'_>, options: &CodecOptions) -> Result<Value> {
    let limit = options.max_depth.saturating_mul(2).saturating_add(3);
    TermReader {
        limit,
        max_depth: options.max_depth,
    }
    .read(term, 0)
}

struct TermReader {
    limit: usize,
    max_depth: usize,
}

impl TermReader {
    fn read(&self, term: Term<'_>, depth: usize) -> Result<Value> {
        if depth > self.limit {
            return Err(Error::OutOfResources {
                stage: Stage::EncodeElement,
                limit: self.max_depth,
            });
        }

        if term.is_atom() {
            let name = term.atom_to_string().map_err(|_| unreadable("atom"))?;
            return Ok(match name.as_str() {
                "nil" => Value::Nil,
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::atom(name),
            });
        }

        if term.is_binary() {
            let binary: Binary = term.decode().map_err(|_| unreadable("binary"))?;
            return Ok(match std::str::from_utf8(binary.as_slice()) {
                Ok(s) => Value::str(s),
                Err(_) => Value::Bytes(binary.as_slice().to_vec()),
            });
        }

        if term.is_number() {
            return read_number(term);
        }

        if term.is_map() {
            let iter = MapIterator::new(term).ok_or_else(|| unreadable("map"))?;
            let mut entries = Vec::new();
            for (key, value) in iter {
                entries.push((self.read(key, depth + 1)?, self.read(value, depth + 1)?));
            }
            return Ok(Value::Map(entries));
        }

        if term.is_list() {
            let items: Vec<Term> = term.decode().map_err(|_| unreadable("improper list"))?;
            return self.read_all(items, depth).map(Value::List);
        }

        if term.is_tuple() {
            let items = get_tuple(term).map_err(|_| unreadable("tuple"))?;
            return self.read_all(items, depth).map(Value::Tuple);
        }

        Ok(Value::Opaque(opaque_name(term)))
    }

    fn read_all(&self, items: Vec<Term<'_>>, depth: usize) -> Result<Vec<Value>> {
        items
            .into_iter()
            .map(|item| self.read(item, depth + 1))
            .collect()
    }
}

/// Integers keep their decimal form; floats use the shortest round-trip form
fn read_number(term: Term<'_>) -> Result<Value> {
    if let Ok(i) = term.decode::<i64>() {
        return Ok(Value::number(i));
    }
    if let Ok(u) = term.decode::<u64>() {
        return Ok(Value::number(u));
    }
    if let Ok(f) = term.decode::<f64>() {
        return Ok(Value::number(f));
    }
    Err(Error::InvalidContentType("integer out of range".into()))
}

fn opaque_name(term: Term<'_>) -> &'static str {
    if term.is_pid() {
        "pid"
    } else if term.is_ref() {
        "reference"
    } else if term.is_fun() {
        "function"
    } else if term.is_port() {
        "port"
    } else {
        "term"
    }
}

fn unreadable(what: &str) -> Error {
    Error::InvalidContentType(format!("unreadable {} term", what))
}
