//! Decode and encode entry points.
//!
//! Each call owns all of its intermediate state: the parsed document is
//! dropped on every return path and output goes to a call-local or
//! caller-owned buffer.

use crate::builder::build_document;
use crate::dom::Document;
use crate::error::Result;
use crate::model::{ContentItem, StructuredNode};
use crate::options::CodecOptions;
use crate::serializer::serialize;
use crate::value::{ContentConverter, Value};

/// Decode XML text into the structured tree of its root element
pub fn decode(input: &str) -> Result<StructuredNode> {
    decode_with(input, &CodecOptions::default())
}

pub fn decode_with(input: &str, options: &CodecOptions) -> Result<StructuredNode> {
    let doc = Document::parse(input)?;
    build_document(&doc, options)
}

/// Encode items as XML text
///
/// Output is bytes: text items are written as given, so content decoded
/// from surrogate or beyond-Unicode references comes back unchanged.
pub fn encode(items: &[ContentItem]) -> Result<Vec<u8>> {
    encode_with(items, &CodecOptions::default())
}

pub fn encode_with(items: &[ContentItem], options: &CodecOptions) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    serialize(items, &mut out, options)?;
    Ok(out)
}

/// Encode into a reusable buffer
///
/// Output is appended; on failure `out` is left as it was.
pub fn encode_into(items: &[ContentItem], out: &mut Vec<u8>, options: &CodecOptions) -> Result<()> {
    serialize(items, out, options)
}

/// Validate and encode loosely typed host values
pub fn encode_values(values: &[Value], options: &CodecOptions) -> Result<Vec<u8>> {
    let items = ContentConverter::new(options).convert_all(values)?;
    encode_with(&items, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_decode_document() {
        let input = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                     <order id=\"42\"><item qty=\"2\">Widget &amp; Co</item><note/></order>\n";
        let node = decode(input).unwrap();
        assert_eq!(node.tag, "order");
        assert_eq!(node.attribute("id"), Some(&b"42"[..]));
        let item = StructuredNode::new("item")
            .with_attribute("qty", "2")
            .with_child("Widget & Co");
        assert_eq!(node.children[0], ContentItem::Element(item));
        assert_eq!(node.children[1], ContentItem::Element(StructuredNode::new("note")));
    }

    #[test]
    fn test_round_trip() {
        let tree = StructuredNode::new("root")
            .with_attribute("name", "a \"quoted\" <value>")
            .with_attribute("other", "it's & more")
            .with_child("text with <brackets> & 'quotes'")
            .with_child(StructuredNode::new("n").with_child(12i64))
            .with_child(StructuredNode::new("empty").with_attribute("x", "1"));

        let xml = encode(&[tree.clone().into()]).unwrap();
        let decoded = decode(std::str::from_utf8(&xml).unwrap()).unwrap();

        // Numbers come back as text
        let expected = StructuredNode {
            children: vec![
                ContentItem::from("text with <brackets> & 'quotes'"),
                StructuredNode::new("n").with_child("12").into(),
                StructuredNode::new("empty").with_attribute("x", "1").into(),
            ],
            ..tree
        };
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_decode_keeps_non_scalar_references() {
        let node = decode("<a>&#xD800;</a>").unwrap();
        assert_eq!(node.children, vec![ContentItem::text([0xED, 0xA0, 0x80])]);

        let node = decode("<a>&#x1FFFFF;</a>").unwrap();
        assert_eq!(node.children, vec![ContentItem::text([0xF7, 0xBF, 0xBF, 0xBF])]);

        let node = decode("<a k=\"&#x110000;\"/>").unwrap();
        assert_eq!(node.attribute("k"), Some(&[0xF4, 0x90, 0x80, 0x80][..]));

        // Written back byte for byte
        assert_eq!(
            encode(&[node.into()]).unwrap(),
            b"<a k=\"\xF4\x90\x80\x80\"/>"
        );
    }

    #[test]
    fn test_decode_rejects_top_level_misc_nodes() {
        let err = decode("<a/><!-- c -->").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedNodeType);

        let err = decode("<!-- c --><a/>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedNodeType);

        let err = decode("<a/><b>x</b>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert_eq!(err.to_string(), "invalid xml string: multiple root elements at byte 4");
    }

    #[test]
    fn test_decode_error_messages() {
        let err = decode("<a>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);
        assert!(err.to_string().starts_with("invalid xml string: "));

        let err = decode("<a>&foo;</a>").unwrap_err();
        assert_eq!(err.to_string(), "xml decode: invalid escape sequence &foo;");

        let err = decode("<a><!-- c --></a>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedNodeType);
    }

    #[test]
    fn test_encode_into_reuses_buffer() {
        let options = CodecOptions::default();
        let mut out = Vec::new();
        encode_into(&[StructuredNode::new("a").into()], &mut out, &options).unwrap();
        encode_into(&[StructuredNode::new("b").into()], &mut out, &options).unwrap();
        assert_eq!(out, b"<a/><b/>");

        let bad = [StructuredNode::new("").into()];
        assert!(encode_into(&bad, &mut out, &options).is_err());
        assert_eq!(out, b"<a/><b/>");
    }

    #[test]
    fn test_encode_values() {
        let values = [
            Value::Map(vec![
                (Value::atom("tag"), Value::str("oppn")),
                (
                    Value::atom("attr"),
                    Value::Map(vec![(Value::str("id"), Value::str("1"))]),
                ),
            ]),
            Value::str(" & "),
            Value::number(3),
        ];
        assert_eq!(
            encode_values(&values, &CodecOptions::default()).unwrap(),
            b"<oppn id=\"1\"/> &amp; 3"
        );
    }

    #[test]
    fn test_depth_options_apply_to_both_directions() {
        let options = CodecOptions::default().with_max_depth(1);
        assert_eq!(
            decode_with("<a><b/></a>", &options).unwrap_err().kind(),
            ErrorKind::OutOfResources
        );
        let nested = StructuredNode::new("a").with_child(StructuredNode::new("b"));
        assert_eq!(
            encode_with(&[nested.into()], &options).unwrap_err().kind(),
            ErrorKind::OutOfResources
        );
    }
}
