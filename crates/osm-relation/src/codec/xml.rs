//! Minimal XML reading and writing for element documents.
//!
//! Reading produces a borrowed element tree: names and attribute values
//! borrow from the input unless an entity reference had to be decoded.
//! Text content, comments, processing instructions and doctype
//! declarations are skipped; element documents carry everything in
//! attributes.

use std::borrow::Cow;

use winnow::Parser;
use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{alt, delimited, preceded, repeat};
use winnow::error::{ContextError, ErrMode, StrContext};
use winnow::token::{take_till, take_until, take_while};

use crate::limits::MAX_DEPTH;

type PResult<O> = Result<O, ErrMode<ContextError>>;

// =============================================================================
// READING
// =============================================================================

/// One element of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement<'a> {
    pub name: &'a str,
    pub attributes: Vec<(&'a str, Cow<'a, str>)>,
    pub children: Vec<XmlElement<'a>>,
}

impl<'a> XmlElement<'a> {
    /// Returns the value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_ref())
    }

    /// Iterates over the direct children called `name`, in document order.
    pub fn children_named<'s>(
        &'s self,
        name: &'s str,
    ) -> impl Iterator<Item = &'s XmlElement<'a>> + 's {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Returns the first direct child called `name`.
    pub fn child(&self, name: &str) -> Option<&XmlElement<'a>> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Markup that could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkupError {
    /// Byte offset at which reading stopped.
    pub offset: usize,
}

/// Reads a document with exactly one root element, nested at most
/// [`MAX_DEPTH`] levels deep.
pub fn parse_document(input: &str) -> Result<XmlElement<'_>, MarkupError> {
    parse_document_with_max_depth(input, MAX_DEPTH)
}

/// Reads a document with exactly one root element, nested at most
/// `max_depth` levels deep. The root element is at depth 1.
pub fn parse_document_with_max_depth<'a>(
    input: &'a str,
    max_depth: usize,
) -> Result<XmlElement<'a>, MarkupError> {
    let mut remaining = input;
    let root = delimited(misc, |i: &mut &'a str| element(i, 1, max_depth), misc)
        .parse_next(&mut remaining)
        .map_err(|_| MarkupError {
            offset: input.len() - remaining.len(),
        })?;
    if !remaining.is_empty() {
        return Err(MarkupError {
            offset: input.len() - remaining.len(),
        });
    }
    Ok(root)
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
}

fn xml_name<'a>(input: &mut &'a str) -> PResult<&'a str> {
    (take_while(1, is_name_start), take_while(0.., is_name_char))
        .take()
        .context(StrContext::Label("name"))
        .parse_next(input)
}

fn quoted_value<'a>(input: &mut &'a str) -> PResult<Cow<'a, str>> {
    alt((
        delimited('"', take_till(0.., ['"', '<']), '"'),
        delimited('\'', take_till(0.., ['\'', '<']), '\''),
    ))
    .verify_map(unescape)
    .context(StrContext::Label("attribute value"))
    .parse_next(input)
}

fn attribute<'a>(input: &mut &'a str) -> PResult<(&'a str, Cow<'a, str>)> {
    (xml_name, ws0, '=', ws0, quoted_value)
        .map(|(name, _, _, _, value)| (name, value))
        .parse_next(input)
}

fn comment(input: &mut &str) -> PResult<()> {
    ("<!--", take_until(0.., "-->"), "-->").void().parse_next(input)
}

fn processing_instruction(input: &mut &str) -> PResult<()> {
    ("<?", take_until(0.., "?>"), "?>").void().parse_next(input)
}

fn doctype(input: &mut &str) -> PResult<()> {
    ("<!DOCTYPE", take_till(0.., '>'), '>').void().parse_next(input)
}

fn text(input: &mut &str) -> PResult<()> {
    take_till(1.., '<').void().parse_next(input)
}

fn ws0(input: &mut &str) -> PResult<()> {
    multispace0.void().parse_next(input)
}

fn ws1(input: &mut &str) -> PResult<()> {
    multispace1.void().parse_next(input)
}

/// Whitespace and markup that carries no elements.
fn misc(input: &mut &str) -> PResult<()> {
    repeat(0.., alt((ws1, comment, processing_instruction, doctype))).parse_next(input)
}

/// End of a start tag; `true` when the element is self-closing.
fn tag_end(input: &mut &str) -> PResult<bool> {
    alt(("/>".value(true), '>'.value(false))).parse_next(input)
}

fn element<'a>(input: &mut &'a str, depth: usize, max_depth: usize) -> PResult<XmlElement<'a>> {
    let (_, name, attributes, _, self_closing): (char, &'a str, Vec<_>, (), bool) = (
        '<',
        xml_name,
        repeat(0.., preceded(ws1, attribute)),
        ws0,
        tag_end,
    )
        .parse_next(input)?;

    if depth > max_depth || has_duplicate_name(&attributes) {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    if self_closing {
        return Ok(XmlElement {
            name,
            attributes,
            children: Vec::new(),
        });
    }

    let children = content(input, depth, max_depth)?;
    let closing = delimited("</", xml_name, (ws0, '>'))
        .context(StrContext::Label("closing tag"))
        .parse_next(input)?;
    if closing != name {
        return Err(ErrMode::Cut(ContextError::new()));
    }

    Ok(XmlElement {
        name,
        attributes,
        children,
    })
}

/// Children of an element at `depth`.
fn content<'a>(
    input: &mut &'a str,
    depth: usize,
    max_depth: usize,
) -> PResult<Vec<XmlElement<'a>>> {
    let child = |i: &mut &'a str| element(i, depth + 1, max_depth);
    let nodes: Vec<Option<XmlElement<'a>>> = repeat(
        0..,
        alt((
            comment.map(|_| None),
            processing_instruction.map(|_| None),
            child.map(Some),
            text.map(|_| None),
        )),
    )
    .parse_next(input)?;
    Ok(nodes.into_iter().flatten().collect())
}

fn has_duplicate_name(attributes: &[(&str, Cow<'_, str>)]) -> bool {
    attributes
        .iter()
        .enumerate()
        .any(|(i, (name, _))| attributes[..i].iter().any(|(seen, _)| seen == name))
}

/// Characters allowed by the XML `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

/// Decodes the predefined entities and numeric character references.
///
/// Returns `None` for an unknown or unterminated reference.
fn unescape(raw: &str) -> Option<Cow<'_, str>> {
    if !raw.contains('&') {
        return Some(Cow::Borrowed(raw));
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find(';')?;
        let entity = &after[..end];
        let decoded = match entity {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let hex = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X"));
                let code = if let Some(hex) = hex {
                    u32::from_str_radix(hex, 16).ok()?
                } else if let Some(dec) = entity.strip_prefix('#') {
                    dec.parse().ok()?
                } else {
                    return None;
                };
                char::from_u32(code).filter(|c| is_xml_char(*c))?
            }
        };
        out.push(decoded);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Some(Cow::Owned(out))
}

// =============================================================================
// WRITING
// =============================================================================

/// Writer for element documents.
///
/// Elements are indented by two spaces per level.
#[derive(Debug, Clone)]
pub struct XmlWriter {
    buf: String,
    depth: usize,
}

impl XmlWriter {
    /// Creates a writer that starts with the XML declaration.
    pub fn new() -> Self {
        Self {
            buf: String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"),
            depth: 0,
        }
    }

    /// Returns the written document.
    pub fn into_string(self) -> String {
        self.buf
    }

    /// Writes `<name a="v" ...>` and descends one level.
    pub fn open(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.start_tag(name, attributes);
        self.buf.push_str(">\n");
        self.depth += 1;
    }

    /// Writes `<name a="v" .../>`.
    pub fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.start_tag(name, attributes);
        self.buf.push_str("/>\n");
    }

    /// Ascends one level and writes `</name>`.
    pub fn close(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push_str(">\n");
    }

    fn start_tag(&mut self, name: &str, attributes: &[(&str, &str)]) {
        self.indent();
        self.buf.push('<');
        self.buf.push_str(name);
        for (key, value) in attributes {
            self.buf.push(' ');
            self.buf.push_str(key);
            self.buf.push_str("=\"");
            escape_into(&mut self.buf, value);
            self.buf.push('"');
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }
}

/// Escapes an attribute value for a double-quoted attribute.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'', '\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    escape_into(&mut out, value);
    Cow::Owned(out)
}

fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_closing_root() {
        let root = parse_document("<relation id='1' changeset=\"2\"/>").unwrap();
        assert_eq!(root.name, "relation");
        assert_eq!(root.attribute("id"), Some("1"));
        assert_eq!(root.attribute("changeset"), Some("2"));
        assert_eq!(root.attribute("version"), None);
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_nested_elements_in_order() {
        let doc = r#"<?xml version="1.0"?>
            <!-- upload -->
            <osm version="0.6">
              <relation id="5" changeset="1">
                <member type="node" ref="1" role="a"/>
                <tag k="type" v="route" />
                <member type="way" ref="2"/>
              </relation>
            </osm>
        "#;
        let root = parse_document(doc).unwrap();
        assert_eq!(root.name, "osm");
        let relation = root.child("relation").unwrap();
        let refs: Vec<_> = relation
            .children_named("member")
            .map(|m| m.attribute("ref").unwrap())
            .collect();
        assert_eq!(refs, vec!["1", "2"]);
        assert_eq!(relation.children_named("tag").count(), 1);
    }

    #[test]
    fn test_empty_attribute_value() {
        let root = parse_document("<relation id=''/>").unwrap();
        assert_eq!(root.attribute("id"), Some(""));
    }

    #[test]
    fn test_entities_decoded() {
        let root = parse_document(r#"<tag k="a&amp;b" v='&lt;&#65;&#x42;&quot;&apos;&gt;'/>"#).unwrap();
        assert_eq!(root.attribute("k"), Some("a&b"));
        assert_eq!(root.attribute("v"), Some("<AB\"'>"));
    }

    #[test]
    fn test_text_and_comments_skipped() {
        let root = parse_document("<osm>text<!-- c --><relation/>more</osm>").unwrap();
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn test_malformed_markup_rejected() {
        for doc in [
            "",
            "   ",
            "not xml",
            "<osm>",
            "<osm></relation>",
            "<osm><relation></osm>",
            "<relation id=1/>",
            "<relation id='1/>",
            "<tag k='&bogus;'/>",
            "<osm/><osm/>",
            "<osm/> trailing",
            "<relation changeset='1' changeset='2'/>",
            "<relation id='5' changeset='1' id='0'/>",
            "<tag k='a<b'/>",
            "<tag k='&#0;'/>",
            "<tag k='&#x1F;'/>",
            "<tag k='&#xFFFE;'/>",
        ] {
            assert!(parse_document(doc).is_err(), "accepted {:?}", doc);
        }
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "<x>".repeat(depth), "</x>".repeat(depth));

        assert!(parse_document_with_max_depth(&nested(3), 3).is_ok());
        assert!(parse_document_with_max_depth(&nested(4), 3).is_err());
        assert!(parse_document_with_max_depth("<osm><relation/></osm>", 1).is_err());

        let deep = format!("<osm><relation changeset='1'>{}</relation></osm>", nested(5_000));
        assert!(parse_document(&deep).is_err());
        assert!(parse_document(&nested(MAX_DEPTH)).is_ok());
    }

    #[test]
    fn test_writer_output() {
        let mut writer = XmlWriter::new();
        writer.open("osm", &[("version", "0.6")]);
        writer.empty("tag", &[("k", "a\"b"), ("v", "x & y")]);
        writer.close("osm");
        let out = writer.into_string();
        assert!(out.starts_with("<?xml"));
        assert!(out.contains("<osm version=\"0.6\">\n"));
        assert!(out.contains("  <tag k=\"a&quot;b\" v=\"x &amp; y\"/>\n"));
        assert!(out.ends_with("</osm>\n"));

        let root = parse_document(&out).unwrap();
        let tag = root.child("tag").unwrap();
        assert_eq!(tag.attribute("k"), Some("a\"b"));
        assert_eq!(tag.attribute("v"), Some("x & y"));
    }

    #[test]
    fn test_escape_attribute_borrows_when_clean() {
        assert!(matches!(escape_attribute("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_attribute("a<b"), "a&lt;b");
    }
}
