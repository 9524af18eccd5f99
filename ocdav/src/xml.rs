// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! A small XML codec producing ordered key-value trees.
//!
//! This is not a general purpose XML library. It reads documents such as WebDav `multistatus`
//! responses into [`XmlNode`] trees where:
//!
//! - Each element is keyed by its name. When a [`NamespaceTable`] is given, names are rewritten
//!   into Clark notation (`{DAV:}getetag`); otherwise the raw `prefix:local` form is kept.
//! - Repeated sibling elements are collected into a [`XmlNode::Sequence`], in document order.
//! - An element containing only text becomes [`XmlNode::Text`], kept verbatim including
//!   surrounding whitespace; an empty element becomes an empty string.
//! - Attributes are kept under [`ATTRIBUTES_KEY`] and text mixed with child elements under
//!   [`TEXT_KEY`]. Namespace declarations are consumed and not kept as attributes.

use std::mem;

use log::debug;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::clark::{format_clark, split_qualified, PropertyName};
use crate::namespaces::NamespaceTable;

/// Key under which an element's attributes are stored.
pub const ATTRIBUTES_KEY: &str = "@attributes";
/// Key under which text mixed with child elements is stored.
pub const TEXT_KEY: &str = "#text";

/// The input is not well-formed XML.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not parse XML")]
    Parser(#[from] quick_xml::Error),

    #[error("invalid attribute in XML element")]
    Attribute(#[from] AttrError),

    #[error("XML data is not valid utf-8")]
    NotUtf8(#[from] std::str::Utf8Error),

    #[error("expected closing tag for '{expected}', found '{found}'")]
    MismatchedEnd { expected: String, found: String },

    #[error("closing tag '{0}' has no matching opening tag")]
    UnexpectedEnd(String),

    #[error("element '{0}' is not closed at end of input")]
    Unclosed(String),

    #[error("document has no root element")]
    MissingRoot,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("text found outside of the root element")]
    TextOutsideRoot,
}

/// A node in a parsed XML tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Text content. Empty elements are represented as an empty string.
    Text(String),
    /// Child nodes keyed by name, in document order.
    Element(Vec<(String, XmlNode)>),
    /// Repeated siblings sharing the same name.
    Sequence(Vec<XmlNode>),
}

impl XmlNode {
    /// Returns the child with the given key.
    ///
    /// Only meaningful for [`XmlNode::Element`]; returns `None` for other variants.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&XmlNode> {
        self.entries()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Returns the child keyed by the Clark form of `name`.
    #[must_use]
    pub fn get_name(&self, name: &PropertyName) -> Option<&XmlNode> {
        self.get(&name.to_string())
    }

    /// Returns all children with the given key.
    ///
    /// A single child and a sequence of children are treated alike, so callers need not care
    /// whether an element occurred once or several times.
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<&XmlNode> {
        match self.get(key) {
            Some(XmlNode::Sequence(items)) => items.iter().collect(),
            Some(node) => vec![node],
            None => Vec::new(),
        }
    }

    /// Like [`XmlNode::all`], keyed by the Clark form of `name`.
    #[must_use]
    pub fn all_named(&self, name: &PropertyName) -> Vec<&XmlNode> {
        self.all(&name.to_string())
    }

    /// Returns the text if this node is a plain text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlNode::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns all entries of an element, including reserved keys.
    #[must_use]
    pub fn entries(&self) -> &[(String, XmlNode)] {
        match self {
            XmlNode::Element(entries) => entries,
            _ => &[],
        }
    }

    /// Iterates over child elements, skipping attributes and mixed text.
    pub fn children(&self) -> impl Iterator<Item = (&str, &XmlNode)> {
        self.entries()
            .iter()
            .filter(|(key, _)| key != ATTRIBUTES_KEY && key != TEXT_KEY)
            .map(|(key, node)| (key.as_str(), node))
    }

    /// Returns the value of an attribute, by raw name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.get(ATTRIBUTES_KEY)?.get(name)?.as_text()
    }

    /// Concatenates all text under this node, depth-first.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            XmlNode::Text(text) => out.push_str(text),
            XmlNode::Element(entries) => {
                for (key, node) in entries {
                    if key != ATTRIBUTES_KEY {
                        node.collect_text(out);
                    }
                }
            }
            XmlNode::Sequence(items) => {
                for node in items {
                    node.collect_text(out);
                }
            }
        }
    }

    /// Whether this node has neither text nor child elements, as produced by a self-closing
    /// element. Attributes are ignored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            XmlNode::Text(text) => text.is_empty(),
            XmlNode::Element(entries) => entries.iter().all(|(key, _)| key == ATTRIBUTES_KEY),
            XmlNode::Sequence(_) => false,
        }
    }
}

/// Inserts a child, turning repeated keys into a sequence.
fn insert_child(entries: &mut Vec<(String, XmlNode)>, key: String, node: XmlNode) {
    let Some((_, existing)) = entries.iter_mut().find(|(k, _)| *k == key) else {
        entries.push((key, node));
        return;
    };

    let previous = mem::replace(existing, XmlNode::Sequence(Vec::new()));
    let mut items = match previous {
        XmlNode::Sequence(items) => items,
        other => vec![other],
    };
    match node {
        XmlNode::Sequence(more) => items.extend(more),
        other => items.push(other),
    }
    *existing = XmlNode::Sequence(items);
}

/// An element whose closing tag has not been read yet.
struct OpenElement {
    qname: String,
    /// Namespace declarations on this element. `None` is the default namespace.
    declarations: Vec<(Option<String>, String)>,
    attributes: Vec<(String, XmlNode)>,
    children: Vec<(String, XmlNode)>,
    text: String,
}

impl OpenElement {
    fn from_start(start: &BytesStart) -> Result<Self, Error> {
        let qname = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut declarations = Vec::new();
        let mut attributes = Vec::new();

        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())?;
            let value = attribute.unescape_value()?.into_owned();
            if key == "xmlns" {
                declarations.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((Some(prefix.to_string()), value));
            } else {
                attributes.push((key.to_string(), XmlNode::Text(value)));
            }
        }

        Ok(OpenElement {
            qname,
            declarations,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    fn into_node(self) -> XmlNode {
        if self.children.is_empty() && self.attributes.is_empty() {
            return XmlNode::Text(self.text);
        }

        let mut entries = Vec::with_capacity(self.children.len() + 2);
        if !self.attributes.is_empty() {
            entries.push((ATTRIBUTES_KEY.to_string(), XmlNode::Element(self.attributes)));
        }
        // Indentation between child elements is not content.
        let keep_text = if self.children.is_empty() {
            !self.text.is_empty()
        } else {
            !self.text.trim().is_empty()
        };
        entries.extend(self.children);
        if keep_text {
            entries.push((TEXT_KEY.to_string(), XmlNode::Text(self.text)));
        }
        XmlNode::Element(entries)
    }
}

/// Finds the namespace bound to `prefix` by the innermost declaration in scope.
fn lookup_declared<'a>(open: &'a [OpenElement], prefix: Option<&str>) -> Option<&'a str> {
    open.iter()
        .rev()
        .flat_map(|element| element.declarations.iter().rev())
        .find(|(declared, _)| declared.as_deref() == prefix)
        .map(|(_, uri)| uri.as_str())
}

/// Computes the key for the innermost open element.
fn element_key(open: &[OpenElement], namespaces: Option<&NamespaceTable>) -> String {
    let Some(element) = open.last() else {
        return String::new();
    };
    let Some(namespaces) = namespaces else {
        return element.qname.clone();
    };

    let qname = element.qname.as_str();
    if let Some((prefix, local)) = split_qualified(qname) {
        match lookup_declared(open, Some(prefix)).or_else(|| namespaces.uri_for(prefix)) {
            Some(uri) => format_clark(uri, local),
            None => {
                debug!("no namespace bound to prefix in '{qname}'");
                qname.to_string()
            }
        }
    } else if qname.contains(':') {
        qname.to_string()
    } else {
        match lookup_declared(open, None) {
            Some(uri) if !uri.is_empty() => format_clark(uri, qname),
            _ => qname.to_string(),
        }
    }
}

/// Parses an XML document into a tree.
///
/// The returned node is an [`XmlNode::Element`] with a single entry: the root element.
///
/// If `namespaces` is given, every element name is rewritten into Clark notation. Prefixes are
/// resolved using the declarations in the document itself, falling back to `namespaces` for
/// undeclared ones. Names that cannot be resolved are kept as written.
///
/// # Errors
///
/// If the input is not well-formed XML. Well-formed XML with an unexpected shape is never an
/// error at this level.
pub fn parse(text: &str, namespaces: Option<&NamespaceTable>) -> Result<XmlNode, Error> {
    let mut reader = Reader::from_str(text);
    reader.check_end_names(false);

    let mut open: Vec<OpenElement> = Vec::new();
    let mut root: Option<(String, XmlNode)> = None;

    // Closes the innermost element and attaches it to its parent (or sets it as root).
    let close = |open: &mut Vec<OpenElement>,
                 root: &mut Option<(String, XmlNode)>|
     -> Result<(), Error> {
        let key = element_key(open, namespaces);
        let Some(element) = open.pop() else {
            return Ok(());
        };
        let node = element.into_node();
        match open.last_mut() {
            Some(parent) => insert_child(&mut parent.children, key, node),
            None if root.is_some() => return Err(Error::MultipleRoots),
            None => *root = Some((key, node)),
        }
        Ok(())
    };

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if open.is_empty() && root.is_some() {
                    return Err(Error::MultipleRoots);
                }
                open.push(OpenElement::from_start(&start)?);
            }
            Event::Empty(start) => {
                if open.is_empty() && root.is_some() {
                    return Err(Error::MultipleRoots);
                }
                open.push(OpenElement::from_start(&start)?);
                close(&mut open, &mut root)?;
            }
            Event::End(end) => {
                let end_name = end.name();
                let found = std::str::from_utf8(end_name.as_ref())?;
                match open.last() {
                    Some(element) if element.qname == found => {}
                    Some(element) => {
                        return Err(Error::MismatchedEnd {
                            expected: element.qname.clone(),
                            found: found.to_string(),
                        })
                    }
                    None => return Err(Error::UnexpectedEnd(found.to_string())),
                }
                close(&mut open, &mut root)?;
            }
            Event::Text(text) => {
                let text = text.unescape()?;
                match open.last_mut() {
                    Some(element) => element.text.push_str(&text),
                    None if text.trim().is_empty() => {}
                    None => return Err(Error::TextOutsideRoot),
                }
            }
            Event::CData(cdata) => {
                let raw = cdata.into_inner();
                let text = std::str::from_utf8(&raw)?;
                match open.last_mut() {
                    Some(element) => element.text.push_str(text),
                    None => return Err(Error::TextOutsideRoot),
                }
            }
            Event::Eof => break,
            Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_) => {}
        }
    }

    if let Some(element) = open.last() {
        return Err(Error::Unclosed(element.qname.clone()));
    }
    let (key, node) = root.ok_or(Error::MissingRoot)?;

    Ok(XmlNode::Element(vec![(key, node)]))
}

fn collapse_key(key: &str, namespaces: &NamespaceTable) -> String {
    split_qualified(key)
        .and_then(|(prefix, local)| {
            namespaces
                .uri_for(prefix)
                .map(|uri| format_clark(uri, local))
        })
        .unwrap_or_else(|| key.to_string())
}

/// Rewrites `prefix:local` keys of a tree into Clark notation using `namespaces`.
///
/// This is meant for trees parsed without a table. Keys already in Clark notation, unprefixed
/// keys and keys with unknown prefixes are left untouched, so applying this twice has the same
/// result as applying it once. Attributes keep their raw names.
#[must_use]
pub fn collapse_namespaces(node: XmlNode, namespaces: &NamespaceTable) -> XmlNode {
    match node {
        XmlNode::Text(text) => XmlNode::Text(text),
        XmlNode::Sequence(items) => XmlNode::Sequence(
            items
                .into_iter()
                .map(|item| collapse_namespaces(item, namespaces))
                .collect(),
        ),
        XmlNode::Element(entries) => {
            let mut collapsed = Vec::with_capacity(entries.len());
            for (key, child) in entries {
                if key == ATTRIBUTES_KEY || key == TEXT_KEY {
                    collapsed.push((key, child));
                } else {
                    let key = collapse_key(&key, namespaces);
                    insert_child(&mut collapsed, key, collapse_namespaces(child, namespaces));
                }
            }
            XmlNode::Element(collapsed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{collapse_namespaces, parse, Error, XmlNode, ATTRIBUTES_KEY, TEXT_KEY};
    use crate::namespaces::NamespaceTable;

    fn text(value: &str) -> XmlNode {
        XmlNode::Text(value.to_string())
    }

    const CONTACT: &str = r#"<?xml version="1.0"?>
<cont:contact xmlns:cont="www.tutorialspoint.com/profile">
    <cont:name>Tanmay Patil</cont:name>
    <cont:company>TutorialsPoint</cont:company>
    <cont:phone>(011) 123-4567</cont:phone>
</cont:contact>"#;

    #[test]
    fn test_parse_with_namespaces() {
        let table = NamespaceTable::new().with("cont", "www.tutorialspoint.com/profile");
        let parsed = parse(CONTACT, Some(&table)).unwrap();

        assert_eq!(
            parsed,
            XmlNode::Element(vec![(
                "{www.tutorialspoint.com/profile}contact".to_string(),
                XmlNode::Element(vec![
                    (
                        "{www.tutorialspoint.com/profile}name".to_string(),
                        text("Tanmay Patil")
                    ),
                    (
                        "{www.tutorialspoint.com/profile}company".to_string(),
                        text("TutorialsPoint")
                    ),
                    (
                        "{www.tutorialspoint.com/profile}phone".to_string(),
                        text("(011) 123-4567")
                    ),
                ])
            )])
        );
    }

    #[test]
    fn test_parse_without_namespaces_keeps_prefixes() {
        let parsed = parse(CONTACT, None).unwrap();
        let contact = parsed.get("cont:contact").unwrap();
        assert_eq!(contact.get("cont:name"), Some(&text("Tanmay Patil")));
        assert_eq!(contact.get("{www.tutorialspoint.com/profile}name"), None);
    }

    #[test]
    fn test_collapse_is_exhaustive_and_idempotent() {
        let table = NamespaceTable::new().with("cont", "www.tutorialspoint.com/profile");
        let raw = parse(CONTACT, None).unwrap();

        let once = collapse_namespaces(raw, &table);
        assert_eq!(once, parse(CONTACT, Some(&table)).unwrap());

        let twice = collapse_namespaces(once.clone(), &table);
        assert_eq!(once, twice);

        let contact = once.get("{www.tutorialspoint.com/profile}contact").unwrap();
        assert!(contact.children().all(|(key, _)| !key.starts_with("cont:")));
    }

    #[test]
    fn test_repeated_siblings_become_sequence() {
        let raw = r#"<oc:share-types xmlns:oc="http://owncloud.org/ns">
            <oc:share-type>0</oc:share-type>
            <oc:other>x</oc:other>
            <oc:share-type>3</oc:share-type>
        </oc:share-types>"#;
        let parsed = parse(raw, Some(&NamespaceTable::default())).unwrap();
        let share_types = parsed.get("{http://owncloud.org/ns}share-types").unwrap();

        assert_eq!(
            share_types.entries(),
            &[
                (
                    "{http://owncloud.org/ns}share-type".to_string(),
                    XmlNode::Sequence(vec![text("0"), text("3")])
                ),
                ("{http://owncloud.org/ns}other".to_string(), text("x")),
            ]
        );
        assert_eq!(share_types.all("{http://owncloud.org/ns}share-type").len(), 2);
        assert_eq!(share_types.all("{http://owncloud.org/ns}other").len(), 1);
        assert!(share_types.all("{http://owncloud.org/ns}missing").is_empty());
    }

    #[test]
    fn test_empty_elements_are_empty_text() {
        let raw = r#"<d:prop xmlns:d="DAV:"><d:getcontentlength/><d:getetag></d:getetag></d:prop>"#;
        let parsed = parse(raw, Some(&NamespaceTable::default())).unwrap();
        let prop = parsed.get("{DAV:}prop").unwrap();

        assert_eq!(prop.get("{DAV:}getcontentlength"), Some(&text("")));
        assert_eq!(prop.get("{DAV:}getetag"), Some(&text("")));
        assert!(prop.get("{DAV:}getetag").unwrap().is_empty());
    }

    #[test]
    fn test_default_namespace_and_inline_declarations() {
        let raw = r#"<prop xmlns="DAV:">
            <getetag>"abc"</getetag>
            <x1:favorite xmlns:x1="http://owncloud.org/ns">1</x1:favorite>
            <y:unknown>value</y:unknown>
        </prop>"#;
        let parsed = parse(raw, Some(&NamespaceTable::new())).unwrap();
        let prop = parsed.get("{DAV:}prop").unwrap();

        assert_eq!(prop.get("{DAV:}getetag"), Some(&text("\"abc\"")));
        assert_eq!(
            prop.get("{http://owncloud.org/ns}favorite"),
            Some(&text("1"))
        );
        // Unresolvable prefixes are kept as written.
        assert_eq!(prop.get("y:unknown"), Some(&text("value")));
    }

    #[test]
    fn test_document_declarations_take_precedence() {
        let raw = r#"<a:root xmlns:a="urn:document"><a:child/></a:root>"#;
        let table = NamespaceTable::new().with("a", "urn:table");
        let parsed = parse(raw, Some(&table)).unwrap();
        let root = parsed.get("{urn:document}root").unwrap();
        assert_eq!(root.get("{urn:document}child"), Some(&text("")));
    }

    #[test]
    fn test_attributes_and_mixed_text() {
        let raw = r#"<root><item id="1" kind="a &amp; b">value</item><mixed>text<inner/></mixed></root>"#;
        let parsed = parse(raw, None).unwrap();
        let root = parsed.get("root").unwrap();

        let item = root.get("item").unwrap();
        assert_eq!(item.attribute("id"), Some("1"));
        assert_eq!(item.attribute("kind"), Some("a & b"));
        assert_eq!(item.get(TEXT_KEY), Some(&text("value")));
        assert!(item.get(ATTRIBUTES_KEY).is_some());
        assert_eq!(item.children().count(), 0);

        let mixed = root.get("mixed").unwrap();
        assert_eq!(mixed.get("inner"), Some(&text("")));
        assert_eq!(mixed.get(TEXT_KEY), Some(&text("text")));
        assert_eq!(mixed.text_content(), "text");
    }

    #[test]
    fn test_leaf_text_is_verbatim() {
        let raw = "<root>\n  <padded>  two  words  </padded>\n  <blank>   </blank>\n</root>";
        let parsed = parse(raw, None).unwrap();
        let root = parsed.get("root").unwrap();

        assert_eq!(root.get("padded"), Some(&text("  two  words  ")));
        assert_eq!(root.get("blank"), Some(&text("   ")));
        // Indentation between children is dropped.
        assert_eq!(root.get(TEXT_KEY), None);
    }

    #[test]
    fn test_mixed_text_keeps_spacing() {
        let raw = "<p>Hello <b/> world</p>";
        let parsed = parse(raw, None).unwrap();
        let p = parsed.get("p").unwrap();

        assert_eq!(p.get(TEXT_KEY), Some(&text("Hello  world")));
        assert_eq!(p.text_content(), "Hello  world");
    }

    #[test]
    fn test_attribute_only_element_is_empty() {
        let raw = r#"<root><flag kind="x"/><valued kind="x">1</valued></root>"#;
        let parsed = parse(raw, None).unwrap();
        let root = parsed.get("root").unwrap();

        assert!(root.get("flag").unwrap().is_empty());
        assert!(!root.get("valued").unwrap().is_empty());
    }

    #[test]
    fn test_cdata_and_entities() {
        let raw = r#"<root><a><![CDATA[<not markup>]]></a><b>&lt;escaped&gt;</b></root>"#;
        let parsed = parse(raw, None).unwrap();
        let root = parsed.get("root").unwrap();
        assert_eq!(root.get("a"), Some(&text("<not markup>")));
        assert_eq!(root.get("b"), Some(&text("<escaped>")));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            parse("<a><b></a>", None),
            Err(Error::MismatchedEnd { .. })
        ));
        assert!(parse("<a>", None).is_err());
        assert!(parse("</a>", None).is_err());
        assert!(parse("<a><b>text</b>", None).is_err());
        assert!(matches!(parse("", None), Err(Error::MissingRoot)));
        assert!(matches!(parse("not xml", None), Err(Error::TextOutsideRoot)));
        assert!(matches!(parse("<a/><b/>", None), Err(Error::MultipleRoots)));
    }
}
