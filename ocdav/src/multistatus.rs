// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Parsing of `multistatus` responses.
//!
//! See: <https://www.rfc-editor.org/rfc/rfc4918#section-13>

use http::status::InvalidStatusCode;
use http::StatusCode;
use log::{debug, warn};

use crate::clark::{parse_clark, PropertyName};
use crate::names::{ERROR, HREF, MULTISTATUS, PROP, PROPSTAT, RESPONSE, SABRE_MESSAGE, STATUS};
use crate::namespaces::NamespaceTable;
use crate::xml::{self, XmlNode, TEXT_KEY};
use crate::xmlutils::parse_statusline;

/// The value of a single property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Text content. Self-closing elements yield an empty string.
    Text(String),
    /// Text content of each child element, in document order.
    ///
    /// E.g.: the `share-type` entries inside `oc:share-types`.
    Texts(Vec<String>),
    /// Names of empty child elements, in document order.
    ///
    /// E.g.: `{DAV:}collection` inside `resourcetype`.
    Names(Vec<PropertyName>),
}

impl PropertyValue {
    /// Returns the text, if this is a [`PropertyValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether this value lists `name` among its child element names.
    #[must_use]
    pub fn contains_name(&self, name: &PropertyName) -> bool {
        matches!(self, PropertyValue::Names(names) if names.contains(name))
    }

    fn from_node(node: &XmlNode) -> Self {
        match node {
            XmlNode::Text(text) => PropertyValue::Text(text.clone()),
            XmlNode::Sequence(items) => {
                PropertyValue::Texts(items.iter().map(XmlNode::text_content).collect())
            }
            XmlNode::Element(_) if node.get(TEXT_KEY).is_some() => {
                PropertyValue::Text(node.text_content())
            }
            XmlNode::Element(_) => {
                let children = node
                    .children()
                    .flat_map(|(key, child)| match child {
                        XmlNode::Sequence(items) => {
                            items.iter().map(|item| (key, item)).collect::<Vec<_>>()
                        }
                        child => vec![(key, child)],
                    })
                    .collect::<Vec<_>>();

                if children.is_empty() {
                    return PropertyValue::Text(String::new());
                }

                if children.iter().all(|(_, child)| child.is_empty()) {
                    let names = children
                        .iter()
                        .filter_map(|(key, _)| {
                            let name = parse_clark(key);
                            if name.is_none() {
                                debug!("skipping non-qualified child element '{key}'");
                            }
                            name
                        })
                        .collect();
                    PropertyValue::Names(names)
                } else {
                    PropertyValue::Texts(
                        children
                            .iter()
                            .map(|(_, child)| child.text_content())
                            .collect(),
                    )
                }
            }
        }
    }
}

/// Properties of a resource, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    entries: Vec<(PropertyName, PropertyValue)>,
}

impl PropertyMap {
    #[must_use]
    pub fn get(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Returns the value of a property if it is plain text.
    #[must_use]
    pub fn get_text(&self, name: &PropertyName) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_text)
    }

    #[must_use]
    pub fn contains(&self, name: &PropertyName) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyName, &PropertyValue)> {
        self.entries.iter().map(|(name, value)| (name, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_prop(prop: &XmlNode) -> Self {
        let mut entries = Vec::new();
        for (key, node) in prop.children() {
            let Some(name) = parse_clark(key) else {
                debug!("skipping property without namespace: '{key}'");
                continue;
            };
            entries.push((name, PropertyValue::from_node(node)));
        }
        Self { entries }
    }
}

/// A `(status, properties)` group of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropStat {
    /// Raw status line, e.g.: `HTTP/1.1 200 OK`.
    pub status: String,
    pub properties: PropertyMap,
}

impl PropStat {
    /// Parses the status line into a status code.
    ///
    /// # Errors
    ///
    /// If the status line is missing or malformed.
    pub fn status_code(&self) -> Result<StatusCode, InvalidStatusCode> {
        parse_statusline(&self.status)
    }

    /// Whether the status line reports `200 OK`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status_code().map_or(false, |code| code == StatusCode::OK)
    }
}

fn status_line(node: &XmlNode) -> String {
    node.text_content().trim().to_string()
}

/// A single `response` element of a multistatus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// The href, as sent by the server. Percent-encoding is left intact.
    pub href: String,
    /// Property groups, in document order.
    pub propstats: Vec<PropStat>,
    /// Response-level status, for responses that report on the resource as a whole.
    pub status: Option<String>,
}

impl Response {
    fn from_node(node: &XmlNode) -> Self {
        let href = node
            .get_name(&HREF)
            .map(|href| href.text_content().trim().to_string())
            .unwrap_or_default();
        if href.is_empty() {
            warn!("response without href");
        }
        let status = node.get_name(&STATUS).map(status_line);

        let mut propstats = node
            .all_named(&PROPSTAT)
            .into_iter()
            .map(|propstat| PropStat {
                status: propstat
                    .get_name(&STATUS)
                    .map(status_line)
                    .unwrap_or_default(),
                properties: propstat
                    .get_name(&PROP)
                    .map(PropertyMap::from_prop)
                    .unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        if propstats.is_empty() {
            debug!("response for '{href}' has no propstat");
            propstats.push(PropStat {
                status: status.clone().unwrap_or_default(),
                properties: PropertyMap::default(),
            });
        }

        Response {
            href,
            propstats,
            status,
        }
    }

    /// Returns the first group with a `200` status.
    #[must_use]
    pub fn ok_propstat(&self) -> Option<&PropStat> {
        self.propstats.iter().find(|propstat| propstat.is_ok())
    }
}

/// Interprets an already parsed document as a multistatus.
///
/// `tree` must have been parsed with a namespace table, so that keys are in Clark notation.
/// A document whose root is not a `multistatus` yields no responses.
#[must_use]
pub fn multistatus_from_tree(tree: &XmlNode) -> Vec<Response> {
    let Some(root) = tree.get_name(&MULTISTATUS) else {
        warn!("document root is not a multistatus");
        return Vec::new();
    };

    root.all_named(&RESPONSE)
        .into_iter()
        .map(Response::from_node)
        .collect()
}

/// Parses a multistatus body.
///
/// Responses and their property groups are returned in document order.
///
/// # Errors
///
/// If the body is not well-formed XML.
pub fn parse_multistatus(
    body: &str,
    namespaces: &NamespaceTable,
) -> Result<Vec<Response>, xml::Error> {
    let tree = xml::parse(body, Some(namespaces))?;
    Ok(multistatus_from_tree(&tree))
}

/// Extracts the human readable message from an error body.
///
/// Returns `None` if the body is not a `DAV:error` document or carries no message.
#[must_use]
pub fn parse_error_message(body: &str, namespaces: &NamespaceTable) -> Option<String> {
    let tree = xml::parse(body, Some(namespaces)).ok()?;
    let message = tree.get_name(&ERROR)?.get_name(&SABRE_MESSAGE)?.text_content();
    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
