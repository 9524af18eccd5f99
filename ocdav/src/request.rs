// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Builders for WebDav requests.
//!
//! Everything here is a pure function of its input: builders render XML bodies and headers, but
//! never perform any I/O. The resulting [`DavRequest`] is handed to a
//! [`Transport`](crate::transport::Transport) for sending.

use std::borrow::Cow;
use std::fmt;

use http::header::{InvalidHeaderValue, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};

use crate::clark::PropertyName;
use crate::names::{self, DAV, OWNCLOUD, RESOURCETYPE};
use crate::namespaces::NamespaceTable;
use crate::xmlutils::{escape_text, render_declarations, render_property};

const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const XML_DECLARATION: &str = "<?xml version=\"1.0\"?>\n";

const DEPTH: &str = "depth";
const DESTINATION: &str = "destination";
const OVERWRITE: &str = "overwrite";

/// HTTP methods used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Propfind,
    Proppatch,
    Mkcol,
    Report,
    Move,
    Copy,
    Delete,
}

impl Verb {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Verb::Propfind => "PROPFIND",
            Verb::Proppatch => "PROPPATCH",
            Verb::Mkcol => "MKCOL",
            Verb::Report => "REPORT",
            Verb::Move => "MOVE",
            Verb::Copy => "COPY",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of the `Depth` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Depth {
    /// The resource itself only.
    Zero,
    /// The resource and its immediate children.
    #[default]
    One,
    /// The resource and all its descendants.
    Infinity,
}

impl Depth {
    /// Returns the header value string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request ready to be sent.
///
/// The `path` is not URL-encoded; transports resolve it against their base URL.
#[derive(Debug, Clone)]
pub struct DavRequest {
    pub verb: Verb,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl DavRequest {
    fn new(verb: Verb, path: &str) -> Self {
        Self {
            verb,
            path: path.to_string(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    fn with_xml_body(mut self, body: String) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE));
        self.body = Some(body);
        self
    }

    /// Adds extra headers to this request.
    ///
    /// Headers given here replace any header of the same name set by the builder.
    #[must_use]
    pub fn with_headers(mut self, extra: &HeaderMap) -> Self {
        for name in extra.keys() {
            self.headers.remove(name);
        }
        for (name, value) in extra {
            self.headers.append(name.clone(), value.clone());
        }
        self
    }
}

/// Changes to apply with a `PROPPATCH` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyUpdate {
    set: Vec<(PropertyName, String)>,
    remove: Vec<PropertyName>,
}

impl PropertyUpdate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property to a text value.
    ///
    /// The value is escaped when rendered, except for `DAV:resourcetype` whose value is
    /// inserted verbatim since it carries child elements.
    #[must_use]
    pub fn set<V: Into<String>>(mut self, name: PropertyName, value: V) -> Self {
        self.set.push((name, value.into()));
        self
    }

    /// Removes a property.
    #[must_use]
    pub fn remove(mut self, name: PropertyName) -> Self {
        self.remove.push(name);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// Filters for `oc:filter-files` reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFilter {
    /// Only files marked as favourite.
    Favorites,
    /// Only files carrying all of the given system tag ids.
    Tags(Vec<String>),
}

/// Renders request bodies with a given namespace table.
///
/// The `DAV:` and ownCloud namespaces are always available to the builder; if the table lacks
/// them they are added under an unused prefix.
#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    namespaces: Cow<'a, NamespaceTable>,
}

/// Adds `uri` to the table unless present, preferring `prefix`.
fn ensure_namespace(namespaces: &mut Cow<'_, NamespaceTable>, prefix: &str, uri: &str) {
    if namespaces.prefix_for(uri).is_some() {
        return;
    }
    let mut candidate = prefix.to_string();
    let mut counter = 0;
    while namespaces.uri_for(&candidate).is_some() {
        counter += 1;
        candidate = format!("{prefix}{counter}");
    }
    let table = namespaces.to_mut();
    *table = std::mem::take(table).with(candidate, uri);
}

impl<'a> RequestBuilder<'a> {
    #[must_use]
    pub fn new(namespaces: &'a NamespaceTable) -> Self {
        let mut namespaces = Cow::Borrowed(namespaces);
        ensure_namespace(&mut namespaces, "d", DAV);
        ensure_namespace(&mut namespaces, "oc", OWNCLOUD);
        Self { namespaces }
    }

    /// The table used for rendering, including any namespace added by the builder.
    #[must_use]
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// The prefixed name of a structural element.
    fn qualified(&self, name: &PropertyName) -> String {
        match self.namespaces.prefix_for(name.namespace()) {
            Some(prefix) => format!("{prefix}:{}", name.name()),
            None => name.name().to_string(),
        }
    }

    fn open_root(&self, name: &PropertyName) -> String {
        format!(
            "{XML_DECLARATION}<{}{}>",
            self.qualified(name),
            render_declarations(&self.namespaces)
        )
    }

    fn close(&self, name: &PropertyName) -> String {
        format!("</{}>", self.qualified(name))
    }

    /// Renders a `DAV:prop` with one empty element per property.
    fn render_prop(&self, properties: &[PropertyName]) -> String {
        let prop = self.qualified(&names::PROP);
        if properties.is_empty() {
            return format!("<{prop}/>");
        }

        let mut rendered = format!("<{prop}>");
        for property in properties {
            rendered.push_str(&render_property(property, &self.namespaces, None));
        }
        rendered.push_str(&format!("</{prop}>"));
        rendered
    }

    /// Renders a `DAV:set` block.
    fn render_set(&self, properties: &[(PropertyName, String)]) -> String {
        let mut rendered = format!(
            "<{}><{}>",
            self.qualified(&SET),
            self.qualified(&names::PROP)
        );
        for (name, value) in properties {
            let content = if *name == RESOURCETYPE {
                Cow::Borrowed(value.as_str())
            } else {
                escape_text(value)
            };
            rendered.push_str(&render_property(name, &self.namespaces, Some(&content)));
        }
        rendered.push_str(&format!(
            "</{}></{}>",
            self.qualified(&names::PROP),
            self.qualified(&SET)
        ));
        rendered
    }

    /// Renders a `DAV:remove` block.
    fn render_remove(&self, properties: &[PropertyName]) -> String {
        format!(
            "<{remove}>{}</{remove}>",
            self.render_prop(properties),
            remove = self.qualified(&REMOVE),
        )
    }

    /// Builds a `PROPFIND` request.
    ///
    /// An empty list of properties renders an empty `prop` element.
    #[must_use]
    pub fn propfind(&self, path: &str, properties: &[PropertyName], depth: Depth) -> DavRequest {
        let body = format!(
            "{}{}{}",
            self.open_root(&PROPFIND),
            self.render_prop(properties),
            self.close(&PROPFIND)
        );

        let mut request = DavRequest::new(Verb::Propfind, path).with_xml_body(body);
        request
            .headers
            .insert(DEPTH, HeaderValue::from_static(depth.as_str()));
        request
    }

    /// Builds a `PROPPATCH` request.
    #[must_use]
    pub fn proppatch(&self, path: &str, update: &PropertyUpdate) -> DavRequest {
        let mut body = self.open_root(&PROPERTYUPDATE);
        if !update.set.is_empty() {
            body.push_str(&self.render_set(&update.set));
        }
        if !update.remove.is_empty() {
            body.push_str(&self.render_remove(&update.remove));
        }
        body.push_str(&self.close(&PROPERTYUPDATE));

        DavRequest::new(Verb::Proppatch, path).with_xml_body(body)
    }

    /// Builds a `MKCOL` request.
    ///
    /// Without properties, this is a plain `MKCOL` with no body. Otherwise, this is an
    /// [Extended MKCOL](https://www.rfc-editor.org/rfc/rfc5689) which sets the given properties
    /// on creation.
    #[must_use]
    pub fn mkcol(&self, path: &str, properties: &[(PropertyName, String)]) -> DavRequest {
        let request = DavRequest::new(Verb::Mkcol, path);
        if properties.is_empty() {
            return request;
        }

        let body = format!(
            "{}{}{}",
            self.open_root(&MKCOL),
            self.render_set(properties),
            self.close(&MKCOL)
        );
        request.with_xml_body(body)
    }

    /// Builds an `oc:search-files` report.
    #[must_use]
    pub fn search_files(
        &self,
        path: &str,
        pattern: &str,
        limit: Option<u32>,
        properties: &[PropertyName],
    ) -> DavRequest {
        let search = self.qualified(&SEARCH);
        let pattern_tag = self.qualified(&PATTERN);
        let mut criteria = format!(
            "<{search}><{pattern_tag}>{}</{pattern_tag}>",
            escape_text(pattern)
        );
        if let Some(limit) = limit {
            let limit_tag = self.qualified(&LIMIT);
            criteria.push_str(&format!("<{limit_tag}>{limit}</{limit_tag}>"));
        }
        criteria.push_str(&format!("</{search}>"));

        let body = format!(
            "{}{}{criteria}{}",
            self.open_root(&names::SEARCH_FILES),
            self.render_prop(properties),
            self.close(&names::SEARCH_FILES)
        );
        DavRequest::new(Verb::Report, path).with_xml_body(body)
    }

    /// Builds an `oc:filter-files` report.
    #[must_use]
    pub fn filter_files(
        &self,
        path: &str,
        filter: &FileFilter,
        properties: &[PropertyName],
    ) -> DavRequest {
        let rules = self.qualified(&FILTER_RULES);
        let mut criteria = format!("<{rules}>");
        match filter {
            FileFilter::Favorites => {
                let favorite = self.qualified(&names::FAVORITE);
                criteria.push_str(&format!("<{favorite}>1</{favorite}>"));
            }
            FileFilter::Tags(tags) => {
                let systemtag = self.qualified(&SYSTEMTAG);
                for tag in tags {
                    criteria.push_str(&format!(
                        "<{systemtag}>{}</{systemtag}>",
                        escape_text(tag)
                    ));
                }
            }
        }
        criteria.push_str(&format!("</{rules}>"));

        let body = format!(
            "{}{}{criteria}{}",
            self.open_root(&names::FILTER_FILES),
            self.render_prop(properties),
            self.close(&names::FILTER_FILES)
        );
        DavRequest::new(Verb::Report, path).with_xml_body(body)
    }
}

/// Builds a `MOVE` request.
///
/// `destination` must be an absolute, URL-encoded URL.
///
/// # Errors
///
/// If `destination` cannot be used as a header value.
pub fn move_to(
    path: &str,
    destination: &str,
    overwrite: bool,
) -> Result<DavRequest, InvalidHeaderValue> {
    transfer(Verb::Move, path, destination, overwrite)
}

/// Builds a `COPY` request.
///
/// `destination` must be an absolute, URL-encoded URL.
///
/// # Errors
///
/// If `destination` cannot be used as a header value.
pub fn copy_to(
    path: &str,
    destination: &str,
    overwrite: bool,
) -> Result<DavRequest, InvalidHeaderValue> {
    transfer(Verb::Copy, path, destination, overwrite)
}

fn transfer(
    verb: Verb,
    path: &str,
    destination: &str,
    overwrite: bool,
) -> Result<DavRequest, InvalidHeaderValue> {
    let mut request = DavRequest::new(verb, path);
    request
        .headers
        .insert(DESTINATION, HeaderValue::from_str(destination)?);
    request.headers.insert(
        OVERWRITE,
        HeaderValue::from_static(if overwrite { "T" } else { "F" }),
    );
    Ok(request)
}

/// Builds a `DELETE` request.
#[must_use]
pub fn delete(path: &str) -> DavRequest {
    DavRequest::new(Verb::Delete, path)
}

const PROPFIND: PropertyName = PropertyName::from_static(DAV, "propfind");
const PROPERTYUPDATE: PropertyName = PropertyName::from_static(DAV, "propertyupdate");
const MKCOL: PropertyName = PropertyName::from_static(DAV, "mkcol");
const SET: PropertyName = PropertyName::from_static(DAV, "set");
const REMOVE: PropertyName = PropertyName::from_static(DAV, "remove");
const SEARCH: PropertyName = PropertyName::from_static(OWNCLOUD, "search");
const PATTERN: PropertyName = PropertyName::from_static(OWNCLOUD, "pattern");
const LIMIT: PropertyName = PropertyName::from_static(OWNCLOUD, "limit");
const FILTER_RULES: PropertyName = PropertyName::from_static(OWNCLOUD, "filter-rules");
const SYSTEMTAG: PropertyName = PropertyName::from_static(OWNCLOUD, "systemtag");

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;
    use http::{HeaderMap, HeaderValue};

    use super::{copy_to, delete, move_to, Depth, FileFilter, PropertyUpdate, RequestBuilder, Verb};
    use crate::clark::PropertyName;
    use crate::names::{FAVORITE, GETCONTENTLENGTH, GETETAG, RESOURCETYPE};
    use crate::namespaces::NamespaceTable;
    use crate::xml::{parse, XmlNode};

    const DECLARATIONS: &str = r#"xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns" xmlns:nc="http://nextcloud.org/ns" xmlns:ocs="http://open-collaboration-services.org/ns" xmlns:s="http://sabredav.org/ns""#;

    #[test]
    fn test_propfind() {
        let table = NamespaceTable::default();
        let request = RequestBuilder::new(&table).propfind(
            "/files/",
            &[GETETAG, FAVORITE, PropertyName::from_static("urn:custom", "colour")],
            Depth::One,
        );

        assert_eq!(request.verb, Verb::Propfind);
        assert_eq!(request.path, "/files/");
        assert_eq!(request.headers.get("Depth").unwrap(), "1");
        assert_eq!(
            request.headers.get(CONTENT_TYPE).unwrap(),
            "application/xml; charset=utf-8"
        );
        assert_eq!(
            request.body.unwrap(),
            format!(
                "<?xml version=\"1.0\"?>\n<d:propfind {DECLARATIONS}><d:prop><d:getetag/><oc:favorite/><x:colour xmlns:x=\"urn:custom\"/></d:prop></d:propfind>"
            )
        );
    }

    #[test]
    fn test_propfind_without_properties() {
        let table = NamespaceTable::default();
        let request = RequestBuilder::new(&table).propfind("/", &[], Depth::Infinity);

        assert_eq!(request.headers.get("Depth").unwrap(), "infinity");
        assert!(request.body.unwrap().contains("<d:prop/>"));
    }

    #[test]
    fn test_propfind_roundtrip() {
        let table = NamespaceTable::default();
        let properties = [RESOURCETYPE, GETCONTENTLENGTH, FAVORITE, GETETAG];
        let request = RequestBuilder::new(&table).propfind("/", &properties, Depth::Zero);

        let parsed = parse(&request.body.unwrap(), Some(&table)).unwrap();
        let prop = parsed
            .get("{DAV:}propfind")
            .and_then(|propfind| propfind.get("{DAV:}prop"))
            .unwrap();
        let keys = prop.children().map(|(key, _)| key).collect::<Vec<_>>();

        assert_eq!(
            keys,
            properties
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        );
        assert!(prop.children().all(|(_, node)| node.is_empty()));
    }

    #[test]
    fn test_builder_adds_missing_namespaces() {
        let table = NamespaceTable::new().with("d", "urn:not-dav");
        let builder = RequestBuilder::new(&table);
        assert_eq!(builder.namespaces().prefix_for("DAV:"), Some("d1"));
        assert_eq!(
            builder.namespaces().prefix_for("http://owncloud.org/ns"),
            Some("oc")
        );

        let request = builder.propfind("/", &[GETETAG], Depth::Zero);
        let parsed = parse(&request.body.unwrap(), Some(&NamespaceTable::new())).unwrap();
        assert!(parsed.get("{DAV:}propfind").is_some());
    }

    #[test]
    fn test_proppatch_escapes_values() {
        let table = NamespaceTable::default();
        let update = PropertyUpdate::new()
            .set(FAVORITE, "1")
            .set(
                PropertyName::from_static("DAV:", "displayname"),
                r#"<b>"Tom" & 'Jerry'</b>"#,
            )
            .set(RESOURCETYPE, "<d:collection/>")
            .remove(PropertyName::from_static("urn:custom", "colour"));
        let request = RequestBuilder::new(&table).proppatch("/a.txt", &update);

        assert_eq!(request.verb, Verb::Proppatch);
        assert!(request.headers.get("Depth").is_none());
        assert_eq!(
            request.body.unwrap(),
            format!(
                "<?xml version=\"1.0\"?>\n<d:propertyupdate {DECLARATIONS}><d:set><d:prop><oc:favorite>1</oc:favorite><d:displayname>&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;</d:displayname><d:resourcetype><d:collection/></d:resourcetype></d:prop></d:set><d:remove><d:prop><x:colour xmlns:x=\"urn:custom\"/></d:prop></d:remove></d:propertyupdate>"
            )
        );
    }

    #[test]
    fn test_mkcol() {
        let table = NamespaceTable::default();
        let builder = RequestBuilder::new(&table);

        let plain = builder.mkcol("/new/", &[]);
        assert_eq!(plain.verb, Verb::Mkcol);
        assert!(plain.body.is_none());
        assert!(plain.headers.is_empty());

        let extended = builder.mkcol("/new/", &[(FAVORITE, "1".to_string())]);
        let body = extended.body.unwrap();
        assert!(body.contains("<d:mkcol "));
        assert!(body.contains("<d:set><d:prop><oc:favorite>1</oc:favorite></d:prop></d:set>"));
        assert_eq!(
            extended.headers.get(CONTENT_TYPE).unwrap(),
            "application/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_search_files() {
        let table = NamespaceTable::default();
        let request =
            RequestBuilder::new(&table).search_files("/", "a&b", Some(30), &[GETETAG]);

        assert_eq!(request.verb, Verb::Report);
        let body = request.body.unwrap();
        assert!(body.contains("<oc:search-files "));
        assert!(body.ends_with(
            "<d:prop><d:getetag/></d:prop><oc:search><oc:pattern>a&amp;b</oc:pattern><oc:limit>30</oc:limit></oc:search></oc:search-files>"
        ));
    }

    #[test]
    fn test_filter_files() {
        let table = NamespaceTable::default();
        let builder = RequestBuilder::new(&table);

        let favorites = builder.filter_files("/", &FileFilter::Favorites, &[]);
        assert!(favorites.body.unwrap().ends_with(
            "<d:prop/><oc:filter-rules><oc:favorite>1</oc:favorite></oc:filter-rules></oc:filter-files>"
        ));

        let tags = builder.filter_files(
            "/",
            &FileFilter::Tags(vec!["12".into(), "13".into()]),
            &[GETETAG],
        );
        let body = tags.body.unwrap();
        assert!(body.ends_with(
            "<oc:filter-rules><oc:systemtag>12</oc:systemtag><oc:systemtag>13</oc:systemtag></oc:filter-rules></oc:filter-files>"
        ));

        let parsed = parse(&body, Some(&table)).unwrap();
        let rules = parsed
            .get("{http://owncloud.org/ns}filter-files")
            .and_then(|f| f.get("{http://owncloud.org/ns}filter-rules"))
            .unwrap();
        assert_eq!(
            rules.get("{http://owncloud.org/ns}systemtag"),
            Some(&XmlNode::Sequence(vec![
                XmlNode::Text("12".into()),
                XmlNode::Text("13".into())
            ]))
        );
    }

    #[test]
    fn test_move_copy_delete() {
        let moved = move_to("/a.txt", "https://example.com/remote.php/webdav/b.txt", true).unwrap();
        assert_eq!(moved.verb, Verb::Move);
        assert_eq!(
            moved.headers.get("Destination").unwrap(),
            "https://example.com/remote.php/webdav/b.txt"
        );
        assert_eq!(moved.headers.get("Overwrite").unwrap(), "T");
        assert!(moved.body.is_none());

        let copied = copy_to("/a.txt", "https://example.com/b.txt", false).unwrap();
        assert_eq!(copied.verb, Verb::Copy);
        assert_eq!(copied.headers.get("Overwrite").unwrap(), "F");

        copy_to("/a.txt", "https://example.com/\nb.txt", false).unwrap_err();

        let deleted = delete("/a.txt");
        assert_eq!(deleted.verb, Verb::Delete);
        assert!(deleted.body.is_none());
    }

    #[test]
    fn test_extra_headers_override() {
        let table = NamespaceTable::default();
        let mut extra = HeaderMap::new();
        extra.insert("Depth", HeaderValue::from_static("0"));
        extra.insert("X-Request-Id", HeaderValue::from_static("abc"));

        let request = RequestBuilder::new(&table)
            .propfind("/", &[], Depth::Infinity)
            .with_headers(&extra);

        assert_eq!(request.headers.get("Depth").unwrap(), "0");
        assert_eq!(request.headers.get_all("Depth").iter().count(), 1);
        assert_eq!(request.headers.get("X-Request-Id").unwrap(), "abc");
    }
}
