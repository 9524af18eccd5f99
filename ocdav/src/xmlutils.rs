// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Utilities for rendering XML request data and interpreting bits of responses.
use std::borrow::Cow;
use std::fmt::Write;
use std::str::FromStr;

use http::status::InvalidStatusCode;
use http::StatusCode;
use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::clark::PropertyName;
use crate::namespaces::NamespaceTable;

/// Characters that are escaped for hrefs.
pub(crate) const DISALLOWED_FOR_HREF: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

/// Parses a status line string into a [`StatusCode`].
///
/// Example input string: `HTTP/1.1 200 OK`.
///
/// # See also
///
/// - The [status element](https://www.rfc-editor.org/rfc/rfc4918#section-14.28)
/// - [Status-Line](https://www.rfc-editor.org/rfc/rfc2068#section-6.1)
///
/// # Errors
///
/// If the input string does not match a status line.
pub fn parse_statusline<S: AsRef<str>>(status_line: S) -> Result<StatusCode, InvalidStatusCode> {
    let mut iter = status_line.as_ref().trim().splitn(3, ' ');
    iter.next();
    let code = iter.next().unwrap_or("");
    StatusCode::from_str(code)
}

/// Replaces characters that need to be escaped in texts and attribute values.
///
/// `<` --> `&lt;`
/// `>` --> `&gt;`
/// `&` --> `&amp;`
/// `"` --> `&quot;`
/// `'` --> `&apos;`
///
/// Borrows the input when nothing needs escaping.
#[must_use]
pub fn escape_text(raw: &str) -> Cow<str> {
    let Some(first) = raw.find(['<', '>', '&', '"', '\'']) else {
        return Cow::Borrowed(raw);
    };

    let mut escaped = String::with_capacity(raw.len() + 8);
    escaped.push_str(&raw[..first]);
    for c in raw[first..].chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// URL-encodes an href.
///
/// Obviously the input parameter MUST NOT be url-encoded.
pub(crate) fn quote_href(href: &[u8]) -> Cow<'_, str> {
    Cow::from(percent_encode(href, DISALLOWED_FOR_HREF))
}

/// Decodes a percent-encoded href.
///
/// Invalid UTF-8 sequences are replaced rather than rejected; hrefs are only used for display
/// and path arithmetic after this point.
pub(crate) fn unquote_href(href: &str) -> Cow<'_, str> {
    percent_decode_str(href).decode_utf8_lossy()
}

/// Returns the path portion of an href, which may be an absolute URL.
pub(crate) fn href_path(href: &str) -> &str {
    match href.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |start| &rest[start..]),
        None => href,
    }
}

/// Renders ` xmlns:prefix="uri"` for every entry in the table.
pub(crate) fn render_declarations(namespaces: &NamespaceTable) -> String {
    let mut rendered = String::new();
    for (prefix, uri) in namespaces.iter() {
        // Writing into a String cannot fail.
        let _ = write!(rendered, " xmlns:{prefix}=\"{}\"", escape_text(uri));
    }
    rendered
}

/// Picks a prefix for inline declarations that the table does not use.
fn free_prefix(namespaces: &NamespaceTable) -> String {
    let mut candidate = String::from("x");
    let mut counter = 0;
    while namespaces.uri_for(&candidate).is_some() {
        counter += 1;
        candidate = format!("x{counter}");
    }
    candidate
}

/// Render a property node with optional raw content.
///
/// The element uses the table's prefix for its namespace. Namespaces missing from the table are
/// declared inline on the element itself.
///
/// `content` is inserted as-is; callers must escape text with [`escape_text`].
pub(crate) fn render_property(
    name: &PropertyName,
    namespaces: &NamespaceTable,
    content: Option<&str>,
) -> String {
    let (qname, declaration) = match namespaces.prefix_for(name.namespace()) {
        Some(prefix) => (format!("{prefix}:{}", name.name()), String::new()),
        None => {
            let prefix = free_prefix(namespaces);
            let declaration = format!(" xmlns:{prefix}=\"{}\"", escape_text(name.namespace()));
            (format!("{prefix}:{}", name.name()), declaration)
        }
    };

    match content {
        None => format!("<{qname}{declaration}/>"),
        Some(content) => format!("<{qname}{declaration}>{content}</{qname}>"),
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use http::StatusCode;

    use super::{
        escape_text, href_path, parse_statusline, quote_href, render_property, unquote_href,
    };
    use crate::clark::PropertyName;
    use crate::namespaces::NamespaceTable;

    #[test]
    fn test_escape_text() {
        match escape_text("HELLO THERE") {
            Cow::Borrowed(s) => assert_eq!(s, "HELLO THERE"),
            Cow::Owned(_) => panic!("expected Borrowed, got Owned"),
        }
        match escape_text("HELLO <") {
            Cow::Borrowed(_) => panic!("expected Owned, got Borrowed"),
            Cow::Owned(s) => assert_eq!(s, "HELLO &lt;"),
        }
        assert_eq!(escape_text("HELLO &lt;"), "HELLO &amp;lt;");
        assert_eq!(escape_text(r#"a "b" 'c' >"#), "a &quot;b&quot; &apos;c&apos; &gt;");
        match escape_text("你吃过了吗？") {
            Cow::Borrowed(s) => assert_eq!(s, "你吃过了吗？"),
            Cow::Owned(_) => panic!("expected Borrowed, got Owned"),
        }
        assert_eq!(escape_text("日本<語>"), "日本&lt;語&gt;");
    }

    #[test]
    fn test_parse_statusline() {
        assert_eq!(parse_statusline("HTTP/1.1 200 OK").unwrap(), StatusCode::OK);
        assert_eq!(
            parse_statusline("HTTP/1.1 404 Not Found").unwrap(),
            StatusCode::NOT_FOUND
        );
        parse_statusline("garbage").unwrap_err();
        parse_statusline("").unwrap_err();
    }

    #[test]
    fn test_quote_and_unquote_href() {
        let quoted = quote_href("/remote.php/webdav/a folder/ünïcode.txt".as_bytes());
        assert_eq!(
            quoted,
            "/remote.php/webdav/a%20folder/%C3%BCn%C3%AFcode.txt"
        );
        assert_eq!(
            unquote_href(&quoted),
            "/remote.php/webdav/a folder/ünïcode.txt"
        );
    }

    #[test]
    fn test_href_path() {
        assert_eq!(href_path("/remote.php/webdav/a"), "/remote.php/webdav/a");
        assert_eq!(
            href_path("https://example.com:8080/remote.php/webdav/a"),
            "/remote.php/webdav/a"
        );
        assert_eq!(href_path("https://example.com"), "/");
    }

    #[test]
    fn test_render_property() {
        let table = NamespaceTable::default();
        let etag = PropertyName::from_static("DAV:", "getetag");
        assert_eq!(render_property(&etag, &table, None), "<d:getetag/>");

        let favorite = PropertyName::from_static("http://owncloud.org/ns", "favorite");
        assert_eq!(
            render_property(&favorite, &table, Some("1")),
            "<oc:favorite>1</oc:favorite>"
        );

        let custom = PropertyName::from_static("urn:custom", "colour");
        assert_eq!(
            render_property(&custom, &table, None),
            r#"<x:colour xmlns:x="urn:custom"/>"#
        );

        let taken = NamespaceTable::new().with("x", "urn:other");
        assert_eq!(
            render_property(&custom, &taken, Some("red")),
            r#"<x1:colour xmlns:x1="urn:custom">red</x1:colour>"#
        );
    }
}
