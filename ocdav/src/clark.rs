// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Namespace-qualified names in Clark notation.
//!
//! A property such as `getetag` in the `DAV:` namespace is written as
//! `{DAV:}getetag`. Unlike the `prefix:local` form used on the wire, this
//! representation does not depend on the prefixes a given document chose to
//! declare, so it is used as the identity of properties throughout this crate.

use std::borrow::Cow;
use std::fmt;

/// A namespace-qualified XML name.
///
/// # Examples
///
/// ```
/// # use ocdav::clark::{parse_clark, PropertyName};
/// let favorite = PropertyName::from_static("http://owncloud.org/ns", "favorite");
///
/// assert_eq!(favorite.to_string(), "{http://owncloud.org/ns}favorite");
/// assert_eq!(parse_clark("{http://owncloud.org/ns}favorite"), Some(favorite));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyName {
    namespace: Cow<'static, str>,
    name: Cow<'static, str>,
}

impl PropertyName {
    /// Creates a name from static strings.
    ///
    /// Usable in `const` contexts; see [`crate::names`].
    #[must_use]
    pub const fn from_static(namespace: &'static str, name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a name from owned or borrowed strings.
    #[must_use]
    pub fn new<N, L>(namespace: N, name: L) -> Self
    where
        N: Into<Cow<'static, str>>,
        L: Into<Cow<'static, str>>,
    {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// The namespace URI.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.name)
    }
}

/// Parses a string in Clark notation.
///
/// Returns `None` for anything that is not of the form `{namespace}name` with a non-empty
/// namespace and a non-empty name. This is not an error condition: callers use it to tell
/// namespace-qualified keys apart from everything else.
#[must_use]
pub fn parse_clark(identifier: &str) -> Option<PropertyName> {
    let rest = identifier.strip_prefix('{')?;
    let (namespace, name) = rest.split_once('}')?;
    if namespace.is_empty() || name.is_empty() || name.contains(['{', '}']) {
        return None;
    }

    Some(PropertyName::new(namespace.to_string(), name.to_string()))
}

/// Renders a namespace and a local name in Clark notation.
#[must_use]
pub fn format_clark(namespace: &str, name: &str) -> String {
    format!("{{{namespace}}}{name}")
}

/// Splits a raw `prefix:local` XML name.
///
/// Returns `None` for unprefixed names, Clark names, and names with an empty prefix or local
/// part.
#[must_use]
pub fn split_qualified(qname: &str) -> Option<(&str, &str)> {
    if qname.starts_with('{') {
        return None;
    }
    let (prefix, local) = qname.split_once(':')?;
    if prefix.is_empty() || local.is_empty() || local.contains(':') {
        return None;
    }

    Some((prefix, local))
}

#[cfg(test)]
mod tests {
    use super::{format_clark, parse_clark, split_qualified, PropertyName};

    #[test]
    fn test_parse_clark_rejects_non_clark() {
        assert_eq!(parse_clark("invalid"), None);
        assert_eq!(parse_clark("{}invalid"), None);
        assert_eq!(parse_clark("42"), None);
        assert_eq!(parse_clark("true"), None);
        assert_eq!(parse_clark("{DAV:}"), None);
        assert_eq!(parse_clark("{DAV:getetag"), None);
        assert_eq!(parse_clark("DAV:}getetag"), None);
        assert_eq!(parse_clark(""), None);
    }

    #[test]
    fn test_parse_clark() {
        let parsed = parse_clark("{http://owncloud.org/ns}favorite").unwrap();
        assert_eq!(parsed.name(), "favorite");
        assert_eq!(parsed.namespace(), "http://owncloud.org/ns");

        // Stable for identical inputs.
        assert_eq!(
            parse_clark("{DAV:}getetag"),
            parse_clark("{DAV:}getetag"),
        );
    }

    #[test]
    fn test_format_roundtrip() {
        let name = PropertyName::from_static("DAV:", "resourcetype");
        let formatted = format_clark(name.namespace(), name.name());
        assert_eq!(formatted, "{DAV:}resourcetype");
        assert_eq!(formatted, name.to_string());
        assert_eq!(parse_clark(&formatted), Some(name));
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("d:getetag"), Some(("d", "getetag")));
        assert_eq!(split_qualified("getetag"), None);
        assert_eq!(split_qualified(":getetag"), None);
        assert_eq!(split_qualified("d:"), None);
        assert_eq!(split_qualified("{DAV:}getetag"), None);
    }
}
