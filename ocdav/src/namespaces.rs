// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Mapping between namespace URIs and the short prefixes used on the wire.

use crate::names::{DAV, NEXTCLOUD, OCS, OWNCLOUD, SABRE};

/// A bidirectional table of namespace prefixes.
///
/// Requests are rendered with these prefixes, and responses are interpreted with them when a
/// document uses a prefix without declaring it. A prefix maps to exactly one URI.
///
/// The table is built once and only read afterwards; clients share it behind an `Arc`.
///
/// ```
/// # use ocdav::namespaces::NamespaceTable;
/// let table = NamespaceTable::new()
///     .with("d", "DAV:")
///     .with("cont", "www.tutorialspoint.com/profile");
///
/// assert_eq!(table.uri_for("cont"), Some("www.tutorialspoint.com/profile"));
/// assert_eq!(table.prefix_for("DAV:"), Some("d"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTable {
    // (prefix, uri), in declaration order.
    entries: Vec<(String, String)>,
}

impl NamespaceTable {
    /// Returns an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns a table with an extra entry.
    ///
    /// Re-declaring an existing prefix replaces its URI.
    #[must_use]
    pub fn with<P: Into<String>, U: Into<String>>(mut self, prefix: P, uri: U) -> Self {
        let prefix = prefix.into();
        let uri = uri.into();
        match self.entries.iter_mut().find(|(p, _)| *p == prefix) {
            Some(entry) => entry.1 = uri,
            None => self.entries.push((prefix, uri)),
        }
        self
    }

    /// Returns the URI bound to `prefix`.
    #[must_use]
    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    /// Returns the first prefix bound to `uri`.
    #[must_use]
    pub fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, u)| u == uri)
            .map(|(prefix, _)| prefix.as_str())
    }

    /// Iterates over `(prefix, uri)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(prefix, uri)| (prefix.as_str(), uri.as_str()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for NamespaceTable {
    /// The table used by ownCloud and Nextcloud servers.
    fn default() -> Self {
        Self::new()
            .with("d", DAV)
            .with("oc", OWNCLOUD)
            .with("nc", NEXTCLOUD)
            .with("ocs", OCS)
            .with("s", SABRE)
    }
}
