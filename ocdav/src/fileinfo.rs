// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! A read-only view over the properties of a single resource.

use chrono::{DateTime, FixedOffset};
use log::debug;

use crate::clark::PropertyName;
use crate::multistatus::{PropertyMap, PropertyValue, Response};
use crate::names::{
    COLLECTION, DIRECTORY_CONTENT_TYPE, FAVORITE, FILE_ID, GETCONTENTLENGTH, GETCONTENTTYPE,
    GETETAG, GETLASTMODIFIED, PERMISSIONS, RESOURCETYPE, SIZE, TAGS,
};
use crate::xmlutils::{href_path, unquote_href};

/// Kind of resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Dir,
}

/// Details of a single file or directory.
///
/// Built from the first `200` group of a [`Response`]. Properties that the server reported with
/// any other status are treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    href: String,
    segments: Vec<String>,
    file_type: FileType,
    properties: PropertyMap,
}

impl FileInfo {
    /// Builds a descriptor from a multistatus response.
    ///
    /// The href is percent-decoded, and its first `left_trim_components` non-empty segments are
    /// dropped. For example, with `2`, `/remote.php/webdav/Photos/bird.jpg` becomes
    /// `/Photos/bird.jpg`.
    #[must_use]
    pub fn from_response(response: &Response, left_trim_components: usize) -> Self {
        let properties = match response.ok_propstat() {
            Some(propstat) => propstat.properties.clone(),
            None => {
                debug!("no successful propstat for '{}'", response.href);
                PropertyMap::default()
            }
        };

        let file_type = match properties.get(&RESOURCETYPE) {
            Some(value) if value.contains_name(&COLLECTION) => FileType::Dir,
            _ => FileType::File,
        };

        let decoded = unquote_href(href_path(&response.href));
        let segments = decoded
            .split('/')
            .filter(|segment| !segment.is_empty())
            .skip(left_trim_components)
            .map(String::from)
            .collect();

        FileInfo {
            href: response.href.clone(),
            segments,
            file_type,
            properties,
        }
    }

    /// The href as sent by the server.
    #[must_use]
    pub fn href(&self) -> &str {
        &self.href
    }

    /// Last path segment. Empty for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Path of the parent directory, starting and ending with `/`.
    #[must_use]
    pub fn path(&self) -> String {
        match self.segments.split_last() {
            Some((_, parents)) if !parents.is_empty() => format!("/{}/", parents.join("/")),
            _ => String::from("/"),
        }
    }

    /// Logical path of this resource, e.g.: `/Photos/bird.jpg`.
    #[must_use]
    pub fn full_path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    #[must_use]
    pub fn file_type(&self) -> FileType {
        self.file_type
    }

    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Dir
    }

    /// Size in bytes.
    ///
    /// Directories usually report their size as `oc:size` rather than `getcontentlength`.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.text(&GETCONTENTLENGTH)
            .or_else(|| self.text(&SIZE))
            .and_then(|size| size.trim().parse().ok())
    }

    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.text(&GETETAG)
    }

    /// Content type. Always [`DIRECTORY_CONTENT_TYPE`] for directories.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        if self.is_dir() {
            Some(DIRECTORY_CONTENT_TYPE)
        } else {
            self.text(&GETCONTENTTYPE)
        }
    }

    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.text(&GETLASTMODIFIED)?;
        match DateTime::parse_from_rfc2822(raw) {
            Ok(date) => Some(date),
            Err(err) => {
                debug!("invalid getlastmodified '{raw}': {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn file_id(&self) -> Option<&str> {
        self.text(&FILE_ID)
    }

    #[must_use]
    pub fn is_favorite(&self) -> bool {
        self.text(&FAVORITE) == Some("1")
    }

    /// Permission letters, e.g.: `RDNVW`.
    #[must_use]
    pub fn permissions(&self) -> Option<&str> {
        self.text(&PERMISSIONS)
    }

    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        match self.properties.get(&TAGS) {
            Some(PropertyValue::Texts(tags)) => tags.iter().map(String::as_str).collect(),
            Some(PropertyValue::Text(tag)) if !tag.is_empty() => vec![tag.as_str()],
            _ => Vec::new(),
        }
    }

    /// Looks up any property, including vendor-specific ones.
    #[must_use]
    pub fn property(&self, name: &PropertyName) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    #[must_use]
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn text(&self, name: &PropertyName) -> Option<&str> {
        self.properties
            .get_text(name)
            .filter(|text| !text.is_empty())
    }
}
