// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Names of common dav properties and elements.

use crate::clark::PropertyName;

/// Namespace for properties defined in the WebDav specifications.
pub const DAV: &str = "DAV:";
/// Namespace for ownCloud-specific properties.
pub const OWNCLOUD: &str = "http://owncloud.org/ns";
/// Namespace for Nextcloud-specific properties.
pub const NEXTCLOUD: &str = "http://nextcloud.org/ns";
/// Namespace for Open Collaboration Services properties.
pub const OCS: &str = "http://open-collaboration-services.org/ns";
/// Namespace used by sabre/dav for error details.
pub const SABRE: &str = "http://sabredav.org/ns";

/// Content type reported for collections, regardless of what the server says.
pub const DIRECTORY_CONTENT_TYPE: &str = "httpd/unix-directory";

pub const MULTISTATUS: PropertyName = PropertyName::from_static(DAV, "multistatus");
pub const RESPONSE: PropertyName = PropertyName::from_static(DAV, "response");
pub const HREF: PropertyName = PropertyName::from_static(DAV, "href");
pub const PROPSTAT: PropertyName = PropertyName::from_static(DAV, "propstat");
pub const PROP: PropertyName = PropertyName::from_static(DAV, "prop");
pub const STATUS: PropertyName = PropertyName::from_static(DAV, "status");
pub const ERROR: PropertyName = PropertyName::from_static(DAV, "error");

pub const COLLECTION: PropertyName = PropertyName::from_static(DAV, "collection");
pub const RESOURCETYPE: PropertyName = PropertyName::from_static(DAV, "resourcetype");
pub const DISPLAY_NAME: PropertyName = PropertyName::from_static(DAV, "displayname");
pub const GETCONTENTLENGTH: PropertyName = PropertyName::from_static(DAV, "getcontentlength");
pub const GETCONTENTTYPE: PropertyName = PropertyName::from_static(DAV, "getcontenttype");
pub const GETETAG: PropertyName = PropertyName::from_static(DAV, "getetag");
pub const GETLASTMODIFIED: PropertyName = PropertyName::from_static(DAV, "getlastmodified");
/// Defined in <https://www.rfc-editor.org/rfc/rfc4331#section-3>
pub const QUOTA_USED_BYTES: PropertyName = PropertyName::from_static(DAV, "quota-used-bytes");
/// Defined in <https://www.rfc-editor.org/rfc/rfc4331#section-3>
pub const QUOTA_AVAILABLE_BYTES: PropertyName =
    PropertyName::from_static(DAV, "quota-available-bytes");

pub const FILE_ID: PropertyName = PropertyName::from_static(OWNCLOUD, "fileid");
pub const FAVORITE: PropertyName = PropertyName::from_static(OWNCLOUD, "favorite");
/// Size of a file or the recursive size of a folder.
pub const SIZE: PropertyName = PropertyName::from_static(OWNCLOUD, "size");
pub const PERMISSIONS: PropertyName = PropertyName::from_static(OWNCLOUD, "permissions");
pub const TAGS: PropertyName = PropertyName::from_static(OWNCLOUD, "tags");
pub const SHARE_TYPES: PropertyName = PropertyName::from_static(OWNCLOUD, "share-types");
pub const CHECKSUMS: PropertyName = PropertyName::from_static(OWNCLOUD, "checksums");
pub const OWNER_ID: PropertyName = PropertyName::from_static(OWNCLOUD, "owner-id");
pub const OWNER_DISPLAY_NAME: PropertyName =
    PropertyName::from_static(OWNCLOUD, "owner-display-name");
pub const PRIVATE_LINK: PropertyName = PropertyName::from_static(OWNCLOUD, "privatelink");
pub const TRASHBIN_ORIGINAL_FILENAME: PropertyName =
    PropertyName::from_static(OWNCLOUD, "trashbin-original-filename");
pub const TRASHBIN_ORIGINAL_LOCATION: PropertyName =
    PropertyName::from_static(OWNCLOUD, "trashbin-original-location");
pub const TRASHBIN_DELETE_DATETIME: PropertyName =
    PropertyName::from_static(OWNCLOUD, "trashbin-delete-datetime");

pub const SEARCH_FILES: PropertyName = PropertyName::from_static(OWNCLOUD, "search-files");
pub const FILTER_FILES: PropertyName = PropertyName::from_static(OWNCLOUD, "filter-files");

/// Human readable error message in a `DAV:error` body.
pub const SABRE_MESSAGE: PropertyName = PropertyName::from_static(SABRE, "message");
pub const SABRE_EXCEPTION: PropertyName = PropertyName::from_static(SABRE, "exception");
