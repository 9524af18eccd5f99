// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! WebDav client for file synchronisation servers.
//!
//! This implements the operations used by ownCloud and Nextcloud clients. It should not be
//! considered a general purpose webdav implementation.
use std::{io, str::Utf8Error, sync::Arc};

use http::{header::InvalidHeaderValue, uri::PathAndQuery, StatusCode, Uri};
use log::{debug, warn};

use crate::{
    builder::{ClientBuilder, NeedsUri},
    clark::PropertyName,
    fileinfo::FileInfo,
    multistatus::{parse_error_message, parse_multistatus, Response},
    names::{
        FAVORITE, FILE_ID, GETCONTENTLENGTH, GETCONTENTTYPE, GETETAG, GETLASTMODIFIED,
        PERMISSIONS, RESOURCETYPE, SIZE,
    },
    namespaces::NamespaceTable,
    request::{self, DavRequest, Depth, FileFilter, PropertyUpdate, RequestBuilder},
    transport::{HyperTransport, RawResponse, Transport, TransportError},
    xml,
    xmlutils::{href_path, quote_href, unquote_href},
};

/// Path of the files endpoint on ownCloud and Nextcloud servers.
pub const DEFAULT_ROOT: &str = "/remote.php/webdav";

/// Properties requested when the caller requests none.
pub const DEFAULT_PROPERTIES: &[PropertyName] = &[
    RESOURCETYPE,
    GETLASTMODIFIED,
    GETCONTENTLENGTH,
    GETCONTENTTYPE,
    GETETAG,
    FILE_ID,
    SIZE,
    PERMISSIONS,
    FAVORITE,
];

/// A generic error for WebDav operations.
#[derive(thiserror::Error, Debug)]
pub enum DavError {
    #[error("error sending request")]
    Transport(#[from] TransportError),

    #[error("failed to build URL with the given input")]
    InvalidInput(#[from] http::Error),

    #[error("destination is not a valid header value")]
    InvalidDestination(#[from] InvalidHeaderValue),

    #[error("could not parse XML response")]
    Xml(#[from] xml::Error),

    #[error("could not decode response as utf-8")]
    NotUtf8(#[from] Utf8Error),

    #[error("http request returned {status}")]
    BadStatusCode {
        status: StatusCode,
        /// Message from the server's error body, if any.
        message: Option<String>,
    },
}

impl From<DavError> for io::Error {
    fn from(value: DavError) -> Self {
        match value {
            DavError::Transport(_) => io::Error::new(io::ErrorKind::Other, value),
            DavError::InvalidInput(_) | DavError::InvalidDestination(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, value)
            }
            DavError::Xml(_) | DavError::NotUtf8(_) => {
                io::Error::new(io::ErrorKind::InvalidData, value)
            }
            DavError::BadStatusCode { status, .. } => match status {
                StatusCode::NOT_FOUND | StatusCode::GONE => {
                    io::Error::new(io::ErrorKind::NotFound, value)
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    io::Error::new(io::ErrorKind::PermissionDenied, value)
                }
                StatusCode::PRECONDITION_FAILED | StatusCode::METHOD_NOT_ALLOWED => {
                    io::Error::new(io::ErrorKind::AlreadyExists, value)
                }
                _ => io::Error::new(io::ErrorKind::Other, value),
            },
        }
    }
}

/// A webdav client for ownCloud and Nextcloud servers.
///
/// All paths taken by this client are logical paths relative to the DAV root (e.g.:
/// `/Photos/bird.jpg`), and are not URL-encoded.
///
/// The client holds no per-request state; it may be shared across tasks.
#[derive(Debug, Clone)]
pub struct DavClient<T = HyperTransport> {
    /// Base URL of the server, e.g.: `https://cloud.example.com/`.
    base_url: Uri,
    /// Path of the DAV endpoint, relative to `base_url`.
    root: String,
    namespaces: Arc<NamespaceTable>,
    transport: T,
}

impl DavClient<HyperTransport> {
    /// Returns a builder for a client using [`HyperTransport`].
    #[must_use]
    pub fn builder() -> ClientBuilder<NeedsUri> {
        ClientBuilder::new()
    }
}

impl<T: Transport> DavClient<T> {
    /// Builds a new client over a custom transport.
    ///
    /// Uses [`DEFAULT_ROOT`] and the default [`NamespaceTable`].
    pub fn new(base_url: Uri, transport: T) -> DavClient<T> {
        DavClient {
            base_url,
            root: DEFAULT_ROOT.to_string(),
            namespaces: Arc::new(NamespaceTable::default()),
            transport,
        }
    }

    /// Sets the path of the DAV endpoint.
    #[must_use]
    pub fn with_root<S: AsRef<str>>(mut self, root: S) -> Self {
        let root = root.as_ref().trim_matches('/');
        self.root = if root.is_empty() {
            String::new()
        } else {
            format!("/{root}")
        };
        self
    }

    /// Sets the namespace table used to render requests and interpret responses.
    #[must_use]
    pub fn with_namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.namespaces = Arc::new(namespaces);
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Uri {
        &self.base_url
    }

    #[must_use]
    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    /// Returns a request builder bound to this client's namespace table.
    #[must_use]
    pub fn request_builder(&self) -> RequestBuilder<'_> {
        RequestBuilder::new(&self.namespaces)
    }

    /// Absolute path of the DAV root on the server, e.g.: `/remote.php/webdav`. Not URL-encoded.
    fn root_path(&self) -> String {
        let base = unquote_href(self.base_url.path());
        format!("{}{}", base.trim_end_matches('/'), self.root)
    }

    /// Number of leading segments in hrefs that belong to the DAV root.
    fn left_trim_components(&self) -> usize {
        self.root_path()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .count()
    }

    /// Returns the URL for a logical path.
    ///
    /// # Errors
    ///
    /// If this client's `base_url` is invalid or the provided `path` is not an acceptable path.
    pub fn relative_uri<S: AsRef<str>>(&self, path: S) -> Result<Uri, http::Error> {
        let path = path.as_ref();
        let full = if path.starts_with('/') {
            format!("{}{path}", self.root_path())
        } else {
            format!("{}/{path}", self.root_path())
        };
        let href = quote_href(full.as_bytes());
        let mut parts = self.base_url.clone().into_parts();
        parts.path_and_query = Some(PathAndQuery::try_from(href.as_ref())?);
        Uri::from_parts(parts).map_err(http::Error::from)
    }

    /// Sends a request to the server and returns the raw response.
    ///
    /// The request path is resolved relative to the DAV root. The response status is not checked.
    ///
    /// # Errors
    ///
    /// If the URL cannot be built, or the transport fails.
    pub async fn request(&self, request: DavRequest) -> Result<RawResponse, DavError> {
        let url = self.relative_uri(&request.path)?;
        debug!("{} {}", request.verb, url);
        let response = self.transport.send(url, request).await?;

        debug!("Response ({}): {:?}", response.status, response.body);
        Ok(response)
    }

    /// Fails with [`DavError::BadStatusCode`] unless the response is successful.
    fn check_status(&self, response: &RawResponse) -> Result<(), DavError> {
        if response.status.is_success() {
            return Ok(());
        }

        let message = std::str::from_utf8(&response.body)
            .ok()
            .and_then(|body| parse_error_message(body, &self.namespaces));
        Err(DavError::BadStatusCode {
            status: response.status,
            message,
        })
    }

    /// Sends a request which is expected to return a multistatus.
    async fn multistatus(&self, request: DavRequest) -> Result<Vec<Response>, DavError> {
        let response = self.request(request).await?;
        self.check_status(&response)?;
        if response.status != StatusCode::MULTI_STATUS {
            warn!("expected multistatus, got {}", response.status);
        }

        let body = std::str::from_utf8(&response.body)?;
        Ok(parse_multistatus(body, &self.namespaces)?)
    }

    /// Converts responses into file details, dropping hrefs outside the DAV root.
    fn into_file_infos(&self, responses: &[Response]) -> Vec<FileInfo> {
        let root = self.root_path();
        let trim = self.left_trim_components();

        responses
            .iter()
            .filter(|response| {
                let path = unquote_href(href_path(&response.href));
                let inside = path == root || path.starts_with(&format!("{root}/"));
                if !inside {
                    debug!("dropping href outside of '{root}': {}", response.href);
                }
                inside
            })
            .map(|response| FileInfo::from_response(response, trim))
            .collect()
    }

    /// Sends a `PROPFIND` request and returns all responses.
    ///
    /// # Errors
    ///
    /// If there are any network errors, the server returns a non-success status, or the response
    /// could not be parsed.
    pub async fn propfind(
        &self,
        path: &str,
        properties: &[PropertyName],
        depth: Depth,
    ) -> Result<Vec<Response>, DavError> {
        let request = self.request_builder().propfind(path, properties, depth);
        self.multistatus(request).await
    }

    /// Lists a directory.
    ///
    /// The first entry describes the directory itself, followed by its children in the order
    /// returned by the server. If `properties` is empty, [`DEFAULT_PROPERTIES`] are requested.
    ///
    /// # Errors
    ///
    /// See [`DavClient::propfind`].
    pub async fn list(
        &self,
        path: &str,
        properties: &[PropertyName],
    ) -> Result<Vec<FileInfo>, DavError> {
        let responses = self
            .propfind(path, or_default(properties), Depth::One)
            .await?;
        Ok(self.into_file_infos(&responses))
    }

    /// Returns details of a single resource.
    ///
    /// # Errors
    ///
    /// See [`DavClient::propfind`].
    pub async fn file_info(
        &self,
        path: &str,
        properties: &[PropertyName],
    ) -> Result<Option<FileInfo>, DavError> {
        let responses = self
            .propfind(path, or_default(properties), Depth::Zero)
            .await?;
        Ok(self.into_file_infos(&responses).into_iter().next())
    }

    /// Sets or removes properties of a resource.
    ///
    /// # Errors
    ///
    /// If there are any network errors, or if the server rejects any of the changes.
    pub async fn proppatch(&self, path: &str, update: &PropertyUpdate) -> Result<(), DavError> {
        let request = self.request_builder().proppatch(path, update);
        let response = self.request(request).await?;
        self.check_status(&response)?;

        if response.status == StatusCode::MULTI_STATUS {
            let body = std::str::from_utf8(&response.body)?;
            for entry in parse_multistatus(body, &self.namespaces)? {
                for propstat in &entry.propstats {
                    match propstat.status_code() {
                        Ok(status) if status.is_success() => {}
                        Ok(status) => {
                            return Err(DavError::BadStatusCode {
                                status,
                                message: None,
                            })
                        }
                        Err(_) => warn!("invalid propstat status: {:?}", propstat.status),
                    }
                }
            }
        }
        Ok(())
    }

    /// Marks or unmarks a resource as favourite.
    ///
    /// # Errors
    ///
    /// See [`DavClient::proppatch`].
    pub async fn set_favorite(&self, path: &str, favorite: bool) -> Result<(), DavError> {
        let update = PropertyUpdate::new().set(FAVORITE, if favorite { "1" } else { "0" });
        self.proppatch(path, &update).await
    }

    /// Creates a collection, setting the given properties on creation.
    ///
    /// # Errors
    ///
    /// If there are any network errors or the server returns a non-success status.
    pub async fn mkcol(
        &self,
        path: &str,
        properties: &[(PropertyName, String)],
    ) -> Result<(), DavError> {
        let request = self.request_builder().mkcol(path, properties);
        let response = self.request(request).await?;
        self.check_status(&response)
    }

    /// Creates a folder.
    ///
    /// # Errors
    ///
    /// See [`DavClient::mkcol`].
    pub async fn create_folder(&self, path: &str) -> Result<(), DavError> {
        self.mkcol(path, &[]).await
    }

    /// Deletes a resource. Folders are deleted recursively.
    ///
    /// # Errors
    ///
    /// If there are any network errors or the server returns a non-success status.
    pub async fn delete(&self, path: &str) -> Result<(), DavError> {
        let response = self.request(request::delete(path)).await?;
        self.check_status(&response)
    }

    /// Moves a resource to another logical path.
    ///
    /// # Errors
    ///
    /// If there are any network errors or the server returns a non-success status.
    pub async fn move_resource(
        &self,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> Result<(), DavError> {
        let destination = self.relative_uri(to)?.to_string();
        let response = self
            .request(request::move_to(from, &destination, overwrite)?)
            .await?;
        self.check_status(&response)
    }

    /// Copies a resource to another logical path.
    ///
    /// # Errors
    ///
    /// If there are any network errors or the server returns a non-success status.
    pub async fn copy_resource(
        &self,
        from: &str,
        to: &str,
        overwrite: bool,
    ) -> Result<(), DavError> {
        let destination = self.relative_uri(to)?.to_string();
        let response = self
            .request(request::copy_to(from, &destination, overwrite)?)
            .await?;
        self.check_status(&response)
    }

    /// Searches files by name.
    ///
    /// # Errors
    ///
    /// See [`DavClient::propfind`].
    pub async fn search(
        &self,
        pattern: &str,
        limit: Option<u32>,
        properties: &[PropertyName],
    ) -> Result<Vec<FileInfo>, DavError> {
        let request =
            self.request_builder()
                .search_files("/", pattern, limit, or_default(properties));
        let responses = self.multistatus(request).await?;
        Ok(self.into_file_infos(&responses))
    }

    /// Returns all files marked as favourite.
    ///
    /// # Errors
    ///
    /// See [`DavClient::propfind`].
    pub async fn favorites(&self, properties: &[PropertyName]) -> Result<Vec<FileInfo>, DavError> {
        self.filter(&FileFilter::Favorites, properties).await
    }

    /// Returns all files carrying every one of the given system tag ids.
    ///
    /// # Errors
    ///
    /// See [`DavClient::propfind`].
    pub async fn files_by_tags(
        &self,
        tags: &[&str],
        properties: &[PropertyName],
    ) -> Result<Vec<FileInfo>, DavError> {
        let filter = FileFilter::Tags(tags.iter().map(ToString::to_string).collect());
        self.filter(&filter, properties).await
    }

    async fn filter(
        &self,
        filter: &FileFilter,
        properties: &[PropertyName],
    ) -> Result<Vec<FileInfo>, DavError> {
        let request = self
            .request_builder()
            .filter_files("/", filter, or_default(properties));
        let responses = self.multistatus(request).await?;
        Ok(self.into_file_infos(&responses))
    }
}

fn or_default(properties: &[PropertyName]) -> &[PropertyName] {
    if properties.is_empty() {
        DEFAULT_PROPERTIES
    } else {
        properties
    }
}
