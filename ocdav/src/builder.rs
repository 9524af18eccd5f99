// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Step-by-step construction of a [`DavClient`].
//!
//! ```no_run
//! # use http::Uri;
//! # use ocdav::auth::{Auth, Password};
//! # use ocdav::DavClient;
//! let client = DavClient::builder()
//!     .with_uri(Uri::from_static("https://cloud.example.com"))
//!     .with_auth(Auth::Basic {
//!         username: "alice".into(),
//!         password: Some(Password::from("secret")),
//!     })
//!     .with_root("/remote.php/dav/files/alice")
//!     .build();
//! ```

use http::Uri;

use crate::auth::Auth;
use crate::dav::{DavClient, DEFAULT_ROOT};
use crate::namespaces::NamespaceTable;
use crate::transport::HyperTransport;

pub struct NeedsUri(pub(crate) ());
pub struct NeedsAuth {
    pub(crate) uri: Uri,
}
pub struct Ready {
    pub(crate) uri: Uri,
    pub(crate) auth: Auth,
    pub(crate) root: String,
    pub(crate) namespaces: NamespaceTable,
}

pub struct ClientBuilder<State> {
    pub(crate) state: State,
}

impl ClientBuilder<NeedsUri> {
    pub(crate) fn new() -> ClientBuilder<NeedsUri> {
        ClientBuilder {
            state: NeedsUri(()),
        }
    }

    /// Sets the server's base URL.
    ///
    /// Plain-text `http` is only used if this URL has an `http` scheme.
    #[must_use]
    pub fn with_uri(self, uri: Uri) -> ClientBuilder<NeedsAuth> {
        ClientBuilder {
            state: NeedsAuth { uri },
        }
    }
}

impl ClientBuilder<NeedsAuth> {
    /// Sets the authentication type and credentials.
    #[must_use]
    pub fn with_auth(self, auth: Auth) -> ClientBuilder<Ready> {
        ClientBuilder {
            state: Ready {
                uri: self.state.uri,
                auth,
                root: DEFAULT_ROOT.to_string(),
                namespaces: NamespaceTable::default(),
            },
        }
    }
}

impl ClientBuilder<Ready> {
    /// Sets the path of the DAV endpoint. Defaults to [`DEFAULT_ROOT`].
    #[must_use]
    pub fn with_root<S: Into<String>>(mut self, root: S) -> Self {
        self.state.root = root.into();
        self
    }

    /// Sets the namespace table. Defaults to [`NamespaceTable::default`].
    #[must_use]
    pub fn with_namespaces(mut self, namespaces: NamespaceTable) -> Self {
        self.state.namespaces = namespaces;
        self
    }

    /// Builds the client.
    #[must_use]
    pub fn build(self) -> DavClient<HyperTransport> {
        let Ready {
            uri,
            auth,
            root,
            namespaces,
        } = self.state;
        let transport = HyperTransport::new(&uri, auth);
        DavClient::new(uri, transport)
            .with_root(root)
            .with_namespaces(namespaces)
    }
}
