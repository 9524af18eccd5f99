// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! This library contains the WebDav protocol layer of a file synchronisation client.
//!
//! The lower layers are pure functions over text, and can be used on their own:
//!
//! - [`xml`] parses XML into an ordered tree, optionally resolving names into Clark notation.
//! - [`clark`] handles `{namespace}name` identifiers.
//! - [`request`] renders request bodies and headers for each WebDav verb.
//! - [`multistatus`] interprets `multistatus` responses.
//! - [`fileinfo`] exposes typed details of a single resource.
//!
//! [`DavClient`] ties these together with a [`Transport`](transport::Transport), and is a useful
//! entry point for most uses.
//!
//! # Logging
//!
//! All logging is done via the `log` facade. Responses are logged at `debug` level.

pub mod auth;
pub mod builder;
pub mod clark;
pub mod dav;
pub mod fileinfo;
pub mod multistatus;
pub mod names;
pub mod namespaces;
pub mod request;
pub mod transport;
pub mod xml;
pub mod xmlutils;

pub use auth::{Auth, AuthError};
pub use clark::PropertyName;
pub use dav::{DavClient, DavError};
pub use fileinfo::{FileInfo, FileType};
pub use namespaces::NamespaceTable;
