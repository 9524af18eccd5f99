// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Sending requests over the network.

use async_trait::async_trait;
use http::{HeaderMap, Request, StatusCode, Uri};
use hyper::{body::Bytes, client::HttpConnector, Body, Client};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};

use crate::auth::{Auth, AuthError, AuthExt};
use crate::request::DavRequest;

/// A response as returned by the server, before any interpretation.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("http error executing request")]
    Network(#[from] hyper::Error),

    #[error("failed to build request with the given input")]
    InvalidInput(#[from] http::Error),

    #[error("internal error with specified authentication")]
    Auth(#[from] AuthError),

    #[error("transport failure: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Sends requests to a server.
///
/// Implementations are responsible for authentication. They must not interpret the response
/// status; any response that was received is returned as-is.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` to `url`.
    ///
    /// # Errors
    ///
    /// If the request could not be sent or no response was received.
    async fn send(&self, url: Uri, request: DavRequest) -> Result<RawResponse, TransportError>;
}

/// A [`Transport`] backed by a `hyper` client.
#[derive(Debug, Clone)]
pub struct HyperTransport {
    auth: Auth,
    http_client: Client<HttpsConnector<HttpConnector>>,
}

impl HyperTransport {
    /// Builds a new transport for a server.
    ///
    /// Only `https` is enabled by default. Plain-text `http` is only enabled if the
    /// input uri has a scheme of `http`.
    #[must_use]
    pub fn new(base_url: &Uri, auth: Auth) -> HyperTransport {
        let builder = HttpsConnectorBuilder::new().with_native_roots();
        let builder = match base_url.scheme() {
            Some(scheme) if scheme.as_str() == "http" => builder.https_or_http(),
            _ => builder.https_only(),
        };

        let https = builder.enable_http1().build();
        HyperTransport {
            auth,
            http_client: Client::builder().build(https),
        }
    }
}

#[async_trait]
impl Transport for HyperTransport {
    async fn send(&self, url: Uri, request: DavRequest) -> Result<RawResponse, TransportError> {
        let mut builder = Request::builder()
            .authenticate(&self.auth)?
            .method(request.verb.as_str())
            .uri(url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        let body = match request.body {
            Some(body) => Body::from(body),
            None => Body::empty(),
        };

        let response = self.http_client.request(builder.body(body)?).await?;
        let (head, body) = response.into_parts();
        let body = hyper::body::to_bytes(body).await?;

        Ok(RawResponse {
            status: head.status,
            headers: head.headers,
            body,
        })
    }
}
