// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Authentication-related types.

use base64::{prelude::BASE64_STANDARD, write::EncoderWriter};
use core::fmt;
use http::{header::InvalidHeaderValue, request::Builder, HeaderValue};
use std::io::Write;

/// Wrapper around a [`String`] that is not printed when debugging.
///
/// # Examples
///
/// ```
/// # use ocdav::auth::Password;
/// let p1 = Password::from("secret");
/// let p2 = String::from("secret").into();
///
/// assert_eq!(p1, p2);
/// ```
///
/// # Display
///
/// The [`core::fmt::Display`] trait is intentionally not implemented. Use either
/// [`Password::into_string`] or [`Password::as_str()`].
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<REDACTED>")
    }
}

impl<S> From<S> for Password
where
    String: From<S>,
{
    fn from(value: S) -> Self {
        Password(String::from(value))
    }
}

#[allow(clippy::from_over_into)] // `From<Password> for String` is not feasible.
impl Into<String> for Password {
    /// Returns the underlying string.
    fn into(self) -> String {
        self.0
    }
}

impl Password {
    /// Returns the underlying string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns a reference to the underlying string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Authentication schemes supported by [`HyperTransport`](crate::transport::HyperTransport).
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum Auth {
    None,
    Basic {
        username: String,
        password: Option<Password>,
    },
    /// OAuth2 access token or app token.
    Bearer { token: Password },
}

/// Internal error resolving authentication.
///
/// This error is returned when there is an internal error handling authentication (e.g.: the input
/// is invalid). It IS NOT returned when authentication was rejected by the server.
#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("error encoding credentials")]
    Encoding(#[from] std::io::Error),

    #[error("credentials cannot be used as a header value")]
    InvalidHeader(#[from] InvalidHeaderValue),
}

pub(crate) trait AuthExt: Sized {
    /// Apply this authentication to an object.
    fn authenticate(self, auth: &Auth) -> Result<Self, AuthError>;
}

impl AuthExt for Builder {
    /// Apply this authentication to a request builder.
    fn authenticate(self, auth: &Auth) -> Result<Builder, AuthError> {
        match auth {
            Auth::None => Ok(self),
            Auth::Basic { username, password } => {
                let mut sequence = b"Basic ".to_vec();
                let mut encoder = EncoderWriter::new(sequence, &BASE64_STANDARD);
                if let Some(pwd) = password {
                    write!(encoder, "{username}:{}", pwd.0)?;
                } else {
                    write!(encoder, "{username}:")?;
                }
                sequence = encoder.finish()?;

                let mut header = HeaderValue::from_bytes(&sequence)?;
                header.set_sensitive(true);
                Ok(self.header(http::header::AUTHORIZATION, header))
            }
            Auth::Bearer { token } => {
                let mut header = HeaderValue::from_str(&format!("Bearer {}", token.as_str()))?;
                header.set_sensitive(true);
                Ok(self.header(http::header::AUTHORIZATION, header))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{header::AUTHORIZATION, Request};

    use super::{Auth, AuthExt, Password};

    fn authorization(auth: &Auth) -> Option<String> {
        let request = Request::builder()
            .uri("https://example.com/")
            .authenticate(auth)
            .unwrap()
            .body(())
            .unwrap();
        request
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().unwrap().to_string())
    }

    #[test]
    fn test_basic_auth() {
        let auth = Auth::Basic {
            username: "admin".into(),
            password: Some(Password::from("admin")),
        };
        assert_eq!(authorization(&auth).as_deref(), Some("Basic YWRtaW46YWRtaW4="));

        let without_password = Auth::Basic {
            username: "admin".into(),
            password: None,
        };
        assert_eq!(
            authorization(&without_password).as_deref(),
            Some("Basic YWRtaW46")
        );
    }

    #[test]
    fn test_bearer_and_none() {
        let auth = Auth::Bearer {
            token: Password::from("s3cr3t"),
        };
        assert_eq!(authorization(&auth).as_deref(), Some("Bearer s3cr3t"));
        assert_eq!(authorization(&Auth::None), None);

        let broken = Auth::Bearer {
            token: Password::from("line\nbreak"),
        };
        Request::builder().authenticate(&broken).unwrap_err();
    }

    #[test]
    fn test_password_is_redacted() {
        assert_eq!(format!("{:?}", Password::from("hunter2")), "<REDACTED>");
    }
}
