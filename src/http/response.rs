use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::http::headers::Headers;

/// Numeric HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const NO_CONTENT: StatusCode = StatusCode(204);
    pub const MOVED_PERMANENTLY: StatusCode = StatusCode(301);
    pub const FOUND: StatusCode = StatusCode(302);
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);
    pub const NOT_FOUND: StatusCode = StatusCode(404);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn new(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use herald::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::NOT_FOUND.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// The leading digit: 2 for success, 3 for redirection and so on.
    pub fn class(&self) -> u16 {
        self.0 / 100
    }

    pub fn is_success(&self) -> bool {
        self.class() == 2
    }

    pub fn is_redirection(&self) -> bool {
        self.class() == 3
    }

    /// Returns the standard reason phrase, or an empty string for codes
    /// without one.
    ///
    /// # Example
    ///
    /// ```
    /// # use herald::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::new(299).reason_phrase(), "");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            100 => "Continue",
            200 => "OK",
            201 => "Created",
            202 => "Accepted",
            204 => "No Content",
            206 => "Partial Content",
            301 => "Moved Permanently",
            302 => "Found",
            303 => "See Other",
            304 => "Not Modified",
            307 => "Temporary Redirect",
            308 => "Permanent Redirect",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            408 => "Request Timeout",
            429 => "Too Many Requests",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            504 => "Gateway Timeout",
            _ => "",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete HTTP response received from a server.
///
/// Status and headers are fixed once the response is built. Only the body
/// may be replaced, and only by the decode stage when undoing content
/// codings.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: String,
    version: String,
    headers: Headers,
    body: Bytes,
}

impl Response {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Reason phrase as sent by the server.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Character encoding named by the `charset` parameter of
    /// `Content-Type`, UTF-8 when absent or unknown.
    pub fn charset(&self) -> &'static Encoding {
        self.header("Content-Type")
            .and_then(|value| {
                value.split(';').skip(1).find_map(|param| {
                    let (name, label) = param.split_once('=')?;
                    name.trim()
                        .eq_ignore_ascii_case("charset")
                        .then(|| label.trim().trim_matches('"'))
                })
            })
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8)
    }

    /// Body decoded with its [`charset`](Self::charset); malformed
    /// sequences are replaced.
    pub fn text(&self) -> Cow<'_, str> {
        let (text, _) = self.charset().decode_without_bom_handling(&self.body);
        text
    }

    /// Deserializes the decoded body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        Ok(serde_json::from_str(&self.text())?)
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }

    pub(crate) fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }
}

/// Builder for constructing responses in a fluent style.
///
/// # Example
///
/// ```
/// # use herald::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::FOUND)
///     .header("Location", "/elsewhere")
///     .build();
/// assert!(response.is_redirect());
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    reason: Option<String>,
    version: String,
    headers: Headers,
    body: Bytes,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            version: "HTTP/1.1".to_string(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Appends a header; repeated names keep every value.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the final Response. The reason phrase defaults to the
    /// standard one for the status code.
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            reason: self
                .reason
                .unwrap_or_else(|| self.status.reason_phrase().to_string()),
            version: self.version,
            headers: self.headers,
            body: self.body,
        }
    }
}
