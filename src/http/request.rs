use std::fmt;

use serde::Serialize;
use url::{Url, form_urlencoded};

use crate::error::Error;
use crate::http::headers::Headers;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// # Arguments
    ///
    /// * `s` - String representation of the method (case-sensitive, typically uppercase)
    ///
    /// # Returns
    ///
    /// `Some(Method)` if the string matches a known method, `None` otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// # use herald::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "HEAD" => Some(Method::HEAD),
            "OPTIONS" => Some(Method::OPTIONS),
            "PATCH" => Some(Method::PATCH),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username/password pair used to answer authentication challenges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// An outgoing HTTP request.
///
/// Owned by the caller for one logical call. Pipeline stages mutate it in
/// place: redirects rewrite `url`, decoding adds `Accept-Encoding`,
/// authentication sets `Authorization`.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Absolute target URL
    pub url: Url,
    /// Request headers
    pub headers: Headers,
    /// Request body, empty when there is none
    pub body: Vec<u8>,
    /// Credentials offered when the server answers with a challenge
    pub auth: Option<Credentials>,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            body: Vec::new(),
            auth: None,
        }
    }

    /// Retrieves a header value by name, case-insensitively.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Path and query as they appear on the request line.
    pub fn target(&self) -> String {
        let path = match self.url.path() {
            "" => "/",
            path => path,
        };
        match self.url.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        }
    }
}

/// Body supplied to a [`RequestBuilder`], with the `Content-Type` it implies.
#[derive(Debug)]
enum BodyKind {
    Raw(Vec<u8>),
    Json(Result<Vec<u8>, serde_json::Error>),
    Form(String),
}

/// Builder for constructing Request objects.
///
/// At most one of [`body`](Self::body), [`json`](Self::json) and
/// [`form`](Self::form) may be used.
#[derive(Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    url: Option<String>,
    query: Vec<(String, String)>,
    headers: Headers,
    body: Option<BodyKind>,
    conflicting_bodies: bool,
    auth: Option<Credentials>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Appends a query parameter to the URL, percent-encoded.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    pub fn body(self, body: impl Into<Vec<u8>>) -> Self {
        self.set_body(BodyKind::Raw(body.into()))
    }

    /// Serializes `value` as the JSON body, `application/json`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Self {
        self.set_body(BodyKind::Json(serde_json::to_vec(value)))
    }

    /// Encodes `pairs` as an `application/x-www-form-urlencoded` body.
    pub fn form<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.set_body(BodyKind::Form(encoded))
    }

    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some(Credentials::new(username, password));
        self
    }

    fn set_body(mut self, body: BodyKind) -> Self {
        if self.body.is_some() {
            self.conflicting_bodies = true;
        }
        self.body = Some(body);
        self
    }

    /// Builds the request; the method defaults to GET.
    ///
    /// JSON and form bodies set `Content-Type` unless a header already does.
    pub fn build(self) -> Result<Request, Error> {
        if self.conflicting_bodies {
            return Err(Error::InvalidRequest("only one of body, json or form may be set"));
        }
        let raw = self.url.ok_or(Error::InvalidRequest("url missing"))?;
        let mut url = Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        let mut headers = self.headers;
        let (body, content_type) = match self.body {
            None => (Vec::new(), None),
            Some(BodyKind::Raw(bytes)) => (bytes, None),
            Some(BodyKind::Json(bytes)) => (bytes?, Some("application/json")),
            Some(BodyKind::Form(encoded)) => (
                encoded.into_bytes(),
                Some("application/x-www-form-urlencoded"),
            ),
        };
        if let Some(content_type) = content_type {
            if !headers.contains("Content-Type") {
                headers.insert("Content-Type", content_type);
            }
        }

        Ok(Request {
            method: self.method.unwrap_or(Method::GET),
            url,
            headers,
            body,
            auth: self.auth,
        })
    }
}
