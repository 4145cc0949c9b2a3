//! Content codings the client can undo.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

use crate::error::Error;

/// A supported content coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCoding {
    Gzip,
    Deflate,
    Identity,
}

impl ContentCoding {
    /// Matches a coding token as it appears in `Content-Encoding` or
    /// `Transfer-Encoding`, ignoring case and surrounding whitespace.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.eq_ignore_ascii_case("gzip") || token.eq_ignore_ascii_case("x-gzip") {
            Some(ContentCoding::Gzip)
        } else if token.eq_ignore_ascii_case("deflate") {
            Some(ContentCoding::Deflate)
        } else if token.eq_ignore_ascii_case("identity") {
            Some(ContentCoding::Identity)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCoding::Gzip => "gzip",
            ContentCoding::Deflate => "deflate",
            ContentCoding::Identity => "identity",
        }
    }

    /// Undoes the coding. An empty body stays empty whatever the coding
    /// (204, 304 and HEAD responses keep the headers of a full one).
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        match self {
            ContentCoding::Gzip => read_all(GzDecoder::new(bytes), "gzip"),
            // Servers disagree on whether "deflate" carries the zlib wrapper.
            ContentCoding::Deflate => read_all(ZlibDecoder::new(bytes), "deflate")
                .or_else(|_| read_all(DeflateDecoder::new(bytes), "deflate")),
            ContentCoding::Identity => Ok(bytes.to_vec()),
        }
    }
}

fn read_all(mut decoder: impl Read, coding: &'static str) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|source| Error::Decode { coding, source })?;
    Ok(out)
}

/// The set of codings advertised in `Accept-Encoding` and accepted when
/// decoding a response body.
#[derive(Debug, Clone)]
pub struct CodingRegistry {
    codings: Vec<ContentCoding>,
}

impl Default for CodingRegistry {
    fn default() -> Self {
        Self {
            codings: vec![ContentCoding::Gzip, ContentCoding::Deflate],
        }
    }
}

impl CodingRegistry {
    pub fn new(codings: Vec<ContentCoding>) -> Self {
        Self { codings }
    }

    pub fn advertised_tokens(&self) -> Vec<&'static str> {
        self.codings.iter().map(ContentCoding::as_str).collect()
    }

    /// `Accept-Encoding` value listing every advertised coding at q=1.
    pub fn accept_encoding(&self) -> String {
        self.codings
            .iter()
            .map(|c| format!("{}; q=1", c.as_str()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Undoes one coding. `identity` is always accepted.
    pub fn decode(&self, token: &str, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        match ContentCoding::from_token(token) {
            Some(ContentCoding::Identity) => Ok(bytes.to_vec()),
            Some(coding) if self.codings.contains(&coding) => coding.decode(bytes),
            _ => Err(Error::UnsupportedEncoding(token.trim().to_string())),
        }
    }
}
