//! Error type shared by the transport, the parser and the pipeline.

use std::time::Duration;

use crate::http::parser::ParseError;

/// Errors surfaced by a request.
///
/// Expected protocol states (3xx, 401, exhausted budgets) are never errors;
/// they come back as a [`Response`](crate::http::response::Response) whose
/// status the caller inspects.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed before a complete response was received")]
    ConnectionClosed,

    #[error("malformed response: {0:?}")]
    MalformedResponse(ParseError),

    #[error("401 status code received without `WWW-Authenticate` header")]
    MissingChallenge,

    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("redirect target `{0}` is not a valid URL")]
    InvalidLocation(String),

    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("unsupported content coding `{0}`")]
    UnsupportedEncoding(String),

    #[error("failed to decode `{coding}` body: {source}")]
    Decode {
        coding: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown pipeline stage `{0}`")]
    UnknownStage(String),

    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
}

impl Error {
    /// Whether the failure came from the wire and the exchange may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::Connect { .. } | Error::Timeout(_) | Error::ConnectionClosed
        )
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::MalformedResponse(err)
    }
}
