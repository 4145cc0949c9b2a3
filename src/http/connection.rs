//! The wire primitive: send one request over a fresh TCP connection and
//! read back one framed response.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::Error;
use crate::http::buffer::ResponseBuffer;
use crate::http::parser::parse_http_response;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use crate::http::writer::serialize_request;

/// Size of each socket read
const READ_CHUNK_SIZE: usize = 8192;

/// Sends a request over the wire and returns the parsed response.
///
/// This is the only thing the pipeline knows about the client; the terminal
/// stage is its sole caller.
#[async_trait]
pub trait Exchange: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, Error>;
}

/// [`Exchange`] over plain TCP, one connection per request.
#[derive(Debug, Clone)]
pub struct TcpExchange {
    connect_timeout: Duration,
    request_timeout: Duration,
}

impl TcpExchange {
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            request_timeout,
        }
    }

    async fn connect(&self, request: &Request) -> Result<TcpStream, Error> {
        let url = &request.url;
        if url.scheme() != "http" {
            return Err(Error::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = url.host_str().ok_or(Error::InvalidRequest("URL has no host"))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let addr = format!("{}:{}", host, port);

        let stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| Error::Timeout(self.connect_timeout))?
            .map_err(|source| Error::Connect {
                addr: addr.clone(),
                source,
            })?;

        tracing::trace!(%addr, "Connected");
        Ok(stream)
    }

    async fn exchange(&self, mut stream: TcpStream, request: &Request) -> Result<Response, Error> {
        stream.write_all(&serialize_request(request)).await?;
        stream.flush().await?;

        tracing::trace!(method = %request.method, url = %request.url, "Request sent");

        let mut buffer = ResponseBuffer::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        // Raw bytes up to the end of the header block, for responses that
        // end there whatever their framing headers say.
        let mut head = BytesMut::new();

        loop {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            tracing::trace!(bytes = n, "Read from connection");

            let headers_known = buffer.header_len().is_some();
            if !headers_known {
                head.extend_from_slice(&chunk[..n]);
            }

            if let Some((message, header_len)) = buffer.feed(&chunk[..n]) {
                return Ok(parse_http_response(&message, header_len)?);
            }

            if headers_known {
                continue;
            }
            if let Some(header_len) = buffer.header_len() {
                let response = parse_http_response(&head[..header_len], header_len)?;
                if !carries_body(request.method, response.status()) {
                    tracing::trace!(status = response.status().as_u16(), "Response has no body");
                    return Ok(response);
                }
            }
        }
    }
}

/// Whether a response to `method` with `status` has a message body.
/// Responses to HEAD, and 204 and 304 responses, end with the header block
/// (RFC 9112 section 6.3).
fn carries_body(method: Method, status: StatusCode) -> bool {
    method != Method::HEAD && status != StatusCode::NO_CONTENT && status != StatusCode::NOT_MODIFIED
}

impl Default for TcpExchange {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(30))
    }
}

#[async_trait]
impl Exchange for TcpExchange {
    async fn send(&self, request: &Request) -> Result<Response, Error> {
        let stream = self.connect(request).await?;

        timeout(self.request_timeout, self.exchange(stream, request))
            .await
            .map_err(|_| Error::Timeout(self.request_timeout))?
    }
}
