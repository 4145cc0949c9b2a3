//! Byte-level recognition of HTTP/1.1 response framing.
//!
//! The functions here never consume input. They answer questions about a
//! byte slice (is the header block complete, how long is it, where does a
//! chunk-size line end) and leave the bookkeeping to
//! [`ResponseBuffer`](crate::http::buffer::ResponseBuffer).

use crate::http::headers::Headers;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";
const CRLF: &[u8] = b"\r\n";

/// Longest chunk-size accepted; anything wider would overflow `usize`.
const MAX_CHUNK_SIZE_DIGITS: usize = 2 * std::mem::size_of::<usize>();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidStatusLine,
    InvalidStatusCode,
    InvalidHeader,
    InvalidEncoding,
    Incomplete,
}

fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(CRLF.len()).position(|w| w == CRLF)
}

/// Whether `buf` holds a status line and header fields up to the empty line.
pub fn is_header_block_complete(buf: &[u8]) -> bool {
    find_headers_end(buf).is_some()
}

/// Byte length of the header block, terminating empty line included.
pub fn header_block_length(buf: &[u8]) -> Option<usize> {
    find_headers_end(buf).map(|end| end + HEADER_TERMINATOR.len())
}

/// Looks up a `Content-Length` field in a header block.
///
/// Matching is case-insensitive. A value that is not a decimal number is
/// treated as if the field were absent.
pub fn find_content_length(header_bytes: &[u8]) -> Option<usize> {
    header_bytes
        .split(|&b| b == b'\n')
        .skip(1)
        .filter_map(|line| {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            let colon = line.iter().position(|&b| b == b':')?;
            let (name, value) = line.split_at(colon);
            if !name.trim_ascii().eq_ignore_ascii_case(b"content-length") {
                return None;
            }
            std::str::from_utf8(&value[1..]).ok()?.trim().parse().ok()
        })
        .next()
}

/// Recognizes a chunk-size line at the very start of `buf`.
///
/// Returns the decoded size and the length of the line including its CRLF.
/// Chunk extensions (`;name=value`) are skipped. A line that is not yet
/// terminated or does not start with hex digits yields `None`.
pub fn find_chunk_size_line(buf: &[u8]) -> Option<(usize, usize)> {
    let line_end = find_crlf(buf)?;
    let line = &buf[..line_end];

    let digits = line.iter().take_while(|b| b.is_ascii_hexdigit()).count();
    if digits == 0 || digits > MAX_CHUNK_SIZE_DIGITS {
        return None;
    }
    match line.get(digits) {
        None | Some(b';') | Some(b' ') | Some(b'\t') => {}
        Some(_) => return None,
    }

    let size = std::str::from_utf8(&line[..digits])
        .ok()
        .and_then(|hex| usize::from_str_radix(hex, 16).ok())?;
    Some((size, line_end + CRLF.len()))
}

/// Whether `buf` starts with the zero-size chunk that ends a chunked body.
pub fn is_last_chunk(buf: &[u8]) -> bool {
    matches!(find_chunk_size_line(buf), Some((0, _)))
}

/// Builds a [`Response`] from a framed message.
///
/// `header_len` is the header block length reported by the buffer; the
/// bytes after it are the (already de-chunked) body.
pub fn parse_http_response(message: &[u8], header_len: usize) -> Result<Response, ParseError> {
    if message.len() < header_len {
        return Err(ParseError::Incomplete);
    }
    let (head, body) = message.split_at(header_len);

    let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;
    let mut lines = head.split("\r\n");

    // Status line
    let status_line = lines.next().ok_or(ParseError::InvalidStatusLine)?;
    let mut parts = status_line.splitn(3, ' ');

    let version = parts.next().ok_or(ParseError::InvalidStatusLine)?;
    if !version.starts_with("HTTP/") {
        return Err(ParseError::InvalidStatusLine);
    }
    let code = parts
        .next()
        .ok_or(ParseError::InvalidStatusLine)?
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidStatusCode)?;
    if !(100..=999).contains(&code) {
        return Err(ParseError::InvalidStatusCode);
    }
    let reason = parts.next().unwrap_or("").trim();

    // Headers
    let mut headers = Headers::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }

        let (key, value) = line.split_once(':').ok_or(ParseError::InvalidHeader)?;
        headers.append(key.trim(), value.trim());
    }

    Ok(ResponseBuilder::new(StatusCode::new(code))
        .reason(reason)
        .version(version)
        .headers(headers)
        .body(body.to_vec())
        .build())
}
