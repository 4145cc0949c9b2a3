use crate::http::request::Request;

const HTTP_VERSION: &str = "HTTP/1.1";

/// `Host` field value for the request URL, with the port only when it is
/// not the scheme default.
pub fn host_header(request: &Request) -> Option<String> {
    let host = request.url.host_str()?;
    Some(match request.url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Serializes a request for the wire.
///
/// `Host` is always derived from the URL so it follows redirects. Without a
/// caller supplied `Connection` field the request asks the server to close
/// the connection after responding.
pub fn serialize_request(request: &Request) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + request.body.len());

    // Request line
    let request_line = format!(
        "{} {} {}\r\n",
        request.method,
        request.target(),
        HTTP_VERSION
    );
    buf.extend_from_slice(request_line.as_bytes());

    // Headers
    if let Some(host) = host_header(request) {
        write_header(&mut buf, "Host", &host);
    }
    for (k, v) in request.headers.iter() {
        if k.eq_ignore_ascii_case("host") || k.eq_ignore_ascii_case("content-length") {
            continue;
        }
        write_header(&mut buf, k, v);
    }
    if !request.body.is_empty() {
        write_header(&mut buf, "Content-Length", &request.body.len().to_string());
    }
    if !request.headers.contains("Connection") {
        write_header(&mut buf, "Connection", "close");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&request.body);

    buf
}

fn write_header(buf: &mut Vec<u8>, key: &str, value: &str) {
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}
