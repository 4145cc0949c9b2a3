//! End-to-end tests against a local canned HTTP server.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use herald::http::request::RequestBuilder;
use herald::http::response::StatusCode;
use herald::{Client, Config, Error};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Reads one request head and returns its request line.
async fn read_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut byte = [0u8; 1];
    while !head.ends_with(b"\r\n\r\n") {
        if stream.read(&mut byte).await.unwrap() == 0 {
            break;
        }
        head.push(byte[0]);
    }
    String::from_utf8_lossy(&head).into_owned()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

/// Pieces of the canned reply for a given request head.
fn reply_for(head: &str) -> Vec<Vec<u8>> {
    let target = head.split_whitespace().nth(1).unwrap_or("/");
    match target {
        "/plain" => vec![
            b"HTTP/1.1 200 OK\r\nContent-Le".to_vec(),
            b"ngth: 11\r\n\r\nhello".to_vec(),
            b" world".to_vec(),
        ],
        "/chunked" => vec![
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhel".to_vec(),
            b"lo\r\n6\r\n world\r".to_vec(),
            b"\n0\r\n\r\n".to_vec(),
        ],
        "/gzip" => {
            let body = gzip(b"squeezed");
            let mut head = format!(
                "HTTP/1.1 200 OK\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n\r\n",
                body.len()
            )
            .into_bytes();
            let (first, second) = body.split_at(body.len() / 2);
            head.extend_from_slice(first);
            vec![head, second.to_vec()]
        }
        "/old" => vec![b"HTTP/1.1 301 Moved Permanently\r\nLocation: /plain\r\nContent-Length: 0\r\n\r\n".to_vec()],
        "/loop" => vec![b"HTTP/1.1 302 Found\r\nLocation: /loop\r\nContent-Length: 0\r\n\r\n".to_vec()],
        "/echo-headers" => {
            let body = head.to_string();
            vec![format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()]
        }
        "/private" if head.contains("Authorization: Basic dXNlcjpwYXNz") => {
            vec![b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\n\r\nwelcome".to_vec()]
        }
        "/private" => vec![b"HTTP/1.1 401 Unauthorized\r\nWWW-Authenticate: Basic realm=\"test\"\r\nContent-Length: 0\r\n\r\n".to_vec()],
        "/big" => vec![b"HTTP/1.1 200 OK\r\nContent-Length: 1234\r\nContent-Encoding: gzip\r\n\r\n".to_vec()],
        "/empty" => vec![b"HTTP/1.1 204 No Content\r\nServer: canned\r\n\r\n".to_vec()],
        "/truncated" => vec![b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort".to_vec()],
        _ => vec![b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n".to_vec()],
    }
}

/// Serves canned replies, writing each in several pieces.
async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let head = read_head(&mut stream).await;
                for piece in reply_for(&head) {
                    if stream.write_all(&piece).await.is_err() {
                        return;
                    }
                    let _ = stream.flush().await;
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            });
        }
    });

    addr
}

fn client() -> Client {
    let cfg = Config {
        connect_timeout_secs: 2,
        request_timeout_secs: 5,
        ..Config::default()
    };
    Client::new(cfg).unwrap()
}

#[tokio::test]
async fn test_get_content_length_body() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/plain", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"hello world");
}

#[tokio::test]
async fn test_get_chunked_body() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/chunked", addr)).await.unwrap();

    assert_eq!(response.text(), "hello world");
}

#[tokio::test]
async fn test_get_gzip_body_is_decoded() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/gzip", addr)).await.unwrap();

    assert_eq!(response.body(), b"squeezed");
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/old", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), b"hello world");
}

#[tokio::test]
async fn test_redirect_loop_stops_at_budget() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/loop", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.header("Location"), Some("/loop"));
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let addr = spawn_server().await;
    let request = RequestBuilder::new()
        .url(format!("http://{}/echo-headers", addr))
        .header("Accept", "text/plain")
        .build()
        .unwrap();

    let response = client().execute(request).await.unwrap();
    let echoed = response.text();

    assert!(echoed.starts_with("GET /echo-headers HTTP/1.1\r\n"));
    assert!(echoed.contains(&format!("Host: {}", addr)));
    assert!(echoed.contains("User-Agent: herald/"));
    assert!(echoed.contains("Accept: text/plain"));
    assert!(!echoed.contains("Accept: */*"));
    assert!(echoed.contains("Accept-Encoding: gzip; q=1, deflate; q=1"));
    assert!(echoed.contains("Connection: close"));
}

#[tokio::test]
async fn test_basic_auth_from_config() {
    let addr = spawn_server().await;
    let cfg = Config::from_yaml("auth:\n  username: user\n  password: pass\n").unwrap();
    let client = Client::new(cfg).unwrap();

    let response = client.get(&format!("http://{}/private", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_challenge_without_credentials_returns_401() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/private", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_head_response_ends_with_headers() {
    let addr = spawn_server().await;
    let response = client().head(&format!("http://{}/big", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.header("Content-Length"), Some("1234"));
    assert!(response.body().is_empty());
}

#[tokio::test]
async fn test_no_content_without_length_completes() {
    let addr = spawn_server().await;
    let response = client().get(&format!("http://{}/empty", addr)).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.header("Server"), Some("canned"));
}

#[tokio::test]
async fn test_truncated_response_is_connection_closed() {
    let addr = spawn_server().await;
    let err = client().get(&format!("http://{}/truncated", addr)).await.unwrap_err();

    assert!(matches!(err, Error::ConnectionClosed));
}

#[tokio::test]
async fn test_connection_refused_is_reported() {
    // Bind then drop so the port is very likely closed.
    let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
    let cfg = Config::from_yaml("retry_count: 0\n").unwrap();
    let client = Client::new(cfg).unwrap();

    let err = client.get(&format!("http://{}/", addr)).await.unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn test_https_is_rejected() {
    let err = client().get("https://example.com/").await.unwrap_err();

    assert!(matches!(err, Error::UnsupportedScheme(s) if s == "https"));
}

#[tokio::test]
async fn test_invalid_url() {
    let err = client().get("not a url").await.unwrap_err();

    assert!(matches!(err, Error::InvalidUrl { .. }));
}
