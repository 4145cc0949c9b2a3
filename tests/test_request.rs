use herald::Error;
use herald::http::request::{Credentials, Method, Request, RequestBuilder};
use herald::http::writer::serialize_request;

fn text(request: &Request) -> String {
    String::from_utf8(serialize_request(request)).unwrap()
}

#[test]
fn test_request_method_from_string() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("POST"), Some(Method::POST));
    assert_eq!(Method::from_str("INVALID"), None);
    assert_eq!(Method::from_str("get"), None); // Case-sensitive
}

#[test]
fn test_method_round_trips_through_as_str() {
    for method in [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::PATCH,
    ] {
        assert_eq!(Method::from_str(method.as_str()), Some(method));
    }
}

#[test]
fn test_builder_defaults_to_get() {
    let request = RequestBuilder::new().url("http://example.com/").build().unwrap();

    assert_eq!(request.method, Method::GET);
    assert!(request.body.is_empty());
    assert!(request.auth.is_none());
}

#[test]
fn test_builder_rejects_missing_and_invalid_url() {
    assert!(matches!(RequestBuilder::new().build(), Err(Error::InvalidRequest(_))));
    assert!(matches!(
        RequestBuilder::new().url("not a url").build(),
        Err(Error::InvalidUrl { .. })
    ));
}

#[test]
fn test_builder_basic_auth() {
    let request = RequestBuilder::new()
        .url("http://example.com/")
        .basic_auth("user", "pass")
        .build()
        .unwrap();

    assert_eq!(request.auth, Some(Credentials::new("user", "pass")));
}

#[test]
fn test_request_target_includes_query() {
    let request = RequestBuilder::new()
        .url("http://example.com/search?q=rust")
        .build()
        .unwrap();

    assert_eq!(request.target(), "/search?q=rust");
}

#[test]
fn test_serialize_get_request() {
    let request = RequestBuilder::new()
        .method(Method::GET)
        .url("http://localhost:3000/api/users")
        .header("User-Agent", "Test")
        .build()
        .unwrap();

    let text = text(&request);
    assert!(text.starts_with("GET /api/users HTTP/1.1\r\n"));
    assert!(text.contains("Host: localhost:3000\r\n"));
    assert!(text.contains("User-Agent: Test\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.ends_with("\r\n\r\n"));
}

#[test]
fn test_serialize_default_port_omitted_from_host() {
    let request = RequestBuilder::new().url("http://example.com").build().unwrap();

    let text = text(&request);
    assert!(text.starts_with("GET / HTTP/1.1\r\n"));
    assert!(text.contains("Host: example.com\r\n"));
}

#[test]
fn test_serialize_post_body_sets_content_length() {
    let request = RequestBuilder::new()
        .method(Method::POST)
        .url("http://localhost:8080/api/data")
        .header("Content-Type", "application/json")
        .header("Content-Length", "999")
        .body(b"{}".to_vec())
        .build()
        .unwrap();

    let text = text(&request);
    assert!(text.starts_with("POST /api/data HTTP/1.1\r\n"));
    assert!(text.contains("Content-Length: 2\r\n"));
    assert!(!text.contains("999"));
    assert!(text.ends_with("\r\n\r\n{}"));
}

#[test]
fn test_serialize_keeps_caller_connection_header() {
    let request = RequestBuilder::new()
        .url("http://localhost/")
        .header("Connection", "keep-alive")
        .build()
        .unwrap();

    let text = text(&request);
    assert!(text.contains("Connection: keep-alive\r\n"));
    assert!(!text.contains("Connection: close"));
}

#[test]
fn test_serialize_host_follows_url() {
    let mut request = RequestBuilder::new()
        .url("http://first.example/")
        .header("Host", "stale.example")
        .build()
        .unwrap();
    request.url = url::Url::parse("http://second.example/next").unwrap();

    let text = text(&request);
    assert!(text.contains("Host: second.example\r\n"));
    assert!(!text.contains("stale.example"));
}

#[test]
fn test_builder_json_body() {
    let request = RequestBuilder::new()
        .method(Method::POST)
        .url("http://example.com/users")
        .json(&serde_json::json!({ "name": "ada", "admin": false }))
        .build()
        .unwrap();

    assert_eq!(request.header("Content-Type"), Some("application/json"));
    let parsed: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(parsed["name"], "ada");
    assert!(text(&request).contains(&format!("Content-Length: {}", request.body.len())));
}

#[test]
fn test_builder_form_body() {
    let request = RequestBuilder::new()
        .method(Method::POST)
        .url("http://example.com/login")
        .form([("user", "ada lovelace"), ("next", "/home?x=1&y")])
        .build()
        .unwrap();

    assert_eq!(
        request.header("Content-Type"),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(request.body, b"user=ada+lovelace&next=%2Fhome%3Fx%3D1%26y");
}

#[test]
fn test_builder_keeps_caller_content_type() {
    let request = RequestBuilder::new()
        .url("http://example.com/")
        .header("Content-Type", "application/vnd.api+json")
        .json(&[1, 2, 3])
        .build()
        .unwrap();

    assert_eq!(request.headers.get_all("Content-Type").count(), 1);
    assert_eq!(request.header("Content-Type"), Some("application/vnd.api+json"));
    assert_eq!(request.body, b"[1,2,3]");
}

#[test]
fn test_builder_rejects_two_bodies() {
    let result = RequestBuilder::new()
        .url("http://example.com/")
        .body("raw")
        .form([("a", "b")])
        .build();

    assert!(matches!(result, Err(Error::InvalidRequest(_))));
}

#[test]
fn test_builder_query_params() {
    let request = RequestBuilder::new()
        .url("http://example.com/search?lang=en")
        .query("q", "rust async")
        .query("page", "2")
        .build()
        .unwrap();

    assert_eq!(request.url.query(), Some("lang=en&q=rust+async&page=2"));
    assert_eq!(request.target(), "/search?lang=en&q=rust+async&page=2");
}
