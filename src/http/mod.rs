//! HTTP/1.1 wire handling for the client.
//!
//! # Architecture
//!
//! - **`headers`**: Case-insensitive, multi-valued header collection
//! - **`request`**: Outgoing request representation and builder
//! - **`response`**: Received response representation with builder
//! - **`writer`**: Serializes a request for the wire
//! - **`parser`**: Recognizes header block, `Content-Length` and chunk framing, parses the status line
//! - **`buffer`**: Reassembles one response from arbitrarily split reads
//! - **`encoding`**: Content codings used to decode response bodies
//! - **`connection`**: The `Exchange` primitive and its TCP implementation
//!
//! # Response Reassembly
//!
//! ```text
//!        ┌──────────────────┐
//!        │  Header block    │ ← Wait for the empty line
//!        └──────┬───────────┘
//!               │ Content-Length present?
//!        ┌──────┴──────────────────┐
//!        ▼                         ▼
//!  ┌───────────────┐       ┌───────────────┐
//!  │ ContentLength │       │    Chunked    │ ← size line, data, CRLF, ...
//!  └──────┬────────┘       └──────┬────────┘
//!         │ N bytes buffered      │ zero-size chunk
//!         └──────────┬────────────┘
//!                    ▼
//!             complete message
//! ```

pub mod buffer;
pub mod connection;
pub mod encoding;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
