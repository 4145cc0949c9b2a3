//! Incremental reassembly of one HTTP response.
//!
//! ```text
//!   feed(bytes) ──► pending ──(header block complete)──► assembled
//!                      │                                     ▲
//!                      └──── BodyFraming::ContentLength ─────┤
//!                      └──── BodyFraming::Chunked ───────────┘
//!                              (size lines and CRLFs dropped)
//! ```
//!
//! Bytes move from `pending` into `assembled` only once they are known to
//! belong to the message. Chunk framing is discarded, so the assembled
//! message is the header block followed by the plain payload.

use bytes::{Buf, Bytes, BytesMut};

use crate::http::parser;

/// Trailing CRLF after every chunk body.
const CHUNK_TRAILER_LEN: usize = 2;

/// How the end of the body is located. Chosen once per response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// Exactly this many body bytes follow the header block.
    ContentLength(usize),
    /// Size-prefixed chunks up to a zero-size chunk.
    Chunked,
}

enum Progress {
    Complete,
    NeedMore,
}

impl BodyFraming {
    fn drive(self, buf: &mut ResponseBuffer) -> Progress {
        match self {
            BodyFraming::ContentLength(len) => {
                if buf.pending.len() >= len {
                    buf.save(len);
                    Progress::Complete
                } else {
                    Progress::NeedMore
                }
            }
            BodyFraming::Chunked => Self::drive_chunked(buf),
        }
    }

    fn drive_chunked(buf: &mut ResponseBuffer) -> Progress {
        loop {
            if buf.bytes_pending_save > 0 {
                if buf.pending.len() < buf.bytes_pending_save {
                    return Progress::NeedMore;
                }
                buf.save(buf.bytes_pending_save);
                buf.bytes_pending_save = 0;
                buf.bytes_pending_skip = CHUNK_TRAILER_LEN;
            } else if buf.bytes_pending_skip > 0 {
                if buf.pending.len() < buf.bytes_pending_skip {
                    return Progress::NeedMore;
                }
                buf.pending.advance(buf.bytes_pending_skip);
                buf.bytes_pending_skip = 0;
            } else {
                if parser::is_last_chunk(&buf.pending) {
                    return Progress::Complete;
                }
                let Some((size, line_len)) = parser::find_chunk_size_line(&buf.pending) else {
                    return Progress::NeedMore;
                };
                tracing::trace!(size, "Chunk size line");
                buf.bytes_pending_save = size;
                buf.pending.advance(line_len);
            }
        }
    }
}

/// Accumulates the bytes of a single in-flight response until a complete
/// message can be framed.
///
/// A buffer is owned by the one exchange reading that response and is
/// discarded after it yields its message.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    pending: BytesMut,
    assembled: BytesMut,
    headers_done: bool,
    framing: Option<BodyFraming>,
    bytes_pending_save: usize,
    bytes_pending_skip: usize,
    header_len: usize,
    complete: bool,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds freshly received bytes and tries to frame the message.
    ///
    /// Returns the assembled message together with the header block length
    /// once the body is complete, `None` while more bytes are needed. After
    /// the message has been returned, later calls only retain the extra
    /// bytes and keep returning `None`.
    pub fn feed(&mut self, data: &[u8]) -> Option<(Bytes, usize)> {
        self.pending.extend_from_slice(data);

        if self.complete || !self.check_headers() {
            return None;
        }

        let framing = match self.framing {
            Some(framing) => framing,
            None => self.select_framing(),
        };

        match framing.drive(self) {
            Progress::Complete => {
                self.complete = true;
                let message = self.assembled.split().freeze();
                tracing::debug!(
                    length = message.len(),
                    header_len = self.header_len,
                    "Response message complete"
                );
                Some((message, self.header_len))
            }
            Progress::NeedMore => None,
        }
    }

    /// Whether the message has already been handed out.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Framing chosen for the body, once the header block has been seen.
    pub fn framing(&self) -> Option<BodyFraming> {
        self.framing
    }

    /// Header block length, once known.
    pub fn header_len(&self) -> Option<usize> {
        self.headers_done.then_some(self.header_len)
    }

    fn check_headers(&mut self) -> bool {
        if !self.headers_done && parser::is_header_block_complete(&self.pending) {
            if let Some(len) = parser::header_block_length(&self.pending) {
                self.header_len = len;
                self.save(len);
                self.headers_done = true;
                tracing::debug!(header_len = len, "Header block complete");
            }
        }
        self.headers_done
    }

    fn select_framing(&mut self) -> BodyFraming {
        let framing = match parser::find_content_length(&self.assembled) {
            Some(len) => BodyFraming::ContentLength(len),
            None => BodyFraming::Chunked,
        };
        tracing::debug!(?framing, "Body framing selected");
        self.framing = Some(framing);
        framing
    }

    /// Moves `len` bytes from the front of `pending` to `assembled`.
    fn save(&mut self, len: usize) {
        let bytes = self.pending.split_to(len);
        self.assembled.unsplit(bytes);
    }
}
