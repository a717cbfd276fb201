//! HTTP request decoder module
//!
//! This module frames requests incrementally as bytes arrive in chunks of
//! arbitrary size. The decoder is a state machine:
//!
//! ```text
//! Prefix ──classify──> Head ──GET/HEAD──────────────────────> Request
//!                        │
//!                        └──POST/PUT──> [Continue] ──> Body ──> Request
//! ```
//!
//! - `Prefix`: wait for enough bytes to hold the shortest method, a space and
//!   a one byte URI, then classify the method
//! - `Head`: wait for `CRLF CRLF`, resuming the scan where the previous call
//!   stopped
//! - `Body`: wait until `Content-Length` bytes follow the head. A GET/HEAD
//!   declaring a length passes through here too: its body is consumed with
//!   the request but never exposed
//!
//! A framed request is split off the front of the buffer and frozen, so the
//! bytes behind it (a pipelined request) stay in the buffer untouched.
//!
//! # Example
//!
//! ```
//! use bytes::BytesMut;
//! use micro_engine::codec::{Frame, RequestDecoder};
//! use tokio_util::codec::Decoder;
//!
//! let mut decoder = RequestDecoder::new();
//! let mut buffer = BytesMut::from(&b"POST /y HTTP/1.1\r\nContent-Length: 3\r\n\r\nab"[..]);
//! assert!(decoder.decode(&mut buffer).unwrap().is_none());
//!
//! buffer.extend_from_slice(b"c");
//! let Some(Frame::Request(request)) = decoder.decode(&mut buffer).unwrap() else { panic!() };
//! assert_eq!(request.uri(), "/y");
//! assert_eq!(request.body(), Some(&b"abc"[..]));
//! ```

use std::mem;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::codec::head_decoder::{decode_head, find_terminator};
use crate::ensure;
use crate::protocol::header::{expects_continue, parse_content_length};
use crate::protocol::{Method, ParseError, Request, RequestHead};

/// Shortest useful prefix: a three letter method, a space and a one byte URI.
pub const MIN_REQUEST_PREFIX: usize = 5;

/// Default ceiling for head plus body of a single request.
pub const DEFAULT_MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// What the decoder produced from the buffered bytes.
#[derive(Debug)]
pub enum Frame {
    /// A POST or PUT head asked for `Expect: 100-continue`; the provisional
    /// reply should be sent before decoding resumes.
    Continue,
    /// A fully framed request.
    Request(Request),
}

#[derive(Debug)]
enum State {
    Prefix,
    Head { method: Method, scanned: usize },
    Body { head: RequestHead, body_end: usize },
    /// An error found while decoding a head that is reported on the next
    /// call, after the provisional `100 Continue` went out.
    Rejected(ParseError),
}

/// Incremental decoder framing one request at a time.
///
/// Errors leave the decoder in its initial state; the connection that
/// produced them is expected to be closed.
#[derive(Debug)]
pub struct RequestDecoder {
    state: State,
    max_request_size: usize,
}

impl RequestDecoder {
    /// Creates a new `RequestDecoder` instance
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_max_request_size(max_request_size: usize) -> Self {
        Self { state: State::Prefix, max_request_size }
    }

    /// Forgets any partially decoded request.
    pub fn reset(&mut self) {
        self.state = State::Prefix;
    }

    fn body_end(&self, body_start: usize, length: usize) -> Result<usize, ParseError> {
        body_start
            .checked_add(length)
            .filter(|body_end| *body_end <= self.max_request_size)
            .ok_or_else(|| ParseError::too_large_request(body_start.saturating_add(length), self.max_request_size))
    }
}

impl Default for RequestDecoder {
    fn default() -> Self {
        Self::with_max_request_size(DEFAULT_MAX_REQUEST_SIZE)
    }
}

impl Decoder for RequestDecoder {
    type Item = Frame;
    type Error = ParseError;

    /// Attempts to frame a request from the provided buffer
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Frame::Continue))`: a POST/PUT head expects `100 Continue`
    /// - `Ok(Some(Frame::Request(_)))`: a complete request, split off `src`
    /// - `Ok(None)`: need more data to proceed
    /// - `Err(_)`: the request must be answered with the error's fixed response
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match mem::replace(&mut self.state, State::Prefix) {
                State::Prefix => {
                    if src.len() < MIN_REQUEST_PREFIX {
                        return Ok(None);
                    }

                    let method = Method::classify(src).ok_or(ParseError::UnsupportedMethod)?;
                    self.state = State::Head { method, scanned: 0 };
                }

                State::Head { method, scanned } => {
                    let Some(terminator) = find_terminator(src, scanned) else {
                        ensure!(src.len() <= self.max_request_size, ParseError::too_large_request(src.len(), self.max_request_size));
                        self.state = State::Head { method, scanned: src.len() };
                        return Ok(None);
                    };

                    let mut head = decode_head(src, method, terminator);
                    ensure!(
                        head.body_start <= self.max_request_size,
                        ParseError::too_large_request(head.body_start, self.max_request_size)
                    );

                    if !method.has_body() {
                        // a declared body is never exposed, but its bytes must not be
                        // mistaken for the next request
                        let ignored = head.header(src, b"content-length").and_then(|value| parse_content_length(value).ok());
                        let body_end = match ignored {
                            Some(ignored) if ignored > 0 => self.body_end(head.body_start, ignored)?,
                            _ => {
                                let bytes = src.split_to(head.body_start).freeze();
                                return Ok(Some(Frame::Request(Request::new(bytes, head))));
                            }
                        };
                        trace!(ignored = body_end - head.body_start, "skipping body of a bodiless method");
                        self.state = State::Body { head, body_end };
                        continue;
                    }

                    let expect_continue = expects_continue(head.header(src, b"expect"));
                    self.state = match head.header(src, b"content-length").map(parse_content_length) {
                        None => State::Rejected(ParseError::LengthRequired),
                        Some(Err(e)) => State::Rejected(e),
                        Some(Ok(content_length)) => {
                            let body_end = self.body_end(head.body_start, content_length)?;
                            head.content_length = content_length;
                            State::Body { head, body_end }
                        }
                    };

                    if expect_continue {
                        trace!("request expects 100-continue");
                        return Ok(Some(Frame::Continue));
                    }
                }

                State::Body { head, body_end } => {
                    if src.len() < body_end {
                        self.state = State::Body { head, body_end };
                        return Ok(None);
                    }

                    trace!(content_length = head.content_length, "request body complete");
                    let bytes = src.split_to(body_end).freeze();
                    return Ok(Some(Frame::Request(Request::new(bytes, head))));
                }

                State::Rejected(e) => return Err(e),
            }
        }
    }
}
