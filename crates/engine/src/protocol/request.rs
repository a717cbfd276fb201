//! The parsed request handed to handlers.
//!
//! A [`Request`] owns no copy of the request: it is a frozen slice of the
//! pipeline's request buffer plus the offsets recorded while decoding. The
//! buffer keeps growing for the next request on its own tail, so a request
//! can never observe bytes that arrive after it was framed.

use std::borrow::Cow;
use std::ops::Range;

use bytes::Bytes;
use http::Version;

use crate::protocol::Method;
use crate::protocol::header::HeaderIndex;

/// Offsets of a decoded request head within its request bytes.
#[derive(Debug, Clone)]
pub(crate) struct RequestHead {
    pub(crate) method: Method,
    pub(crate) uri: Range<usize>,
    pub(crate) version: Version,
    /// The header block between the request line and the terminator, empty
    /// when the request line is followed directly by `CRLF CRLF`.
    pub(crate) headers: Range<usize>,
    pub(crate) header_index: Vec<HeaderIndex>,
    /// First byte after `CRLF CRLF`.
    pub(crate) body_start: usize,
    pub(crate) content_length: usize,
    pub(crate) persistent: bool,
}

impl RequestHead {
    /// Looks up the first header called `name`, ignoring ASCII case.
    pub(crate) fn header<'a>(&self, bytes: &'a [u8], name: &[u8]) -> Option<&'a [u8]> {
        self.header_index
            .iter()
            .find(|index| index.name(bytes).eq_ignore_ascii_case(name))
            .map(|index| index.value(bytes))
    }
}

/// A fully framed request.
///
/// GET and HEAD requests never carry a body, whatever their headers claim.
/// POST and PUT requests carry exactly `Content-Length` bytes.
#[derive(Debug, Clone)]
pub struct Request {
    bytes: Bytes,
    head: RequestHead,
}

impl Request {
    pub(crate) fn new(bytes: Bytes, head: RequestHead) -> Self {
        Self { bytes, head }
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.head.method
    }

    /// The request target exactly as sent, without the version token.
    #[inline]
    pub fn uri_bytes(&self) -> &[u8] {
        &self.bytes[self.head.uri.clone()]
    }

    /// The request target as text; bytes that are not UTF-8 are replaced.
    pub fn uri(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.uri_bytes())
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.head.version
    }

    /// The raw header block, possibly empty, without the request line and
    /// without the trailing `CRLF CRLF`.
    pub fn headers(&self) -> &[u8] {
        &self.bytes[self.head.headers.clone()]
    }

    /// The value of the first header called `name`, compared ignoring ASCII case.
    pub fn header(&self, name: impl AsRef<[u8]>) -> Option<&[u8]> {
        self.head.header(&self.bytes, name.as_ref())
    }

    /// Every header in the order it was received.
    pub fn header_iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.head.header_index.iter().map(|index| {
            // header names are restricted to token characters by the parser
            let name = std::str::from_utf8(index.name(&self.bytes)).unwrap_or_default();
            (name, index.value(&self.bytes))
        })
    }

    /// The request body, `None` for GET and HEAD.
    pub fn body(&self) -> Option<&[u8]> {
        if !self.head.method.has_body() {
            return None;
        }

        let start = self.head.body_start;
        Some(&self.bytes[start..start + self.head.content_length])
    }

    #[inline]
    pub fn content_length(&self) -> usize {
        self.head.content_length
    }

    /// Whether the connection is kept open after this request, judged from
    /// the `Connection` header and the declared version.
    #[inline]
    pub fn is_persistent(&self) -> bool {
        self.head.persistent
    }
}
