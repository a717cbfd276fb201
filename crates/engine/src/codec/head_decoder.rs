//! Splits a buffered request head into its parts.
//!
//! Runs once the `CRLF CRLF` terminator has been located. The request line
//! is split by hand: the method token (with its space) was already matched
//! during classification, the URI runs to the next space or to the end of
//! the line, and whatever follows that space is the version token. The
//! header block is handed to `httparse` only to record where each name and
//! value lives. A block `httparse` refuses (too many headers, a line it
//! considers malformed) is indexed by a plain line scan instead: the engine
//! never rejects a request for its header block.

use http::Version;
use httparse::Status;
use tracing::trace;

use crate::protocol::header::{HeaderIndex, is_persistent, parse_version};
use crate::protocol::{Method, RequestHead};

/// Headers indexed by `httparse`; longer blocks fall back to a line scan.
pub(crate) const MAX_HEADER_NUM: usize = 64;

pub(crate) const TERMINATOR: &[u8] = b"\r\n\r\n";

/// Finds the header terminator, resuming the scan just before `scanned` so
/// a terminator split across reads is still found.
pub(crate) fn find_terminator(src: &[u8], scanned: usize) -> Option<usize> {
    let from = scanned.saturating_sub(TERMINATOR.len() - 1);
    src.get(from..)?.windows(TERMINATOR.len()).position(|window| window == TERMINATOR).map(|position| from + position)
}

/// Decodes the head of a request whose terminator starts at `terminator`.
///
/// The returned head has no content length yet; body framing is decided by
/// the caller.
pub(crate) fn decode_head(src: &[u8], method: Method, terminator: usize) -> RequestHead {
    let uri_start = method.token().len();

    let line_end = src[uri_start..terminator]
        .iter()
        .position(|b| *b == b'\r')
        .map_or(terminator, |position| uri_start + position);

    let (uri, version) = match src[uri_start..line_end].iter().position(|b| *b == b' ') {
        Some(space) => (uri_start..uri_start + space, parse_version(&src[uri_start + space + 1..line_end])),
        None => (uri_start..line_end, Version::HTTP_09),
    };

    let headers = if line_end < terminator { (line_end + 2).min(terminator)..terminator } else { terminator..terminator };
    let block_start = if headers.is_empty() { terminator + 2 } else { headers.start };
    let body_start = terminator + TERMINATOR.len();

    let mut parsed = [httparse::EMPTY_HEADER; MAX_HEADER_NUM];
    let header_index = match httparse::parse_headers(&src[block_start..body_start], &mut parsed) {
        Ok(Status::Complete((_, parsed))) => HeaderIndex::record(src, parsed),
        Ok(Status::Partial) => HeaderIndex::scan(src, headers.clone()),
        Err(e) => {
            trace!(cause = %e, "indexing header block by line scan");
            HeaderIndex::scan(src, headers.clone())
        }
    };

    let mut head = RequestHead {
        method,
        uri,
        version,
        headers,
        header_index,
        body_start,
        content_length: 0,
        persistent: false,
    };
    head.persistent = is_persistent(version, head.header(src, b"connection"));

    trace!(%method, ?version, header_count = head.header_index.len(), persistent = head.persistent, "decoded request head");
    head
}
