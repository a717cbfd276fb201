//! Helpers for the few headers the engine itself interprets.
//!
//! Only `Connection`, `Content-Length` and `Expect` change how a request is
//! framed or whether the connection survives it. Header names are compared
//! case-insensitively, values by case-insensitive prefix.

use std::ops::Range;

use http::Version;

use crate::ensure;
use crate::protocol::ParseError;

/// Byte ranges of a header's name and value within the request bytes.
///
/// Recording positions instead of copying lets the parsed view hand out
/// slices of the original buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderIndex {
    /// Start and end byte positions of the header name
    pub(crate) name: (usize, usize),
    /// Start and end byte positions of the header value
    pub(crate) value: (usize, usize),
}

impl HeaderIndex {
    /// Records the byte positions of header names and values from the parsed headers.
    ///
    /// `bytes` must be the buffer the headers were parsed from, so every
    /// recorded range is relative to its start.
    pub(crate) fn record(bytes: &[u8], headers: &[httparse::Header<'_>]) -> Vec<HeaderIndex> {
        let bytes_ptr = bytes.as_ptr() as usize;
        headers
            .iter()
            .map(|header| {
                let name_start = header.name.as_ptr() as usize - bytes_ptr;
                let value_start = header.value.as_ptr() as usize - bytes_ptr;
                HeaderIndex {
                    name: (name_start, name_start + header.name.len()),
                    value: (value_start, value_start + header.value.len()),
                }
            })
            .collect()
    }

    /// Indexes every `name: value` line of `block` without validating it.
    ///
    /// Lines without a colon are skipped; blanks and tabs around the value
    /// are trimmed.
    pub(crate) fn scan(bytes: &[u8], block: Range<usize>) -> Vec<HeaderIndex> {
        let mut index = Vec::new();
        let mut line_start = block.start;

        while line_start < block.end {
            let line_end =
                bytes[line_start..block.end].windows(2).position(|window| window == b"\r\n").map_or(block.end, |position| line_start + position);

            if let Some(colon) = bytes[line_start..line_end].iter().position(|b| *b == b':') {
                let name_end = line_start + colon;
                let mut value_start = name_end + 1;
                while value_start < line_end && matches!(bytes[value_start], b' ' | b'\t') {
                    value_start += 1;
                }
                let mut value_end = line_end;
                while value_end > value_start && matches!(bytes[value_end - 1], b' ' | b'\t') {
                    value_end -= 1;
                }
                index.push(HeaderIndex { name: (line_start, name_end), value: (value_start, value_end) });
            }

            line_start = line_end + 2;
        }
        index
    }

    #[inline]
    pub(crate) fn name<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.name.0..self.name.1]
    }

    #[inline]
    pub(crate) fn value<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.value.0..self.value.1]
    }
}

/// Maps the version token of a request line to an [`http::Version`].
///
/// A missing token is HTTP/0.9 style. Unknown tokens are treated as
/// HTTP/1.0, so they only persist on an explicit `Connection: Keep-Alive`.
pub(crate) fn parse_version(token: &[u8]) -> Version {
    match token {
        b"HTTP/1.1" => Version::HTTP_11,
        b"" => Version::HTTP_09,
        _ => Version::HTTP_10,
    }
}

/// Decides whether the connection survives the request.
///
/// HTTP/1.1 persists unless `Connection: close`; every other version
/// persists only with `Connection: Keep-Alive`.
pub(crate) fn is_persistent(version: Version, connection: Option<&[u8]>) -> bool {
    match version {
        Version::HTTP_11 => !connection.is_some_and(|value| starts_with_ignore_case(value, b"close")),
        _ => connection.is_some_and(|value| starts_with_ignore_case(value, b"keep-alive")),
    }
}

/// `Expect: 100-continue`, matched on the status code prefix.
pub(crate) fn expects_continue(expect: Option<&[u8]>) -> bool {
    expect.is_some_and(|value| value.starts_with(b"100"))
}

/// Parses a `Content-Length` value.
///
/// Leading digits are read and anything after them terminates the number,
/// so `"12abc"` is 12. A value without a leading digit, or one that does not
/// fit in `usize`, is rejected.
pub(crate) fn parse_content_length(value: &[u8]) -> Result<usize, ParseError> {
    let value = value.trim_ascii_start();
    let digits = value.iter().take_while(|b| b.is_ascii_digit()).count();
    ensure!(digits > 0, ParseError::invalid_content_length(format!("value {:?} has no digits", String::from_utf8_lossy(value))));

    value[..digits]
        .iter()
        .try_fold(0usize, |acc, b| acc.checked_mul(10)?.checked_add(usize::from(b - b'0')))
        .ok_or_else(|| ParseError::invalid_content_length("value overflows usize"))
}

#[inline]
fn starts_with_ignore_case(value: &[u8], prefix: &[u8]) -> bool {
    value.len() >= prefix.len() && value[..prefix.len()].eq_ignore_ascii_case(prefix)
}
