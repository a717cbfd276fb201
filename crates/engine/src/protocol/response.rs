//! Responses generated by the engine itself rather than by a handler.
//!
//! Every error response asks the client to close, and the engine closes the
//! connection after writing it.

/// Provisional reply to `Expect: 100-continue`.
pub const CONTINUE: &[u8] = b"HTTP/1.1 100 Continue\r\n\r\n";

pub const BAD_REQUEST: &[u8] = b"HTTP/1.1 400 Bad Request\r\nServer: test\r\nConnection: close\r\n\r\n";

pub const LENGTH_REQUIRED: &[u8] = b"HTTP/1.1 411 Length Required\r\nServer: test\r\nConnection: close\r\n\r\n";

pub const PAYLOAD_TOO_LARGE: &[u8] = b"HTTP/1.1 413 Payload Too Large\r\nServer: test\r\nConnection: close\r\n\r\n";

pub const INTERNAL_SERVER_ERROR: &[u8] =
    b"HTTP/1.1 500 Internal Server Error\r\nServer: test\r\nConnection: close\r\n\r\n";

pub const NOT_IMPLEMENTED: &[u8] = b"HTTP/1.1 501 Not Implemented\r\nServer: test\r\nConnection: close\r\n\r\n";
