use std::io;
use std::io::Write;

use bytes::{BufMut, BytesMut};
use http::{HeaderValue, StatusCode, header};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::protocol::SendError;

/// The bytes of a response, assembled by a handler and drained to the socket.
///
/// A write cursor tracks how much has already reached the socket, so the
/// buffer can be drained over several partial writes. [`reset`](Self::reset)
/// empties it while keeping its capacity.
///
/// Handlers either push raw bytes (the buffer implements [`io::Write`]) or use
/// the small helpers:
///
/// ```
/// use http::StatusCode;
/// use micro_engine::buffer::ResponseBuffer;
///
/// let mut response = ResponseBuffer::with_capacity(256);
/// response.status(StatusCode::OK).header("Server", "micro").body("hello");
///
/// assert_eq!(response.as_bytes(), b"HTTP/1.1 200 OK\r\nServer: micro\r\ncontent-length: 5\r\n\r\nhello");
/// ```
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    buf: BytesMut,
    written: usize,
}

impl ResponseBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), written: 0 }
    }

    /// Appends an HTTP/1.1 status line.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.buf.put_slice(b"HTTP/1.1 ");
        self.buf.put_slice(status.as_str().as_bytes());
        self.buf.put_u8(b' ');
        self.buf.put_slice(status.canonical_reason().unwrap_or_default().as_bytes());
        self.buf.put_slice(b"\r\n");
        self
    }

    /// Appends a `name: value` header line.
    pub fn header(&mut self, name: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> &mut Self {
        self.buf.put_slice(name.as_ref());
        self.buf.put_slice(b": ");
        self.buf.put_slice(value.as_ref());
        self.buf.put_slice(b"\r\n");
        self
    }

    /// Appends a `Content-Length` header, the blank line and the body itself.
    pub fn body(&mut self, body: impl AsRef<[u8]>) -> &mut Self {
        let body = body.as_ref();
        self.header(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        self.buf.put_slice(b"\r\n");
        self.buf.put_slice(body);
        self
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Everything appended since the last reset, written or not.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// The bytes that have not reached the socket yet.
    #[inline]
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.written..]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn is_drained(&self) -> bool {
        self.written == self.buf.len()
    }

    /// Logically empties the buffer; capacity is retained.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.written = 0;
    }

    /// Performs a single write of the pending bytes and advances the cursor.
    pub async fn write_to<W>(&mut self, writer: &mut W) -> io::Result<usize>
    where
        W: AsyncWrite + Unpin,
    {
        let n = writer.write(&self.buf[self.written..]).await?;
        self.written += n;
        Ok(n)
    }

    /// Writes until drained, then flushes `writer`.
    pub async fn flush_to<W>(&mut self, writer: &mut W) -> Result<(), SendError>
    where
        W: AsyncWrite + Unpin,
    {
        while !self.is_drained() {
            if self.write_to(writer).await? == 0 {
                return Err(SendError::WriteZero);
            }
        }
        writer.flush().await.map_err(SendError::io)
    }
}

/// Raw appends, so handlers can `write!` into the response.
impl Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
