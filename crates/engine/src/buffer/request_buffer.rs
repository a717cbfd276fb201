use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The bytes read from a connection and not yet framed into a request.
///
/// Each [`read_from`](Self::read_from) performs a single read into the spare
/// capacity, growing the buffer by the configured increment when the spare
/// room runs low. Framed requests are split off the front and share the
/// allocation until they are dropped; unframed bytes leave by copy, see
/// [`take`](Self::take).
#[derive(Debug)]
pub struct RequestBuffer {
    buf: BytesMut,
    growth: usize,
}

impl RequestBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), growth: capacity.max(MIN_GROWTH) }
    }

    /// Reads once from `reader`, suspending until the socket is readable.
    ///
    /// Returns the number of bytes appended; `0` means the peer closed.
    pub async fn read_from<R>(&mut self, reader: &mut R) -> io::Result<usize>
    where
        R: AsyncRead + Unpin,
    {
        if self.buf.capacity() - self.buf.len() < self.growth / 4 {
            self.buf.reserve(self.growth);
        }
        reader.read_buf(&mut self.buf).await
    }

    /// The underlying bytes, for decoders that split framed requests off the front.
    #[inline]
    pub fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Copies out every unframed byte and empties the buffer, which keeps
    /// its allocation.
    pub fn take(&mut self) -> BytesMut {
        let residual = BytesMut::from(&self.buf[..]);
        self.buf.clear();
        residual
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self { buf: BytesMut::new(), growth: MIN_GROWTH }
    }
}

impl AsRef<[u8]> for RequestBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

const MIN_GROWTH: usize = 512;
