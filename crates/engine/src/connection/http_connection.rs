use bytes::BytesMut;

/// An accepted connection between request/response cycles.
///
/// Besides the socket it carries the residual bytes: whatever was read past
/// the end of the last request (a pipelined request, or part of one). The
/// next pipeline instance starts from those bytes instead of waiting for the
/// socket to become readable again.
#[derive(Debug)]
pub struct HttpConnection<T> {
    io: T,
    residual: BytesMut,
}

impl<T> HttpConnection<T> {
    pub fn new(io: T) -> Self {
        Self { io, residual: BytesMut::new() }
    }

    #[inline]
    pub fn io(&self) -> &T {
        &self.io
    }

    #[inline]
    pub fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    #[inline]
    pub fn has_residual(&self) -> bool {
        !self.residual.is_empty()
    }

    /// Takes the residual bytes, leaving none behind.
    pub fn take_residual(&mut self) -> BytesMut {
        self.residual.split()
    }

    /// Keeps bytes read past the end of the last request for the next cycle.
    pub fn keep_residual(&mut self, residual: BytesMut) {
        self.residual = residual;
    }

    pub fn into_inner(self) -> T {
        self.io
    }
}
