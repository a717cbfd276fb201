use std::error::Error;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Decoder;
use tracing::{debug, error, trace};

use crate::buffer::{RequestBuffer, ResponseBuffer};
use crate::codec::{DEFAULT_MAX_REQUEST_SIZE, Frame, RequestDecoder};
use crate::connection::HttpConnection;
use crate::handler::Handler;
use crate::protocol::{ParseError, Request, response};

/// Initial size, and growth increment, of both pipeline buffers.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Sizing of the buffers a pipeline instance is created with.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub buffer_size: usize,
    pub max_request_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { buffer_size: DEFAULT_BUFFER_SIZE, max_request_size: DEFAULT_MAX_REQUEST_SIZE }
    }
}

/// How a request/response cycle left its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The connection stays open and goes back to waiting for its next request.
    Persist,
    /// The connection must be closed.
    Close,
}

/// The per-cycle bundle bound to one connection for one request/response.
///
/// A cycle runs:
///
/// 1. read until the decoder frames a request, answering `100 Continue`
///    when a POST/PUT head asks for it
/// 2. hand the request to the handler, which fills the response buffer
/// 3. drain the response buffer to the socket
/// 4. keep any bytes read past the request on the connection when it
///    persists
///
/// Protocol errors replace steps 2 to 4 with a fixed response and close.
#[derive(Debug, Default)]
pub struct Pipeline {
    request: RequestBuffer,
    response: ResponseBuffer,
    decoder: RequestDecoder,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            request: RequestBuffer::with_capacity(config.buffer_size),
            response: ResponseBuffer::with_capacity(config.buffer_size),
            decoder: RequestDecoder::with_max_request_size(config.max_request_size),
        }
    }

    #[inline]
    pub fn request_buffer(&self) -> &RequestBuffer {
        &self.request
    }

    #[inline]
    pub fn response_buffer(&self) -> &ResponseBuffer {
        &self.response
    }

    /// Empties both buffers, keeping their capacity, and forgets any
    /// partially decoded request.
    pub fn reset(&mut self) {
        self.request.clear();
        self.response.reset();
        self.decoder.reset();
    }

    /// Runs one request/response cycle on `connection`.
    pub async fn run<T, H>(&mut self, connection: &mut HttpConnection<T>, handler: &H) -> Outcome
    where
        T: AsyncRead + AsyncWrite + Unpin,
        H: Handler,
    {
        if connection.has_residual() {
            let residual = connection.take_residual();
            trace!(len = residual.len(), "resuming from residual bytes");
            self.request.extend_from_slice(&residual);
        }

        let request = match self.read_request(connection.io_mut()).await {
            Ok(Some(request)) => request,
            Ok(None) => return Outcome::Close,
            Err(e) => {
                debug!(cause = %e, "rejecting request");
                self.response.extend_from_slice(e.response());
                self.write_response(connection.io_mut()).await;
                return Outcome::Close;
            }
        };

        let mut persistent = request.is_persistent();
        if let Err(e) = handler.call(&request, &mut self.response).await {
            let cause: Box<dyn Error + Send + Sync> = e.into();
            error!(%cause, method = %request.method(), uri = %request.uri(), "handler failed");
            self.response.reset();
            self.response.extend_from_slice(response::INTERNAL_SERVER_ERROR);
            persistent = false;
        }

        // release the request bytes before the buffer is reused
        drop(request);

        if !self.write_response(connection.io_mut()).await {
            persistent = false;
        }

        if persistent {
            connection.keep_residual(self.request.take());
            Outcome::Persist
        } else {
            Outcome::Close
        }
    }

    /// Reads until a request is framed.
    ///
    /// `Ok(None)` means the peer went away, either by closing, by a read
    /// error, or by refusing the provisional `100 Continue`.
    async fn read_request<T>(&mut self, io: &mut T) -> Result<Option<Request>, ParseError>
    where
        T: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            match self.decoder.decode(self.request.bytes_mut())? {
                Some(Frame::Request(request)) => return Ok(Some(request)),

                Some(Frame::Continue) => {
                    self.response.extend_from_slice(response::CONTINUE);
                    let sent = self.response.flush_to(io).await;
                    self.response.reset();

                    if let Err(e) = sent {
                        debug!(cause = %e, "failed to send 100 continue");
                        return Ok(None);
                    }
                    trace!("sent 100 continue");
                }

                None => match self.request.read_from(io).await {
                    Ok(0) => {
                        trace!(buffered = self.request.len(), "peer closed connection");
                        return Ok(None);
                    }
                    Ok(n) => trace!(n, "read request bytes"),
                    Err(e) => {
                        debug!(cause = %e, "failed to read request");
                        return Ok(None);
                    }
                },
            }
        }
    }

    /// Drains the response buffer; `false` when the socket refused it.
    async fn write_response<T>(&mut self, io: &mut T) -> bool
    where
        T: AsyncWrite + Unpin,
    {
        match self.response.flush_to(io).await {
            Ok(()) => true,
            Err(e) => {
                debug!(cause = %e, "failed to write response");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use http::StatusCode;
    use tokio::io::ReadBuf;

    use crate::handler::make_handler;
    use crate::protocol::Method;

    /// In-memory socket serving reads from a queue of chunks.
    ///
    /// With `yield_between_reads` every chunk after the first is preceded by
    /// one `Pending`, as a socket that has to wait for readiness would be.
    #[derive(Default)]
    struct MockIO {
        reads: VecDeque<Vec<u8>>,
        written: Vec<u8>,
        /// `written.len()` at the moment each chunk was read.
        written_at_read: Vec<usize>,
        yield_between_reads: bool,
        yielded: bool,
        fail_writes: bool,
    }

    impl MockIO {
        fn new<I: IntoIterator<Item = &'static [u8]>>(chunks: I) -> Self {
            Self { reads: chunks.into_iter().map(<[u8]>::to_vec).collect(), ..Default::default() }
        }
    }

    impl AsyncRead for MockIO {
        fn poll_read(mut self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            if self.yield_between_reads && !self.written_at_read.is_empty() && !self.yielded {
                self.yielded = true;
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
            self.yielded = false;

            if let Some(mut chunk) = self.reads.pop_front() {
                let amt = chunk.len().min(buf.remaining());
                buf.put_slice(&chunk[..amt]);
                if amt < chunk.len() {
                    self.reads.push_front(chunk.split_off(amt));
                }
                let written = self.written.len();
                self.written_at_read.push(written);
            }
            Poll::Ready(Ok(()))
        }
    }

    impl AsyncWrite for MockIO {
        fn poll_write(mut self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
            if self.fail_writes {
                return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
            }
            self.written.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Seen {
        method: Method,
        uri: String,
        headers: Vec<u8>,
        body: Option<Vec<u8>>,
    }

    /// Runs one cycle with a handler that records the request and answers
    /// `200` with the URI as body.
    async fn run_cycle(connection: &mut HttpConnection<MockIO>, seen: &RefCell<Vec<Seen>>) -> Outcome {
        let handler = make_handler(|request: &Request, response: &mut ResponseBuffer| {
            seen.borrow_mut().push(Seen {
                method: request.method(),
                uri: request.uri().to_string(),
                headers: request.headers().to_vec(),
                body: request.body().map(<[u8]>::to_vec),
            });
            response.status(StatusCode::OK).body(request.uri_bytes());
            Ok::<(), Infallible>(())
        });

        Pipeline::new(PipelineConfig::default()).run(connection, &handler).await
    }

    fn ok_response(uri: &str) -> Vec<u8> {
        format!("HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n{uri}", uri.len()).into_bytes()
    }

    #[tokio::test]
    async fn test_get_persists() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"GET /x HTTP/1.1\r\n\r\n"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert_eq!(
            seen.borrow()[..],
            [Seen { method: Method::Get, uri: "/x".into(), headers: vec![], body: None }]
        );
        assert_eq!(connection.io().written, ok_response("/x"));
        assert!(!connection.has_residual());
    }

    #[tokio::test]
    async fn test_post_across_chunks() {
        let seen = RefCell::new(vec![]);
        let mut io = MockIO::new([&b"POST /y HT"[..], b"TP/1.1\r\nContent-Len", b"gth: 3\r\n\r\na", b"bc"]);
        io.yield_between_reads = true;
        let mut connection = HttpConnection::new(io);

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert_eq!(
            seen.borrow()[..],
            [Seen {
                method: Method::Post,
                uri: "/y".into(),
                headers: b"Content-Length: 3".to_vec(),
                body: Some(b"abc".to_vec()),
            }]
        );
        assert_eq!(connection.io().written, ok_response("/y"));
    }

    #[tokio::test]
    async fn test_unsupported_method_closes() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"DELETE /z HTTP/1.1\r\n\r\n"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert!(seen.borrow().is_empty());
        assert_eq!(connection.io().written, b"HTTP/1.1 501 Not Implemented\r\nServer: test\r\nConnection: close\r\n\r\n");
    }

    #[tokio::test]
    async fn test_length_required_closes() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"PUT /y HTTP/1.1\r\nHost: a\r\n\r\nabc"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert!(seen.borrow().is_empty());
        assert_eq!(connection.io().written, response::LENGTH_REQUIRED);
    }

    #[tokio::test]
    async fn test_expect_continue_before_body() {
        let seen = RefCell::new(vec![]);
        let mut io = MockIO::new([&b"PUT /u HTTP/1.1\r\nExpect: 100-continue\r\nContent-Length: 2\r\n\r\n"[..], b"ok"]);
        io.yield_between_reads = true;
        let mut connection = HttpConnection::new(io);

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert_eq!(seen.borrow()[0].body, Some(b"ok".to_vec()));

        let io = connection.io();
        // the body was read only after the provisional reply went out
        assert_eq!(io.written_at_read, [0, response::CONTINUE.len()]);
        assert_eq!(&io.written[..response::CONTINUE.len()], response::CONTINUE);
        assert_eq!(&io.written[response::CONTINUE.len()..], ok_response("/u"));
    }

    #[tokio::test]
    async fn test_expect_continue_without_length() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"POST /u HTTP/1.1\r\nExpect: 100-continue\r\n\r\n"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert!(seen.borrow().is_empty());
        assert_eq!(connection.io().written, [response::CONTINUE, response::LENGTH_REQUIRED].concat());
    }

    #[tokio::test]
    async fn test_connection_close_header() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert_eq!(connection.io().written, ok_response("/"));
    }

    #[tokio::test]
    async fn test_http10_persistence() {
        let seen = RefCell::new(vec![]);

        let mut connection = HttpConnection::new(MockIO::new([&b"GET / HTTP/1.0\r\n\r\n"[..]]));
        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);

        let mut connection = HttpConnection::new(MockIO::new([&b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n"[..]]));
        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
    }

    #[tokio::test]
    async fn test_handler_error_answers_500() {
        let handler = make_handler(|_request: &Request, response: &mut ResponseBuffer| {
            response.status(StatusCode::OK).header("X-Partial", "yes");
            Err(io::Error::other("boom"))
        });
        let mut connection = HttpConnection::new(MockIO::new([&b"GET /x HTTP/1.1\r\n\r\n"[..]]));

        let outcome = Pipeline::default().run(&mut connection, &handler).await;

        assert_eq!(outcome, Outcome::Close);
        assert_eq!(connection.io().written, response::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_write_error_closes() {
        let seen = RefCell::new(vec![]);
        let mut io = MockIO::new([&b"GET /x HTTP/1.1\r\n\r\n"[..]]);
        io.fail_writes = true;
        let mut connection = HttpConnection::new(io);

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_peer_closes_mid_request() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"GET /x HT"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert!(seen.borrow().is_empty());
        assert!(connection.io().written.is_empty());
    }

    #[tokio::test]
    async fn test_pipelined_requests_use_residual() {
        let seen = RefCell::new(vec![]);
        let mut connection =
            HttpConnection::new(MockIO::new([&b"GET /a HTTP/1.1\r\n\r\nPOST /b HTTP/1.1\r\nContent-Length: 1\r\n\r\nz"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert!(connection.has_residual());

        // the second cycle never reads: the socket has nothing more to give
        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert!(!connection.has_residual());

        let seen = seen.borrow();
        assert_eq!(seen[0].uri, "/a");
        assert_eq!(seen[1].uri, "/b");
        assert_eq!(seen[1].body, Some(b"z".to_vec()));
        assert_eq!(connection.io().written, [ok_response("/a"), ok_response("/b")].concat());
    }

    #[tokio::test]
    async fn test_reset_after_cycle() {
        let handler = make_handler(|_request: &Request, response: &mut ResponseBuffer| {
            response.status(StatusCode::NO_CONTENT).extend_from_slice(b"\r\n");
            Ok::<(), Infallible>(())
        });
        let mut connection = HttpConnection::new(MockIO::new([&b"HEAD / HTTP/1.1\r\n\r\n"[..]]));
        let mut pipeline = Pipeline::new(PipelineConfig { buffer_size: 1024, max_request_size: 4096 });

        assert_eq!(pipeline.run(&mut connection, &handler).await, Outcome::Persist);
        assert!(!pipeline.response_buffer().is_empty());

        pipeline.reset();
        assert!(pipeline.request_buffer().is_empty());
        assert!(pipeline.response_buffer().is_empty());
        assert!(pipeline.response_buffer().is_drained());
    }

    #[tokio::test]
    async fn test_get_body_is_not_taken_for_next_request() {
        let seen = RefCell::new(vec![]);
        let mut connection =
            HttpConnection::new(MockIO::new([&b"GET /x HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET /y HTTP/1.1\r\n\r\n"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].body, None);
        assert_eq!(seen[1].uri, "/y");
        assert_eq!(connection.io().written, [ok_response("/x"), ok_response("/y")].concat());
    }

    #[tokio::test]
    async fn test_long_header_block_reaches_handler() {
        let mut request = b"GET /many HTTP/1.1\r\n".to_vec();
        for i in 0..65 {
            request.extend_from_slice(format!("X-H{i}: v\r\n").as_bytes());
        }
        request.extend_from_slice(b"Connection: close\r\n\r\n");
        let request: &'static [u8] = request.leak();

        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([request]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Close);
        assert_eq!(seen.borrow()[0].uri, "/many");
        assert_eq!(connection.io().written, ok_response("/many"));
    }

    #[tokio::test]
    async fn test_non_utf8_uri_reaches_handler() {
        let seen = RefCell::new(vec![]);
        let mut connection = HttpConnection::new(MockIO::new([&b"GET /caf\xe9 HTTP/1.1\r\n\r\n"[..]]));

        assert_eq!(run_cycle(&mut connection, &seen).await, Outcome::Persist);
        assert_eq!(seen.borrow()[0].uri, "/caf\u{fffd}");
        assert_eq!(connection.io().written, b"HTTP/1.1 200 OK\r\ncontent-length: 5\r\n\r\n/caf\xe9");
    }
}
