//! A cooperative, single-threaded HTTP/1.1 request engine
//!
//! This crate serves a very large number of connections with little per
//! connection overhead. Every accepted connection is a task on a tokio
//! [`LocalSet`](tokio::task::LocalSet): it reads, frames and answers requests
//! with non-blocking I/O, suspending whenever the socket has nothing to give
//! and resuming when the reactor reports it ready again.
//!
//! # Features
//!
//! - Incremental request framing over buffers filled in arbitrary chunks
//! - GET/HEAD requests without body, POST/PUT requests with a
//!   `Content-Length` body
//! - `Expect: 100-continue`
//! - Keep-alive per HTTP/1.0 and HTTP/1.1 rules, with pipelined requests
//! - Pooled, recycled per-connection buffers
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//! use http::StatusCode;
//! use micro_engine::handler::make_handler;
//! use micro_engine::server::Server;
//! use tracing::error;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let handler = make_handler(|request, response| {
//!         let body = request.body().unwrap_or(b"Hello World!\r\n");
//!         response.status(StatusCode::OK).header("Server", "micro").body(body);
//!         Ok::<(), Infallible>(())
//!     });
//!
//!     let server = match Server::builder().port(8080).bind(handler) {
//!         Ok(server) => server,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     server.run().await;
//! }
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several key modules:
//!
//! - [`server`]: listening socket setup and the accept loop
//! - [`connection`]: the per-connection pipeline, its pool and the idle
//!   dispatcher connections return to between requests
//! - [`codec`]: incremental request decoding
//! - [`buffer`]: growable request and response buffers
//! - [`protocol`]: the parsed request view, methods, fixed responses and errors
//! - [`handler`]: the request handler contract
//!
//! # Error Handling
//!
//! - [`protocol::ParseError`]: malformed or unsupported requests; each maps
//!   to a fixed response that is sent before the connection is closed
//! - [`protocol::SendError`]: a response could not be written
//! - [`server::ServerError`]: setup failures, naming the failing syscall
//!
//! Peer errors (a closed socket, a failed read or write) are never surfaced:
//! the connection is simply closed.
//!
//! # Limitations
//!
//! - HTTP/1.1 only, without chunked transfer encoding
//! - No TLS support (use a reverse proxy for HTTPS)
//! - Maximum number of headers: 64

pub mod buffer;
pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;
pub mod server;

mod utils;
pub(crate) use utils::ensure;
