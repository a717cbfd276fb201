//! The request handler contract.
//!
//! A [`Handler`] receives the framed [`Request`] and fills the pipeline's
//! [`ResponseBuffer`]. It runs inside the connection's task and may
//! suspend; the engine writes the response once it returns.
//!
//! Returning an error discards whatever was appended to the response and
//! answers with the fixed `500 Internal Server Error`, closing the
//! connection.
//!
//! ```
//! use std::convert::Infallible;
//! use http::StatusCode;
//! use micro_engine::handler::make_handler;
//!
//! let handler = make_handler(|request, response| {
//!     response.status(StatusCode::OK).body(request.uri_bytes());
//!     Ok::<(), Infallible>(())
//! });
//! # let _ = handler;
//! ```

use std::error::Error;

use async_trait::async_trait;

use crate::buffer::ResponseBuffer;
use crate::protocol::Request;

#[async_trait(?Send)]
pub trait Handler {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, request: &Request, response: &mut ResponseBuffer) -> Result<(), Self::Error>;
}

/// A [`Handler`] backed by a plain closure, see [`make_handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait(?Send)]
impl<F, Err> Handler for HandlerFn<F>
where
    F: Fn(&Request, &mut ResponseBuffer) -> Result<(), Err>,
    Err: Into<Box<dyn Error + Send + Sync>>,
{
    type Error = Err;

    async fn call(&self, request: &Request, response: &mut ResponseBuffer) -> Result<(), Self::Error> {
        (self.f)(request, response)
    }
}

pub fn make_handler<F, Err>(f: F) -> HandlerFn<F>
where
    F: Fn(&Request, &mut ResponseBuffer) -> Result<(), Err>,
    Err: Into<Box<dyn Error + Send + Sync>>,
{
    HandlerFn { f }
}
