//! Request framing over a growable buffer.
//!
//! - [`RequestDecoder`]: incremental state machine implementing
//!   [`tokio_util::codec::Decoder`], producing [`Frame`]s
//! - `head_decoder`: splits a located head into request line and header block
//!
//! The decoder never blocks and never reads from a socket: it inspects what
//! has been buffered so far and either frames something or asks for more.

mod head_decoder;
mod request_decoder;

pub use request_decoder::{DEFAULT_MAX_REQUEST_SIZE, Frame, MIN_REQUEST_PREFIX, RequestDecoder};
