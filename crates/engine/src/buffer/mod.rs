//! Growable request and response buffers owned by a pipeline instance.
//!
//! - [`RequestBuffer`]: filled by single non-blocking reads, framed requests
//!   are split off its front
//! - [`ResponseBuffer`]: assembled by the handler (or the engine) and drained
//!   to the socket over as many writes as it takes

mod request_buffer;
mod response_buffer;

pub use request_buffer::RequestBuffer;
pub use response_buffer::ResponseBuffer;
