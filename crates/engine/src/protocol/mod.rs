//! Core HTTP protocol types.
//!
//! # Architecture
//!
//! - **Methods** ([`Method`]): the four methods the engine frames; everything
//!   else is answered with `501 Not Implemented`
//! - **Requests** ([`Request`]): the parsed view handed to handlers
//! - **Engine responses** ([`response`]): the fixed replies for protocol
//!   errors and the provisional `100 Continue`
//! - **Header rules** (`header`): persistence, expect-continue and
//!   content-length interpretation
//! - **Error handling** ([`ParseError`], [`SendError`])

mod method;
pub use method::Method;

mod request;
pub use request::Request;
pub(crate) use request::RequestHead;

pub(crate) mod header;

pub mod response;

mod error;
pub use error::ParseError;
pub use error::SendError;
