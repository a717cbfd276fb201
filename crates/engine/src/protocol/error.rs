use std::io;
use thiserror::Error;

use crate::protocol::response;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("unsupported http method")]
    UnsupportedMethod,

    #[error("content-length header is required")]
    LengthRequired,

    #[error("request size too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeRequest { current_size: usize, max_size: usize },

    #[error("invalid content-length header: {reason}")]
    InvalidContentLength { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn too_large_request(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeRequest { current_size, max_size }
    }

    pub fn invalid_content_length<S: ToString>(str: S) -> Self {
        Self::InvalidContentLength { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// The fixed response the engine sends before closing the connection.
    pub fn response(&self) -> &'static [u8] {
        match self {
            Self::UnsupportedMethod => response::NOT_IMPLEMENTED,
            Self::LengthRequired => response::LENGTH_REQUIRED,
            Self::TooLargeRequest { .. } => response::PAYLOAD_TOO_LARGE,
            Self::InvalidContentLength { .. } => response::BAD_REQUEST,
            Self::Io { .. } => response::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("connection refused further response bytes")]
    WriteZero,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
