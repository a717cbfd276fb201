use std::io;
use thiserror::Error;

/// Fatal errors while setting up a server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A setup syscall failed; `operation` names it.
    #[error("{operation} failed: {source}")]
    Setup {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("address must be set")]
    MissingAddress,
}

impl ServerError {
    pub fn setup(operation: &'static str, source: io::Error) -> Self {
        Self::Setup { operation, source }
    }

    /// The failing syscall, if the error came from one.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Setup { operation, .. } => Some(operation),
            Self::MissingAddress => None,
        }
    }
}
