//! Error types for netconn

use thiserror::Error;

/// Main error type for netconn
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty conn")]
    EmptyConnection,

    #[error("Invalid address: {0}")]
    AddressResolution(String),

    #[error("Dial failed: {0}")]
    Dial(#[source] std::io::Error),

    #[error("Dial cancelled")]
    Cancelled,

    #[error("Bind failed: {0}")]
    Bind(#[source] std::io::Error),

    #[error("Not a listening conn")]
    NotListening,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

impl Error {
    /// True when a dial was aborted rather than refused
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// Result type alias for netconn
pub type Result<T> = std::result::Result<T, Error>;
