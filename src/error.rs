//! Error types for HastaIO

pub use crate::codec::DecodeError;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// HastaIO error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured UDP port could not be bound
    #[error("failed to bind UDP port {port}: {source}")]
    Bind {
        /// Port that failed to bind
        port: u16,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// Malformed datagram payload
    #[error("datagram decode failed: {0}")]
    Decode(#[from] DecodeError),

    /// Socket-level receive failure other than the expected shutdown close
    #[error("socket receive failed: {0}")]
    Receive(std::io::Error),

    /// Invalid configuration, detected before any socket is bound
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}
