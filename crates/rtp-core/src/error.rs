use thiserror::Error;
use std::io;

/// Error type for RTP operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer too small
    #[error("Buffer too small for RTP packet: need {required} but have {available}")]
    BufferTooSmall {
        required: usize,
        available: usize,
    },

    /// Invalid packet format
    #[error("Invalid RTP packet format: {0}")]
    InvalidPacket(String),

    /// Invalid parameter for RTP operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be read or parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}
