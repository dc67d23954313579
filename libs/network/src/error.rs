//! Transport and recovery-state-machine error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("connection error: {message}")]
    Connection { message: String },

    #[error("decode error: {0}")]
    Decode(#[from] codec::DecodeError),

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("operation timed out: {operation} after {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NetworkError>;

impl NetworkError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, elapsed_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_ms,
        }
    }

    /// Worth retrying after backoff, as opposed to a configuration
    /// mistake that will fail identically every time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NetworkError::Network { .. }
                | NetworkError::Connection { .. }
                | NetworkError::Timeout { .. }
                | NetworkError::Io(_)
        )
    }
}
