//! Error types for the domain stats store

use thiserror::Error;

/// Main error type for domain stats operations
#[derive(Error, Debug)]
pub enum Error {
    /// The key-value store could not be reached or rejected the command
    ///
    /// The message never contains credentials from the store URL.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// A value could not be serialized into a store payload
    #[error("Encode error: {0}")]
    Encode(String),

    /// A store payload could not be deserialized
    #[error("Decode error: {0}")]
    Decode(String),

    /// Range bounds are reversed
    #[error("Invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Normalized start of the range
        start: String,
        /// Normalized end of the range
        end: String,
    },

    /// The call context was cancelled before the store answered
    #[error("Operation cancelled")]
    Cancelled,

    /// The call context deadline passed before the store answered
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// True for failures caused by the call context rather than the store
    pub fn is_context_error(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
