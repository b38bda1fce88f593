//! Error types for verification client operations

use std::io;
use thiserror::Error;

/// Result type for client operations
pub type RedisResult<T> = Result<T, RedisError>;

/// Error type for connection, command and parsing failures
///
/// Errors fall into three classes:
///
/// - network failures ([`Io`](Self::Io), [`Timeout`](Self::Timeout),
///   [`Connection`](Self::Connection)), which the retry executor retries after
///   discarding the transport;
/// - protocol or application failures, which surface to the caller at once;
/// - [`InvariantViolation`](Self::InvariantViolation), which the application
///   is expected to treat as fatal.
#[derive(Error, Debug)]
pub enum RedisError {
    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Read, write or dial deadline elapsed
    #[error("Operation timed out")]
    Timeout,

    /// The peer closed the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// Malformed RESP data on the wire
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server returned an error reply
    #[error("Server error: {0}")]
    Server(String),

    /// Authentication was rejected
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Reply did not have the shape the caller expected
    #[error("Type conversion error: {0}")]
    Type(String),

    /// Reply had a valid shape but unexpected content
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// `INFO` text could not be parsed
    #[error("Invalid info content: {0}")]
    InvalidInfo(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A reply broke an assumption about the server protocol
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl RedisError {
    /// Whether this error came from the network layer and may clear up after
    /// reconnecting.
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Timeout | Self::Connection(_))
    }

    /// Whether the server rejected the command because the key holds a
    /// different type.
    #[must_use]
    pub fn is_wrong_type(&self) -> bool {
        matches!(self, Self::Server(msg) if msg.starts_with("WRONGTYPE"))
    }

    /// Build the error returned when the peer closes the stream.
    #[must_use]
    pub fn closed_by_peer() -> Self {
        Self::Connection("Connection closed by server".to_string())
    }
}
