//! Error types for talking to a coordinator.

use std::io;

/// Failure of a single request/response exchange with the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The coordinator could not be reached.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The coordinator answered with something other than 200.
    #[error("Coordinator returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
