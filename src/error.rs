//! Error types for eiscp
//!
//! Provides a unified error type for all operations.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using EiscpError
pub type Result<T> = std::result::Result<T, EiscpError>;

/// Unified error type for eiscp operations
#[derive(Debug, Error)]
pub enum EiscpError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Wire Errors
    // -------------------------------------------------------------------------
    /// Bad magic, bad header length or an undecodable payload.
    /// The stream should be treated as desynchronized.
    #[error("Framing error: {0}")]
    Framing(String),

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("Connection to {addr} failed: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timeout waiting for response to {message} after {elapsed:?}")]
    Timeout { message: String, elapsed: Duration },

    #[error("Connection closed by peer")]
    PeerClosed,

    #[error("Worker stopped")]
    WorkerStopped,

    // -------------------------------------------------------------------------
    // Translation Errors
    // -------------------------------------------------------------------------
    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Catalogue error: {0}")]
    Catalogue(String),

    // -------------------------------------------------------------------------
    // Document Errors
    // -------------------------------------------------------------------------
    #[error("Document error: {0}")]
    Document(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EiscpError {
    /// Shorthand for a translation error with a formatted message
    pub(crate) fn translation(message: impl Into<String>) -> Self {
        EiscpError::Translation(message.into())
    }

    /// True for errors after which the connection can keep being used
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EiscpError::Timeout { .. } | EiscpError::Translation(_) | EiscpError::PeerClosed
        )
    }
}
