//! Error types for the receiver.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised outside the receive path: bridge process, configuration,
/// request transmission.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// I/O error talking to the bridge.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file did not parse.
    #[error("configuration parse error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Configuration parsed but holds unusable values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Bridge executable does not exist.
    #[error("bridge executable not found: {}", .0.display())]
    BridgeNotFound(PathBuf),

    /// Bridge process was never started or has been shut down.
    #[error("bridge process is not running")]
    BridgeNotRunning,

    /// Could not install the Ctrl-C handler.
    #[error("signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Result type alias for receiver operations.
pub type ReceiverResult<T> = Result<T, ReceiverError>;
