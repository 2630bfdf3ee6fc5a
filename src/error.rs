//! Error types for Winegard rotator operations.

use crate::types::MenuContext;
use thiserror::Error;

/// Result type alias for rotator operations.
pub type Result<T> = std::result::Result<T, RotatorError>;

/// Error types for dish and control-client communication.
#[derive(Error, Debug)]
pub enum RotatorError {
    /// Serial port communication error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port could not be opened
    #[error("Unable to open serial port {port}: {source}")]
    TransportUnavailable {
        /// Port that failed to open
        port: String,
        /// Underlying serial error
        #[source]
        source: serialport::Error,
    },

    /// Transport used while closed
    #[error("Not connected")]
    NotConnected,

    /// No response terminator before the read timeout
    #[error("Communication timeout")]
    Timeout,

    /// Terminator seen but payload did not match the expected format
    #[error("Malformed response: expected {expected}, got {actual:?}")]
    MalformedResponse {
        /// Expected response format
        expected: String,
        /// Actual response received
        actual: String,
    },

    /// Operation issued from a menu where the device would reject it
    #[error("{operation} requires the {required} menu, device is in {actual}")]
    WrongContext {
        /// Operation that was attempted
        operation: &'static str,
        /// Menu the operation requires
        required: MenuContext,
        /// Menu the device is in, if known
        actual: ContextDisplay,
    },

    /// Control request with missing or unparseable fields
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Control request with an unrecognized command type
    #[error("Unknown command type {0}")]
    UnknownRequest(String),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Waiting for a client was cancelled by a shutdown request
    #[error("Cancelled")]
    Cancelled,
}

/// Display wrapper for a possibly unknown menu context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextDisplay(pub Option<MenuContext>);

impl std::fmt::Display for ContextDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(context) => write!(f, "{}", context),
            None => write!(f, "an unknown menu"),
        }
    }
}
