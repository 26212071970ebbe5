//! Error handling for Eggplot
//!
//! Provides error types for all layers of the toolkit:
//! - Import errors (SVG parsing / layer-mode configuration)
//! - Transport errors (file storage and print APIs)
//! - Connection errors (live status feed)
//!
//! All error types use `thiserror` for ergonomic error handling. User
//! cancellation is modeled as a distinguished `Error::Cancelled` variant so
//! cancel flows are never reported as failures.

use thiserror::Error;

/// Import error type
///
/// Fatal errors raised while turning source art into layers. Unrecognized
/// path commands are deliberately *not* represented here: the segmenter
/// logs and drops them, and segmentation continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The source is not a parseable SVG document
    #[error("invalid SVG document: {reason}")]
    InvalidDocument {
        /// Why the document was rejected.
        reason: String,
    },

    /// The requested layer-resolution mode is not supported
    #[error("unsupported layer resolve mode: {mode}")]
    UnsupportedLayerMode {
        /// The mode string that was requested.
        mode: String,
    },
}

/// Transport error type
///
/// Failures from the external file-storage and print APIs. Operations that
/// fail with a transport error must leave local caches untouched.
#[derive(Error, Debug)]
pub enum TransportError {
    /// No file with the given name exists
    #[error("file not found: {name}")]
    NotFound {
        /// The requested file name.
        name: String,
    },

    /// A file with the given name already exists
    #[error("file already exists: {name}")]
    AlreadyExists {
        /// The conflicting file name.
        name: String,
    },

    /// Underlying storage I/O failure
    #[error("storage I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// Generic transport error
    #[error("transport error: {message}")]
    Other {
        /// The error message.
        message: String,
    },
}

/// Connection error type
///
/// Failures of the live status feed. All of these trigger the reconnect
/// loop; none are fatal to the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The feed disconnected
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Why the connection dropped.
        reason: String,
    },

    /// No heartbeat response within the timeout window
    #[error("heartbeat missed after {timeout_ms}ms")]
    HeartbeatTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// A status message could not be decoded
    #[error("malformed status message: {reason}")]
    BadMessage {
        /// Why the message was rejected.
        reason: String,
    },
}

/// Main error type for Eggplot
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Import error
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The user cancelled the operation; not a failure
    #[error("operation cancelled")]
    Cancelled,

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is the distinguished cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if this is an import error
    pub fn is_import_error(&self) -> bool {
        matches!(self, Error::Import(_))
    }

    /// Check if this is a transport error
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
