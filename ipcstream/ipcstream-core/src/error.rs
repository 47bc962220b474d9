//! Error types for input streams and envelope framing.

use std::io;

/// Coarse error category shared by every `ipcstream` error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Framing prefix missing, truncated, or inconsistent.
    MalformedStream,
    /// Metadata block fails to decode or declares an inconsistent layout.
    MalformedMetadata,
    /// A message kind that is not valid in the current reader state.
    UnexpectedMessage,
    /// A schema was requested but the source held no message at all.
    NoData,
    /// Syntactically valid input or configuration that is not implemented.
    Unsupported,
    /// The underlying input stream failed.
    Io,
    /// Internal consistency check failed.
    Internal,
}

/// Errors produced while pulling envelopes off an [`InputStream`](crate::InputStream).
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// The backing source reported a read failure.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Input ended inside the 8-byte envelope prefix.
    #[error("Expected at least 8 bytes in remainder of stream")]
    TruncatedPrefix { available: usize },

    /// The envelope did not start with the continuation marker.
    #[error("Expected 0xFFFFFFFF at start of message but found 0x{found:08X}")]
    MissingContinuation { found: u32 },

    /// Input ended inside a metadata block.
    #[error("Expected {expected} bytes of message metadata but found {actual}")]
    TruncatedMetadata { expected: usize, actual: usize },

    /// Input ended inside a message body.
    #[error("Expected {expected} bytes of message body but found {actual}")]
    TruncatedBody { expected: usize, actual: usize },
}

impl FramingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FramingError::Io(_) => ErrorKind::Io,
            FramingError::TruncatedPrefix { .. }
            | FramingError::MissingContinuation { .. }
            | FramingError::TruncatedMetadata { .. }
            | FramingError::TruncatedBody { .. } => ErrorKind::MalformedStream,
        }
    }
}
