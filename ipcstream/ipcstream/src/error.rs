//! Error types for the stream reader.

use std::sync::Arc;

use ipcstream_arrow::DecodeError;
use ipcstream_core::ErrorKind;

/// Errors produced by [`StreamReader`](crate::StreamReader).
///
/// Cloning is cheap; decode errors are shared behind an `Arc` so the reader
/// can keep the error that stopped it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StreamReaderError {
    /// Framing, metadata or batch decoding failed.
    #[error(transparent)]
    Decode(Arc<DecodeError>),

    /// The input ended (or held only an end-of-stream marker) before a schema.
    #[error("No data available on stream")]
    NoData,

    /// A single-field projection was requested.
    #[error("Field index {index} is not yet supported (only all fields)")]
    UnsupportedFieldIndex { index: usize },

    /// The reader already failed; wraps the error that stopped it.
    #[error(transparent)]
    Terminated(Box<StreamReaderError>),
}

impl StreamReaderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StreamReaderError::Decode(e) => e.kind(),
            StreamReaderError::NoData => ErrorKind::NoData,
            StreamReaderError::UnsupportedFieldIndex { .. } => ErrorKind::Unsupported,
            StreamReaderError::Terminated(e) => e.kind(),
        }
    }

    /// The decode error behind this error, looking through [`Terminated`](Self::Terminated).
    pub fn as_decode_error(&self) -> Option<&DecodeError> {
        match self {
            StreamReaderError::Decode(e) => Some(&**e),
            StreamReaderError::Terminated(e) => e.as_decode_error(),
            _ => None,
        }
    }
}

impl From<DecodeError> for StreamReaderError {
    fn from(e: DecodeError) -> Self {
        StreamReaderError::Decode(Arc::new(e))
    }
}
