//! Error types for envelope, schema and batch decoding.

use arrow::error::ArrowError;
use ipcstream_core::{ErrorKind, FramingError};

use crate::envelope::MessageKind;

/// Errors produced while decoding IPC messages into Arrow structures.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Framing failure or I/O error from the input stream.
    #[error(transparent)]
    Framing(#[from] FramingError),

    /// The metadata block could not be verified as a flatbuffer `Message`.
    #[error("Failed to decode message metadata: {detail}")]
    InvalidMetadata { detail: String },

    /// A Schema message was required.
    #[error("Unexpected message type at start of input (expected Schema)")]
    ExpectedSchema { found: MessageKind },

    /// A RecordBatch message was required.
    #[error("Unexpected message type (expected RecordBatch)")]
    ExpectedRecordBatch { found: MessageKind },

    /// The schema describes a field tree that cannot be materialized.
    #[error("Invalid schema: {detail}")]
    InvalidSchema { detail: String },

    /// Field nodes or buffers do not match the schema or the body.
    #[error("Invalid record batch: {detail}")]
    InvalidBatch { detail: String },

    /// Buffers of a node failed Arrow layout validation.
    #[error("Invalid data for field '{field}': {source}")]
    ArrayData {
        field: String,
        #[source]
        source: ArrowError,
    },

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// Valid input that this decoder does not implement.
    #[error("{feature} is not supported")]
    Unsupported { feature: String },

    /// Internal consistency check failed.
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::Framing(e) => e.kind(),
            DecodeError::InvalidMetadata { .. }
            | DecodeError::InvalidSchema { .. }
            | DecodeError::InvalidBatch { .. }
            | DecodeError::ArrayData { .. }
            | DecodeError::Arrow(_) => ErrorKind::MalformedMetadata,
            DecodeError::ExpectedSchema { .. } | DecodeError::ExpectedRecordBatch { .. } => {
                ErrorKind::UnexpectedMessage
            }
            DecodeError::Unsupported { .. } => ErrorKind::Unsupported,
            DecodeError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn invalid_batch(detail: impl Into<String>) -> Self {
        DecodeError::InvalidBatch {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_schema(detail: impl Into<String>) -> Self {
        DecodeError::InvalidSchema {
            detail: detail.into(),
        }
    }

    pub(crate) fn unsupported(feature: impl Into<String>) -> Self {
        DecodeError::Unsupported {
            feature: feature.into(),
        }
    }
}
