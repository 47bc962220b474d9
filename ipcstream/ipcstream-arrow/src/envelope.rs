//! Envelope decoding on top of [`ipcstream_core::read_frame`].

use arrow::{
    buffer::{Buffer, MutableBuffer},
    ipc::{self, MessageHeader, MetadataVersion},
};
use ipcstream_core::{Frame, FramingError, InputStream, read_frame, skip_body};

use crate::error::DecodeError;

// Growth step for body allocations; see `Envelope::read_body`.
const BODY_CHUNK_LEN: usize = 1024 * 1024;

/// Kind of message carried by an [`Envelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Schema,
    RecordBatch,
    DictionaryBatch,
    Tensor,
    SparseTensor,
    /// Zero-length envelope terminating the stream.
    EndOfStream,
    /// Header type outside the known set (including `NONE`).
    Unknown,
}

impl From<MessageHeader> for MessageKind {
    fn from(header: MessageHeader) -> Self {
        match header {
            MessageHeader::Schema => MessageKind::Schema,
            MessageHeader::RecordBatch => MessageKind::RecordBatch,
            MessageHeader::DictionaryBatch => MessageKind::DictionaryBatch,
            MessageHeader::Tensor => MessageKind::Tensor,
            MessageHeader::SparseTensor => MessageKind::SparseTensor,
            _ => MessageKind::Unknown,
        }
    }
}

/// A framed message whose metadata has been verified but whose body is still
/// unread in the input stream.
///
/// Whoever receives an envelope is responsible for consuming exactly
/// [`body_length`](Envelope::body_length) bytes, through [`read_body`] or
/// [`skip_body`], before the next envelope is framed.
///
/// [`read_body`]: Envelope::read_body
/// [`skip_body`]: Envelope::skip_body
#[derive(Debug, Clone)]
pub struct Envelope {
    kind: MessageKind,
    metadata: Vec<u8>,
    body_length: usize,
}

impl Envelope {
    fn end_of_stream() -> Self {
        Self {
            kind: MessageKind::EndOfStream,
            metadata: Vec::new(),
            body_length: 0,
        }
    }

    /// Verify a raw metadata block and capture its kind and body length.
    pub fn from_metadata(metadata: Vec<u8>) -> Result<Self, DecodeError> {
        let message = parse_message(&metadata)?;

        let version = message.version();
        if version.0 < MetadataVersion::V4.0 {
            return Err(DecodeError::unsupported(format!(
                "metadata version {version:?}"
            )));
        }

        let declared = message.bodyLength();
        let body_length =
            usize::try_from(declared).map_err(|_| DecodeError::InvalidMetadata {
                detail: format!("negative body length {declared}"),
            })?;
        let kind = MessageKind::from(message.header_type());

        Ok(Self {
            kind,
            metadata,
            body_length,
        })
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn body_length(&self) -> usize {
        self.body_length
    }

    pub fn metadata(&self) -> &[u8] {
        &self.metadata
    }

    /// Structured view over the metadata block.
    pub fn message(&self) -> Result<ipc::Message<'_>, DecodeError> {
        parse_message(&self.metadata)
    }

    /// Consume the body without materializing it.
    pub fn skip_body<S: InputStream + ?Sized>(&self, stream: &mut S) -> Result<(), DecodeError> {
        skip_body(stream, self.body_length)?;
        Ok(())
    }

    /// Read the whole body into one 64-byte aligned, reference-counted buffer.
    ///
    /// The allocation grows in steps while reading so that a corrupt body
    /// length fails on the short read rather than on a huge reservation.
    pub fn read_body<S: InputStream + ?Sized>(
        &self,
        stream: &mut S,
    ) -> Result<Buffer, DecodeError> {
        let len = self.body_length;
        let mut body = MutableBuffer::with_capacity(len.min(BODY_CHUNK_LEN));
        while body.len() < len {
            let start = body.len();
            let step = (len - start).min(BODY_CHUNK_LEN);
            body.extend_zeros(step);
            let n = stream
                .read_fully(&mut body.as_slice_mut()[start..])
                .map_err(FramingError::from)?;
            if n < step {
                return Err(FramingError::TruncatedBody {
                    expected: len,
                    actual: start + n,
                }
                .into());
            }
        }
        Ok(body.into())
    }
}

/// Frame and verify the next envelope.
///
/// Returns `Ok(None)` when the input is exhausted at an envelope boundary.
pub fn read_envelope<S: InputStream + ?Sized>(
    stream: &mut S,
) -> Result<Option<Envelope>, DecodeError> {
    let envelope = match read_frame(stream)? {
        None => return Ok(None),
        Some(Frame::EndOfStream) => Envelope::end_of_stream(),
        Some(Frame::Message(metadata)) => Envelope::from_metadata(metadata)?,
    };
    log::trace!(
        "read {:?} envelope ({} metadata bytes, {} body bytes)",
        envelope.kind,
        envelope.metadata.len(),
        envelope.body_length
    );
    Ok(Some(envelope))
}

fn parse_message(metadata: &[u8]) -> Result<ipc::Message<'_>, DecodeError> {
    ipc::root_as_message(metadata).map_err(|e| DecodeError::InvalidMetadata {
        detail: e.to_string(),
    })
}
