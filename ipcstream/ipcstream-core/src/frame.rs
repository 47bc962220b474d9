//! Envelope framing: continuation marker, length prefix and metadata block.

use crate::{error::FramingError, input_stream::InputStream};

/// Marker preceding every envelope's metadata length.
pub const CONTINUATION_MARKER: u32 = 0xFFFF_FFFF;

/// Size of the continuation marker plus the metadata length.
pub const PREFIX_LEN: usize = 8;

// Upper bound for a single allocation step while reading a declared length,
// so that a corrupt length does not reserve gigabytes before the input runs out.
const READ_CHUNK_LEN: usize = 64 * 1024;

/// One framed envelope with its metadata block still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Zero metadata length: the canonical end-of-stream envelope.
    EndOfStream,
    /// Raw metadata block. The message body, if any, has not been read.
    Message(Vec<u8>),
}

/// Read the next envelope prefix and metadata block.
///
/// Returns `Ok(None)` when the source is exhausted exactly at an envelope
/// boundary.
pub fn read_frame<S: InputStream + ?Sized>(stream: &mut S) -> Result<Option<Frame>, FramingError> {
    let mut prefix = [0u8; PREFIX_LEN];
    let available = stream.read_fully(&mut prefix)?;
    if available == 0 {
        return Ok(None);
    }
    if available < PREFIX_LEN {
        return Err(FramingError::TruncatedPrefix { available });
    }

    let marker = u32::from_le_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    if marker != CONTINUATION_MARKER {
        return Err(FramingError::MissingContinuation { found: marker });
    }

    let metadata_len = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]) as usize;
    if metadata_len == 0 {
        log::trace!("framed end-of-stream envelope");
        return Ok(Some(Frame::EndOfStream));
    }

    let metadata = read_exact_vec(stream, metadata_len)?;
    if metadata.len() < metadata_len {
        return Err(FramingError::TruncatedMetadata {
            expected: metadata_len,
            actual: metadata.len(),
        });
    }
    log::trace!("framed envelope with {metadata_len} metadata bytes");
    Ok(Some(Frame::Message(metadata)))
}

/// Consume a message body of `len` bytes without materializing it.
pub fn skip_body<S: InputStream + ?Sized>(stream: &mut S, len: usize) -> Result<(), FramingError> {
    let actual = stream.skip_fully(len)?;
    if actual < len {
        return Err(FramingError::TruncatedBody {
            expected: len,
            actual,
        });
    }
    Ok(())
}

fn read_exact_vec<S: InputStream + ?Sized>(
    stream: &mut S,
    len: usize,
) -> Result<Vec<u8>, FramingError> {
    let mut out = Vec::with_capacity(len.min(READ_CHUNK_LEN));
    while out.len() < len {
        let start = out.len();
        let step = (len - start).min(READ_CHUNK_LEN);
        out.resize(start + step, 0);
        let n = stream.read_fully(&mut out[start..])?;
        if n < step {
            out.truncate(start + n);
            break;
        }
    }
    Ok(out)
}
