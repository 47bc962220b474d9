//! Buffer extraction from a message body.

use arrow::buffer::Buffer;

use crate::error::DecodeError;

/// How array buffers relate to the message body they were decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferPolicy {
    /// Buffers are reference-counted slices of the body; no bytes are copied.
    #[default]
    Shared,
    /// Every buffer is copied into its own allocation.
    Private,
}

/// A fully read message body plus the policy used to hand out its buffers.
#[derive(Debug, Clone)]
pub(crate) struct MessageBody {
    data: Buffer,
    policy: BufferPolicy,
}

impl MessageBody {
    pub(crate) fn new(data: Buffer, policy: BufferPolicy) -> Self {
        Self { data, policy }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// Extract buffer `index` declared at `offset..offset + length`.
    pub(crate) fn buffer(
        &self,
        index: usize,
        offset: i64,
        length: i64,
    ) -> Result<Buffer, DecodeError> {
        let range = usize::try_from(offset)
            .ok()
            .zip(usize::try_from(length).ok())
            .and_then(|(start, len)| Some((start, start.checked_add(len)?)))
            .filter(|(_, end)| *end <= self.data.len());

        let Some((start, end)) = range else {
            return Err(DecodeError::invalid_batch(format!(
                "buffer {index} at offset {offset} with length {length} exceeds the message body of {} bytes",
                self.data.len()
            )));
        };

        Ok(match self.policy {
            BufferPolicy::Shared => self.data.slice_with_length(start, end - start),
            BufferPolicy::Private => Buffer::from_slice_ref(&self.data.as_slice()[start..end]),
        })
    }
}
