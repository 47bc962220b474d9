//! In-memory input stream.

use std::io;

use bytes::{Buf, Bytes};

use crate::input_stream::InputStream;

/// Serves reads from an owned, in-memory buffer.
///
/// The stream takes ownership of the bytes it wraps and frees them when it
/// is dropped. Reads advance an internal cursor.
#[derive(Debug, Clone, Default)]
pub struct BufferInputStream {
    data: Bytes,
}

impl BufferInputStream {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }

    /// Number of bytes not yet read or skipped.
    pub fn remaining(&self) -> usize {
        self.data.remaining()
    }
}

impl From<Vec<u8>> for BufferInputStream {
    fn from(value: Vec<u8>) -> Self {
        Self::new(value)
    }
}

impl From<Bytes> for BufferInputStream {
    fn from(value: Bytes) -> Self {
        Self::new(value)
    }
}

impl InputStream for BufferInputStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.data.remaining());
        self.data.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }

    fn skip(&mut self, len: usize) -> io::Result<usize> {
        let n = len.min(self.data.remaining());
        self.data.advance(n);
        Ok(n)
    }
}
