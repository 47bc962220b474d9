//! Buffered input stream over a file or any other [`Read`] source.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Read},
    path::Path,
};

use crate::input_stream::InputStream;

/// Reads through a [`BufReader`] over a file descriptor or any [`Read`] type.
///
/// Whether the descriptor is closed on release follows ownership: an owned
/// [`File`] is closed when the stream is dropped, while a borrowed reader
/// (`&File`, a locked stdin, ...) is left open. [`into_inner`] hands an owned
/// reader back without closing it.
///
/// [`into_inner`]: FileInputStream::into_inner
#[derive(Debug)]
pub struct FileInputStream<R = File> {
    reader: BufReader<R>,
}

impl FileInputStream<File> {
    /// Open `path` for reading. The file is closed when the stream is dropped.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> FileInputStream<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, inner),
        }
    }

    /// Release the stream without closing the underlying reader.
    ///
    /// Bytes already buffered but not yet read are discarded.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R: Read> InputStream for FileInputStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.reader.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => return result,
            }
        }
    }

    fn skip(&mut self, len: usize) -> io::Result<usize> {
        if len == 0 {
            return Ok(0);
        }
        let available = loop {
            match self.reader.fill_buf() {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                result => break result?.len(),
            }
        };
        let n = len.min(available);
        self.reader.consume(n);
        Ok(n)
    }
}
