//! Pull contract for raw bytes.

use std::io;

const SKIP_SCRATCH_LEN: usize = 4096;

/// A source of raw bytes with at-least-partial read semantics.
///
/// Implementations may return fewer bytes than requested even when more are
/// available; callers that need an exact count use [`read_fully`] or
/// [`skip_fully`]. A return value of 0 for a non-empty request means the
/// source is exhausted. Read failures are reported through [`io::Error`],
/// never through the byte count.
///
/// Releasing a stream is dropping it.
///
/// [`read_fully`]: InputStream::read_fully
/// [`skip_fully`]: InputStream::skip_fully
pub trait InputStream {
    /// Read up to `buf.len()` bytes into `buf` and return how many were read.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Advance the source by up to `len` bytes without handing them out.
    ///
    /// Returns the number of bytes skipped, 0 only at end of source (or when
    /// `len` is 0). The default implementation reads into a scratch buffer.
    fn skip(&mut self, len: usize) -> io::Result<usize> {
        let mut scratch = [0u8; SKIP_SCRATCH_LEN];
        let n = len.min(SKIP_SCRATCH_LEN);
        self.read(&mut scratch[..n])
    }

    /// Read until `buf` is full or the source is exhausted.
    ///
    /// Returns the number of bytes read; a value smaller than `buf.len()`
    /// means the source ended.
    fn read_fully(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let requested = buf.len() - filled;
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) if n > requested => return Err(overread(n, requested)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    /// Skip until `len` bytes were skipped or the source is exhausted.
    fn skip_fully(&mut self, len: usize) -> io::Result<usize> {
        let mut skipped = 0;
        while skipped < len {
            let requested = len - skipped;
            match self.skip(requested) {
                Ok(0) => break,
                Ok(n) if n > requested => return Err(overread(n, requested)),
                Ok(n) => skipped += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(skipped)
    }
}

fn overread(reported: usize, requested: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("input stream reported {reported} bytes for a request of {requested}"),
    )
}

impl<S: InputStream + ?Sized> InputStream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn skip(&mut self, len: usize) -> io::Result<usize> {
        (**self).skip(len)
    }
}

impl<S: InputStream + ?Sized> InputStream for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn skip(&mut self, len: usize) -> io::Result<usize> {
        (**self).skip(len)
    }
}
