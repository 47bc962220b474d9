//! Pull-based reader for the Arrow IPC stream format.
//!
//! ```no_run
//! use ipcstream::{FileInputStream, StreamReader};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = StreamReader::new(FileInputStream::open("data.arrows")?);
//! println!("{}", reader.read_schema()?);
//! for batch in &mut reader {
//!     println!("{} rows", batch?.num_rows());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod reader;

pub use error::StreamReaderError;
pub use ipcstream_arrow as decode;
pub use ipcstream_arrow::{BufferPolicy, StreamSchema};
pub use ipcstream_core as core;
pub use ipcstream_core::{BufferInputStream, ErrorKind, FileInputStream, InputStream};
pub use reader::{ReaderStatus, StreamReader, StreamReaderBuilder};
