//! Arrow-independent building blocks for `ipcstream`.
//!
//! This crate provides the [`InputStream`] pull contract with two reference
//! backings ([`BufferInputStream`], [`FileInputStream`]) and the envelope
//! framing primitives ([`read_frame`], [`skip_body`]) shared by the decoder
//! crates. Nothing here knows about the metadata encoding; frames carry their
//! metadata block as raw bytes.

mod buffer;
mod error;
mod file;
mod frame;
mod input_stream;

pub use buffer::BufferInputStream;
pub use error::{ErrorKind, FramingError};
pub use file::FileInputStream;
pub use frame::{CONTINUATION_MARKER, Frame, PREFIX_LEN, read_frame, skip_body};
pub use input_stream::InputStream;
