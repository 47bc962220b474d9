//! Decoding of Arrow IPC stream messages into Arrow structures.
//!
//! [`read_envelope`] frames the next message and verifies its metadata,
//! [`decode_schema`] turns a Schema envelope into a [`StreamSchema`] and
//! [`BatchDecoder`] materializes RecordBatch and DictionaryBatch bodies.
//! Callers own the ordering of messages; see the `ipcstream` crate for the
//! stream state machine built on top of these pieces.

mod batch;
mod body;
mod dictionary;
mod envelope;
mod error;
mod schema;

pub use batch::BatchDecoder;
pub use body::BufferPolicy;
pub use dictionary::DictionaryStore;
pub use envelope::{Envelope, MessageKind, read_envelope};
pub use error::DecodeError;
pub use schema::{DictionaryEncoding, FieldDescriptor, StreamSchema, decode_schema};
