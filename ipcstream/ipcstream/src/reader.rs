//! Pull-based Arrow IPC stream reader.

use arrow::{datatypes::SchemaRef, record_batch::RecordBatch};
use ipcstream_arrow::{
    BatchDecoder, BufferPolicy, DecodeError, DictionaryStore, MessageKind, StreamSchema,
    decode_schema, read_envelope,
};
use ipcstream_core::InputStream;

use crate::error::StreamReaderError;

/// Externally visible state of a [`StreamReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderStatus {
    /// No message has been read yet.
    AwaitingSchema,
    /// The schema is known; batches are being read.
    AwaitingBatchOrEnd,
    /// End of stream reached.
    Ended,
    /// An error stopped the reader.
    Errored,
}

/// Schema and dictionaries of a stream whose batches are being read.
#[derive(Debug)]
struct Session {
    schema: StreamSchema,
    dictionaries: DictionaryStore,
}

#[derive(Debug)]
enum ReaderState {
    AwaitingSchema,
    Streaming(Session),
    Ended(StreamSchema),
    Errored(StreamReaderError),
}

/// Reads an Arrow IPC stream from an [`InputStream`] one record batch at a time.
///
/// The first message must be a schema; it is read by [`read_schema`] or
/// implicitly by the first [`next_batch`]. Dictionary batches are applied as
/// they arrive. Once an error is returned the reader stays failed and every
/// later call reports a [`StreamReaderError::Terminated`] wrapping it.
///
/// [`read_schema`]: StreamReader::read_schema
/// [`next_batch`]: StreamReader::next_batch
#[derive(Debug)]
pub struct StreamReader<S> {
    stream: S,
    decoder: BatchDecoder,
    field_index: Option<usize>,
    state: ReaderState,
}

/// Builder for configuring [`StreamReader`].
#[derive(Debug, Clone)]
pub struct StreamReaderBuilder {
    field_index: Option<usize>,
    shared_buffers: bool,
}

impl StreamReader<()> {
    /// Create a builder for [`StreamReader`]. The input stream type is chosen
    /// by [`StreamReaderBuilder::build`].
    pub fn builder() -> StreamReaderBuilder {
        StreamReaderBuilder::default()
    }
}

impl<S: InputStream> StreamReader<S> {
    /// Reader over all fields with shared buffers.
    pub fn new(stream: S) -> Self {
        StreamReaderBuilder::default().build(stream)
    }

    /// Return the stream schema, reading it first if necessary.
    pub fn read_schema(&mut self) -> Result<SchemaRef, StreamReaderError> {
        match &self.state {
            ReaderState::AwaitingSchema => {}
            ReaderState::Streaming(session) => return Ok(session.schema.arrow_schema().clone()),
            ReaderState::Ended(schema) => return Ok(schema.arrow_schema().clone()),
            ReaderState::Errored(e) => return Err(terminated(e)),
        }

        match self.load_schema() {
            Ok(schema) => {
                let arrow = schema.arrow_schema().clone();
                log::debug!(
                    "schema read with {} fields; awaiting record batches",
                    arrow.fields().len()
                );
                self.state = ReaderState::Streaming(Session {
                    schema,
                    dictionaries: DictionaryStore::new(),
                });
                Ok(arrow)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Return the next record batch, or `None` once the stream has ended.
    pub fn next_batch(&mut self) -> Result<Option<RecordBatch>, StreamReaderError> {
        if matches!(self.state, ReaderState::AwaitingSchema) {
            self.read_schema()?;
        }
        match &self.state {
            ReaderState::Ended(_) => return Ok(None),
            ReaderState::Errored(e) => return Err(terminated(e)),
            ReaderState::AwaitingSchema | ReaderState::Streaming(_) => {}
        }

        match self.pull_batch() {
            Ok(Some(batch)) => Ok(Some(batch)),
            Ok(None) => {
                let state = std::mem::replace(&mut self.state, ReaderState::AwaitingSchema);
                self.state = match state {
                    ReaderState::Streaming(session) => ReaderState::Ended(session.schema),
                    other => other,
                };
                log::debug!("end of stream reached");
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// The error that stopped the reader, if any.
    pub fn last_error(&self) -> Option<&StreamReaderError> {
        match &self.state {
            ReaderState::Errored(e) => Some(e),
            _ => None,
        }
    }

    pub fn status(&self) -> ReaderStatus {
        match self.state {
            ReaderState::AwaitingSchema => ReaderStatus::AwaitingSchema,
            ReaderState::Streaming(_) => ReaderStatus::AwaitingBatchOrEnd,
            ReaderState::Ended(_) => ReaderStatus::Ended,
            ReaderState::Errored(_) => ReaderStatus::Errored,
        }
    }

    /// The decoded schema, including dictionary encodings, once it has been read.
    pub fn stream_schema(&self) -> Option<&StreamSchema> {
        match &self.state {
            ReaderState::Streaming(session) => Some(&session.schema),
            ReaderState::Ended(schema) => Some(schema),
            ReaderState::AwaitingSchema | ReaderState::Errored(_) => None,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Give back the input stream, positioned after the last consumed message.
    pub fn into_inner(self) -> S {
        self.stream
    }

    fn load_schema(&mut self) -> Result<StreamSchema, StreamReaderError> {
        let envelope = match read_envelope(&mut self.stream)? {
            Some(envelope) if envelope.kind() != MessageKind::EndOfStream => envelope,
            _ => return Err(StreamReaderError::NoData),
        };
        if envelope.kind() != MessageKind::Schema {
            return Err(DecodeError::ExpectedSchema {
                found: envelope.kind(),
            }
            .into());
        }
        envelope.skip_body(&mut self.stream)?;
        let schema = decode_schema(&envelope)?;

        if let Some(index) = self.field_index {
            return Err(StreamReaderError::UnsupportedFieldIndex { index });
        }
        Ok(schema)
    }

    /// Read envelopes until a record batch or the end of the stream,
    /// applying dictionary batches on the way.
    fn pull_batch(&mut self) -> Result<Option<RecordBatch>, StreamReaderError> {
        let ReaderState::Streaming(session) = &mut self.state else {
            return Ok(None);
        };
        loop {
            let Some(envelope) = read_envelope(&mut self.stream)? else {
                return Ok(None);
            };
            match envelope.kind() {
                MessageKind::EndOfStream => return Ok(None),
                MessageKind::DictionaryBatch => {
                    self.decoder.decode_dictionary_batch(
                        &envelope,
                        &mut self.stream,
                        &session.schema,
                        &mut session.dictionaries,
                    )?;
                }
                _ => {
                    let batch = self.decoder.decode_record_batch(
                        &envelope,
                        &mut self.stream,
                        &session.schema,
                        &session.dictionaries,
                    )?;
                    return Ok(Some(batch));
                }
            }
        }
    }

    fn fail(&mut self, e: StreamReaderError) -> StreamReaderError {
        log::debug!("stream reader failed: {e}");
        self.state = ReaderState::Errored(e.clone());
        e
    }
}

fn terminated(e: &StreamReaderError) -> StreamReaderError {
    StreamReaderError::Terminated(Box::new(e.clone()))
}

impl<S: InputStream> Iterator for StreamReader<S> {
    type Item = Result<RecordBatch, StreamReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, ReaderState::Errored(_)) {
            return None;
        }
        self.next_batch().transpose()
    }
}

impl Default for StreamReaderBuilder {
    fn default() -> Self {
        Self {
            field_index: None,
            shared_buffers: true,
        }
    }
}

impl StreamReaderBuilder {
    /// Decode only the field at `index` (default: all fields).
    ///
    /// Projection is not implemented yet: a reader configured with an index
    /// fails once the schema has been read.
    pub fn with_field_index(mut self, index: usize) -> Self {
        self.field_index = Some(index);
        self
    }

    /// Slice array buffers out of the message body instead of copying them
    /// (default: true).
    pub fn with_shared_buffers(mut self, shared: bool) -> Self {
        self.shared_buffers = shared;
        self
    }

    /// Build the reader over `stream`.
    pub fn build<S: InputStream>(self, stream: S) -> StreamReader<S> {
        let policy = if self.shared_buffers {
            BufferPolicy::Shared
        } else {
            BufferPolicy::Private
        };
        StreamReader {
            stream,
            decoder: BatchDecoder::new(policy),
            field_index: self.field_index,
            state: ReaderState::AwaitingSchema,
        }
    }
}
