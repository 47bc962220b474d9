//! Record batch and dictionary batch decoding.
//!
//! Field nodes and buffers are consumed in lockstep with a depth-first walk
//! of the schema's field tree. Every node and buffer declared by the metadata
//! must be used exactly once.

use arrow::{
    array::{ArrayData, ArrayRef, make_array},
    buffer::{BooleanBuffer, Buffer, NullBuffer},
    datatypes::DataType,
    ipc,
    record_batch::{RecordBatch, RecordBatchOptions},
};
use ipcstream_core::InputStream;

use crate::{
    body::{BufferPolicy, MessageBody},
    dictionary::DictionaryStore,
    envelope::{Envelope, MessageKind},
    error::DecodeError,
    schema::{FieldDescriptor, StreamSchema},
};

/// Buffer layout of a single field node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    /// No buffers at all.
    Null,
    /// Validity and one values buffer.
    Primitive,
    /// Validity, offsets and values.
    VariableBinary,
    /// Validity and offsets, followed by one child node.
    List,
    /// Validity only, followed by the child nodes.
    Nested,
    /// Validity and indices into a dictionary received separately.
    Dictionary,
}

impl Layout {
    fn of(field: &FieldDescriptor) -> Result<Self, DecodeError> {
        if field.dictionary.is_some() {
            return Ok(Layout::Dictionary);
        }
        let layout = match &field.data_type {
            DataType::Null => Layout::Null,
            DataType::Boolean
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
            | DataType::Decimal128(_, _)
            | DataType::Decimal256(_, _)
            | DataType::Date32
            | DataType::Date64
            | DataType::Time32(_)
            | DataType::Time64(_)
            | DataType::Timestamp(_, _)
            | DataType::Duration(_)
            | DataType::Interval(_)
            | DataType::FixedSizeBinary(_) => Layout::Primitive,
            DataType::Binary | DataType::LargeBinary | DataType::Utf8 | DataType::LargeUtf8 => {
                Layout::VariableBinary
            }
            DataType::List(_) | DataType::LargeList(_) | DataType::Map(_, _) => Layout::List,
            DataType::FixedSizeList(_, _) | DataType::Struct(_) => Layout::Nested,
            other => {
                return Err(DecodeError::unsupported(format!(
                    "decoding field '{}' of type {other}",
                    field.name
                )));
            }
        };
        Ok(layout)
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeMeta {
    length: i64,
    null_count: i64,
}

#[derive(Debug, Clone, Copy)]
struct BufferMeta {
    offset: i64,
    length: i64,
}

/// Decodes RecordBatch and DictionaryBatch envelopes against a schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchDecoder {
    policy: BufferPolicy,
}

impl BatchDecoder {
    pub fn new(policy: BufferPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> BufferPolicy {
        self.policy
    }

    /// Decode a RecordBatch envelope, reading its body from `stream`.
    ///
    /// Any other envelope kind has its body skipped and is rejected.
    pub fn decode_record_batch<S: InputStream + ?Sized>(
        &self,
        envelope: &Envelope,
        stream: &mut S,
        schema: &StreamSchema,
        dictionaries: &DictionaryStore,
    ) -> Result<RecordBatch, DecodeError> {
        if envelope.kind() != MessageKind::RecordBatch {
            envelope.skip_body(stream)?;
            return Err(DecodeError::ExpectedRecordBatch {
                found: envelope.kind(),
            });
        }
        let body = self.read_body(envelope, stream)?;

        let message = envelope.message()?;
        let batch = message
            .header_as_record_batch()
            .ok_or_else(|| DecodeError::InvalidMetadata {
                detail: "RecordBatch message without a RecordBatch header".to_string(),
            })?;

        let mut walker = NodeWalker::new(&batch, &body, dictionaries)?;
        let rows = walker.row_count;
        let columns = schema
            .fields()
            .iter()
            .map(|field| {
                let data = walker.decode_top_level(field)?;
                Ok(make_array(data))
            })
            .collect::<Result<Vec<ArrayRef>, DecodeError>>()?;
        walker.finish()?;

        let options = RecordBatchOptions::new().with_row_count(Some(rows));
        let batch =
            RecordBatch::try_new_with_options(schema.arrow_schema().clone(), columns, &options)?;
        log::debug!(
            "decoded record batch with {} rows from {} body bytes",
            batch.num_rows(),
            body.len()
        );
        Ok(batch)
    }

    /// Decode a DictionaryBatch envelope into `dictionaries`, returning its id.
    pub fn decode_dictionary_batch<S: InputStream + ?Sized>(
        &self,
        envelope: &Envelope,
        stream: &mut S,
        schema: &StreamSchema,
        dictionaries: &mut DictionaryStore,
    ) -> Result<i64, DecodeError> {
        if envelope.kind() != MessageKind::DictionaryBatch {
            envelope.skip_body(stream)?;
            return Err(DecodeError::Internal {
                detail: format!("expected a DictionaryBatch envelope, got {:?}", envelope.kind()),
            });
        }
        let body = self.read_body(envelope, stream)?;

        let message = envelope.message()?;
        let header = message
            .header_as_dictionary_batch()
            .ok_or_else(|| DecodeError::InvalidMetadata {
                detail: "DictionaryBatch message without a DictionaryBatch header".to_string(),
            })?;
        let id = header.id();
        if header.isDelta() {
            return Err(DecodeError::unsupported(format!(
                "delta dictionary batch (id {id})"
            )));
        }
        let field = schema.dictionary_field(id).ok_or_else(|| {
            DecodeError::invalid_batch(format!("dictionary batch for unknown id {id}"))
        })?;
        let data = header.data().ok_or_else(|| {
            DecodeError::invalid_batch(format!("dictionary batch {id} without data"))
        })?;

        let values_field = field.dictionary_values();
        let mut walker = NodeWalker::new(&data, &body, dictionaries)?;
        let values = walker.decode_top_level(&values_field)?;
        walker.finish()?;
        let rows = walker.row_count;

        let replaced = dictionaries.insert(id, values);
        log::debug!(
            "{} dictionary {id} for field '{}' ({rows} values)",
            if replaced { "replaced" } else { "stored" },
            field.name,
        );
        Ok(id)
    }

    fn read_body<S: InputStream + ?Sized>(
        &self,
        envelope: &Envelope,
        stream: &mut S,
    ) -> Result<MessageBody, DecodeError> {
        let data = envelope.read_body(stream)?;
        if data.len() != envelope.body_length() {
            return Err(DecodeError::Internal {
                detail: format!(
                    "read {} body bytes but the message declares {}",
                    data.len(),
                    envelope.body_length()
                ),
            });
        }
        Ok(MessageBody::new(data, self.policy))
    }
}

struct NodeWalker<'a> {
    row_count: usize,
    nodes: Vec<NodeMeta>,
    buffers: Vec<BufferMeta>,
    next_node: usize,
    next_buffer: usize,
    body: &'a MessageBody,
    dictionaries: &'a DictionaryStore,
}

impl<'a> NodeWalker<'a> {
    fn new(
        batch: &ipc::RecordBatch<'_>,
        body: &'a MessageBody,
        dictionaries: &'a DictionaryStore,
    ) -> Result<Self, DecodeError> {
        if batch.compression().is_some() {
            return Err(DecodeError::unsupported("compressed record batch body"));
        }
        let row_count = usize::try_from(batch.length()).map_err(|_| {
            DecodeError::invalid_batch(format!("negative row count {}", batch.length()))
        })?;
        let nodes = batch
            .nodes()
            .into_iter()
            .flatten()
            .map(|node| NodeMeta {
                length: node.length(),
                null_count: node.null_count(),
            })
            .collect();
        let buffers = batch
            .buffers()
            .into_iter()
            .flatten()
            .map(|buffer| BufferMeta {
                offset: buffer.offset(),
                length: buffer.length(),
            })
            .collect();
        Ok(Self {
            row_count,
            nodes,
            buffers,
            next_node: 0,
            next_buffer: 0,
            body,
            dictionaries,
        })
    }

    /// Decode a column. Its node length must equal the batch row count,
    /// which is checked before any child is visited.
    fn decode_top_level(&mut self, field: &FieldDescriptor) -> Result<ArrayData, DecodeError> {
        if let Some(node) = self.nodes.get(self.next_node)
            && usize::try_from(node.length).ok() != Some(self.row_count)
        {
            return Err(DecodeError::invalid_batch(format!(
                "field '{}' has {} rows but the batch declares {}",
                field.name, node.length, self.row_count
            )));
        }
        self.decode_node(field)
    }

    fn decode_node(&mut self, field: &FieldDescriptor) -> Result<ArrayData, DecodeError> {
        let layout = Layout::of(field)?;
        let node = self.next_node(field)?;
        let lengths = (
            usize::try_from(node.length),
            usize::try_from(node.null_count),
        );
        let (length, null_count) = match lengths {
            (Ok(length), Ok(null_count)) => (length, null_count),
            _ => {
                return Err(DecodeError::invalid_batch(format!(
                    "field '{}' has a node with length {} and null count {}",
                    field.name, node.length, node.null_count
                )));
            }
        };

        let mut builder = ArrayData::builder(field.data_type.clone()).len(length);
        if layout != Layout::Null {
            builder = builder.nulls(self.validity(field, length, null_count)?);
        }
        match layout {
            Layout::Null | Layout::Nested => {}
            Layout::Primitive | Layout::List | Layout::Dictionary => {
                builder = builder.add_buffer(self.next_buffer(field)?);
            }
            Layout::VariableBinary => {
                builder = builder
                    .add_buffer(self.next_buffer(field)?)
                    .add_buffer(self.next_buffer(field)?);
            }
        }
        let min_child_length = match &field.data_type {
            DataType::FixedSizeList(_, size) => usize::try_from(*size)
                .ok()
                .and_then(|size| length.checked_mul(size))
                .ok_or_else(|| {
                    DecodeError::invalid_batch(format!(
                        "field '{}' with {length} lists of size {size} overflows",
                        field.name
                    ))
                })?,
            _ => 0,
        };
        match layout {
            Layout::List | Layout::Nested => {
                for child in &field.children {
                    let data = self.decode_node(child)?;
                    if data.len() < min_child_length {
                        return Err(DecodeError::invalid_batch(format!(
                            "child '{}' of field '{}' has {} values but {min_child_length} \
                             are needed",
                            child.name,
                            field.name,
                            data.len()
                        )));
                    }
                    builder = builder.add_child_data(data);
                }
            }
            Layout::Dictionary => {
                builder = builder.add_child_data(self.dictionary_values(field)?);
            }
            Layout::Null | Layout::Primitive | Layout::VariableBinary => {}
        }

        builder
            .align_buffers(true)
            .build()
            .map_err(|source| DecodeError::ArrayData {
                field: field.name.clone(),
                source,
            })
    }

    /// Consume the validity buffer slot. The bitmap is only materialized when
    /// the node declares nulls, and its null count must match the declaration.
    fn validity(
        &mut self,
        field: &FieldDescriptor,
        length: usize,
        null_count: usize,
    ) -> Result<Option<NullBuffer>, DecodeError> {
        let bitmap = self.next_buffer(field)?;
        if null_count == 0 {
            return Ok(None);
        }
        if bitmap.len() < length.div_ceil(8) {
            return Err(DecodeError::invalid_batch(format!(
                "validity bitmap of field '{}' has {} bytes but {length} rows need {}",
                field.name,
                bitmap.len(),
                length.div_ceil(8)
            )));
        }
        let nulls = NullBuffer::new(BooleanBuffer::new(bitmap, 0, length));
        if nulls.null_count() != null_count {
            return Err(DecodeError::invalid_batch(format!(
                "field '{}' declares {null_count} nulls but its validity bitmap has {}",
                field.name,
                nulls.null_count()
            )));
        }
        Ok(Some(nulls))
    }

    fn dictionary_values(&self, field: &FieldDescriptor) -> Result<ArrayData, DecodeError> {
        let Some(encoding) = &field.dictionary else {
            return Err(DecodeError::Internal {
                detail: format!("field '{}' is not dictionary encoded", field.name),
            });
        };
        self.dictionaries.get(encoding.id).cloned().ok_or_else(|| {
            DecodeError::invalid_batch(format!(
                "field '{}' references dictionary {} which has not been received",
                field.name, encoding.id
            ))
        })
    }

    fn next_node(&mut self, field: &FieldDescriptor) -> Result<NodeMeta, DecodeError> {
        let node = self.nodes.get(self.next_node).copied().ok_or_else(|| {
            DecodeError::invalid_batch(format!(
                "ran out of field nodes at field '{}' ({} declared)",
                field.name,
                self.nodes.len()
            ))
        })?;
        self.next_node += 1;
        Ok(node)
    }

    fn next_buffer(&mut self, field: &FieldDescriptor) -> Result<Buffer, DecodeError> {
        let index = self.next_buffer;
        let meta = self.buffers.get(index).copied().ok_or_else(|| {
            DecodeError::invalid_batch(format!(
                "ran out of buffers at field '{}' ({} declared)",
                field.name,
                self.buffers.len()
            ))
        })?;
        self.next_buffer += 1;
        self.body.buffer(index, meta.offset, meta.length)
    }

    fn finish(&self) -> Result<(), DecodeError> {
        if self.next_node != self.nodes.len() || self.next_buffer != self.buffers.len() {
            return Err(DecodeError::invalid_batch(format!(
                "used {} of {} field nodes and {} of {} buffers",
                self.next_node,
                self.nodes.len(),
                self.next_buffer,
                self.buffers.len()
            )));
        }
        Ok(())
    }
}
