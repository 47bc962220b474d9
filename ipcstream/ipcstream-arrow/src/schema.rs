//! Schema message decoding.

use std::{collections::HashMap, sync::Arc};

use arrow::{
    datatypes::{DataType, Field, Fields, IntervalUnit, Schema, SchemaRef, TimeUnit},
    ipc,
};

use crate::{
    envelope::{Envelope, MessageKind},
    error::DecodeError,
};

/// Dictionary encoding attached to a schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEncoding {
    pub id: i64,
    pub index_type: DataType,
    pub is_ordered: bool,
}

/// One node of the decoded field tree.
///
/// `children` mirrors the metadata's child list; for a dictionary-encoded
/// field they describe the dictionary value type, and `data_type` is the
/// resulting `DataType::Dictionary`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub dictionary: Option<DictionaryEncoding>,
    pub children: Vec<FieldDescriptor>,
    pub metadata: HashMap<String, String>,
}

impl FieldDescriptor {
    pub fn to_arrow(&self) -> Field {
        Field::new(&self.name, self.data_type.clone(), self.nullable)
            .with_metadata(self.metadata.clone())
    }

    /// Type of the stored values: the dictionary value type for
    /// dictionary-encoded fields, `data_type` otherwise.
    pub fn value_type(&self) -> &DataType {
        match &self.data_type {
            DataType::Dictionary(_, value) if self.dictionary.is_some() => value,
            other => other,
        }
    }

    /// Descriptor of the values carried by this field's dictionary batches.
    pub(crate) fn dictionary_values(&self) -> FieldDescriptor {
        FieldDescriptor {
            name: self.name.clone(),
            data_type: self.value_type().clone(),
            nullable: true,
            dictionary: None,
            children: self.children.clone(),
            metadata: HashMap::new(),
        }
    }

    fn find_dictionary(&self, id: i64) -> Option<&FieldDescriptor> {
        match &self.dictionary {
            Some(encoding) if encoding.id == id => Some(self),
            _ => self.children.iter().find_map(|c| c.find_dictionary(id)),
        }
    }

    fn dictionary_ids(&self, out: &mut Vec<i64>) {
        if let Some(encoding) = &self.dictionary {
            out.push(encoding.id);
        }
        for child in &self.children {
            child.dictionary_ids(out);
        }
    }
}

/// Decoded stream schema: the field tree plus its Arrow equivalent.
#[derive(Debug, Clone)]
pub struct StreamSchema {
    fields: Vec<FieldDescriptor>,
    metadata: HashMap<String, String>,
    arrow: SchemaRef,
}

impl StreamSchema {
    pub fn new(fields: Vec<FieldDescriptor>, metadata: HashMap<String, String>) -> Self {
        let arrow_fields: Vec<Field> = fields.iter().map(FieldDescriptor::to_arrow).collect();
        let arrow = Arc::new(Schema::new_with_metadata(arrow_fields, metadata.clone()));
        Self {
            fields,
            metadata,
            arrow,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn arrow_schema(&self) -> &SchemaRef {
        &self.arrow
    }

    /// The dictionary-encoded field using dictionary `id`, if any.
    pub fn dictionary_field(&self, id: i64) -> Option<&FieldDescriptor> {
        self.fields.iter().find_map(|f| f.find_dictionary(id))
    }

    /// Dictionary ids in depth-first field order.
    pub fn dictionary_ids(&self) -> Vec<i64> {
        let mut ids = Vec::new();
        for field in &self.fields {
            field.dictionary_ids(&mut ids);
        }
        ids
    }
}

/// Decode a Schema envelope. Schema messages carry no body, so the input
/// stream is not touched.
pub fn decode_schema(envelope: &Envelope) -> Result<StreamSchema, DecodeError> {
    if envelope.kind() != MessageKind::Schema {
        return Err(DecodeError::ExpectedSchema {
            found: envelope.kind(),
        });
    }

    let message = envelope.message()?;
    let schema = message
        .header_as_schema()
        .ok_or_else(|| DecodeError::InvalidMetadata {
            detail: "Schema message without a Schema header".to_string(),
        })?;

    if schema.endianness() == ipc::Endianness::Big {
        return Err(DecodeError::unsupported("big-endian stream"));
    }

    let fields = schema
        .fields()
        .into_iter()
        .flatten()
        .map(|field| decode_field(field, false))
        .collect::<Result<Vec<_>, _>>()?;
    let metadata = decode_metadata(schema.custom_metadata().into_iter().flatten());

    let decoded = StreamSchema::new(fields, metadata);
    log::debug!(
        "decoded schema with {} top-level fields and {} dictionaries",
        decoded.fields.len(),
        decoded.dictionary_ids().len()
    );
    Ok(decoded)
}

fn decode_field(
    field: ipc::Field<'_>,
    in_dictionary: bool,
) -> Result<FieldDescriptor, DecodeError> {
    let name = field.name().unwrap_or_default().to_string();
    let encoding = field.dictionary();
    if encoding.is_some() && in_dictionary {
        return Err(DecodeError::unsupported(format!(
            "dictionary-encoded field '{name}' nested in a dictionary"
        )));
    }

    let children = field
        .children()
        .into_iter()
        .flatten()
        .map(|child| decode_field(child, in_dictionary || encoding.is_some()))
        .collect::<Result<Vec<_>, _>>()?;
    let value_type = logical_type(&field, &name, &children)?;

    let (data_type, dictionary) = match encoding {
        None => (value_type, None),
        Some(encoding) => {
            // The format defaults to signed 32-bit indices.
            let index_type = match encoding.indexType() {
                Some(int) => int_type(int.bitWidth(), int.is_signed()).ok_or_else(|| {
                    DecodeError::invalid_schema(format!(
                        "field '{name}' has an invalid dictionary index width {}",
                        int.bitWidth()
                    ))
                })?,
                None => DataType::Int32,
            };
            let data_type =
                DataType::Dictionary(Box::new(index_type.clone()), Box::new(value_type));
            let dictionary = DictionaryEncoding {
                id: encoding.id(),
                index_type,
                is_ordered: encoding.isOrdered(),
            };
            (data_type, Some(dictionary))
        }
    };

    Ok(FieldDescriptor {
        name,
        data_type,
        nullable: field.nullable(),
        dictionary,
        children,
        metadata: decode_metadata(field.custom_metadata().into_iter().flatten()),
    })
}

fn logical_type(
    field: &ipc::Field<'_>,
    name: &str,
    children: &[FieldDescriptor],
) -> Result<DataType, DecodeError> {
    let type_type = field.type_type();
    let missing = || {
        DecodeError::invalid_schema(format!(
            "field '{name}' is missing its {type_type:?} type description"
        ))
    };
    let invalid = |what: String| DecodeError::invalid_schema(format!("field '{name}': {what}"));

    let data_type = match type_type {
        ipc::Type::Null => DataType::Null,
        ipc::Type::Bool => DataType::Boolean,
        ipc::Type::Int => {
            let int = field.type_as_int().ok_or_else(missing)?;
            int_type(int.bitWidth(), int.is_signed())
                .ok_or_else(|| invalid(format!("invalid integer width {}", int.bitWidth())))?
        }
        ipc::Type::FloatingPoint => {
            let float = field.type_as_floating_point().ok_or_else(missing)?;
            match float.precision() {
                ipc::Precision::HALF => DataType::Float16,
                ipc::Precision::SINGLE => DataType::Float32,
                ipc::Precision::DOUBLE => DataType::Float64,
                other => return Err(invalid(format!("invalid float precision {other:?}"))),
            }
        }
        ipc::Type::Binary => DataType::Binary,
        ipc::Type::LargeBinary => DataType::LargeBinary,
        ipc::Type::Utf8 => DataType::Utf8,
        ipc::Type::LargeUtf8 => DataType::LargeUtf8,
        ipc::Type::FixedSizeBinary => {
            let fsb = field.type_as_fixed_size_binary().ok_or_else(missing)?;
            if fsb.byteWidth() < 0 {
                return Err(invalid(format!("negative byte width {}", fsb.byteWidth())));
            }
            DataType::FixedSizeBinary(fsb.byteWidth())
        }
        ipc::Type::Decimal => {
            let decimal = field.type_as_decimal().ok_or_else(missing)?;
            let precision = u8::try_from(decimal.precision()).map_err(|_| {
                invalid(format!("invalid decimal precision {}", decimal.precision()))
            })?;
            let scale = i8::try_from(decimal.scale())
                .map_err(|_| invalid(format!("invalid decimal scale {}", decimal.scale())))?;
            match decimal.bitWidth() {
                128 => DataType::Decimal128(precision, scale),
                256 => DataType::Decimal256(precision, scale),
                other => return Err(DecodeError::unsupported(format!("{other}-bit decimal"))),
            }
        }
        ipc::Type::Date => {
            let date = field.type_as_date().ok_or_else(missing)?;
            match date.unit() {
                ipc::DateUnit::DAY => DataType::Date32,
                ipc::DateUnit::MILLISECOND => DataType::Date64,
                other => return Err(invalid(format!("invalid date unit {other:?}"))),
            }
        }
        ipc::Type::Time => {
            let time = field.type_as_time().ok_or_else(missing)?;
            match (time.bitWidth(), time.unit()) {
                (32, ipc::TimeUnit::SECOND) => DataType::Time32(TimeUnit::Second),
                (32, ipc::TimeUnit::MILLISECOND) => DataType::Time32(TimeUnit::Millisecond),
                (64, ipc::TimeUnit::MICROSECOND) => DataType::Time64(TimeUnit::Microsecond),
                (64, ipc::TimeUnit::NANOSECOND) => DataType::Time64(TimeUnit::Nanosecond),
                (width, unit) => {
                    return Err(invalid(format!("invalid time type {width}-bit {unit:?}")));
                }
            }
        }
        ipc::Type::Timestamp => {
            let timestamp = field.type_as_timestamp().ok_or_else(missing)?;
            DataType::Timestamp(
                time_unit(timestamp.unit())
                    .ok_or_else(|| invalid("invalid timestamp unit".into()))?,
                timestamp.timezone().map(Arc::from),
            )
        }
        ipc::Type::Duration => {
            let duration = field.type_as_duration().ok_or_else(missing)?;
            DataType::Duration(
                time_unit(duration.unit()).ok_or_else(|| invalid("invalid duration unit".into()))?,
            )
        }
        ipc::Type::Interval => {
            let interval = field.type_as_interval().ok_or_else(missing)?;
            match interval.unit() {
                ipc::IntervalUnit::YEAR_MONTH => DataType::Interval(IntervalUnit::YearMonth),
                ipc::IntervalUnit::DAY_TIME => DataType::Interval(IntervalUnit::DayTime),
                ipc::IntervalUnit::MONTH_DAY_NANO => DataType::Interval(IntervalUnit::MonthDayNano),
                other => return Err(invalid(format!("invalid interval unit {other:?}"))),
            }
        }
        ipc::Type::List => DataType::List(Arc::new(single_child(name, children)?.to_arrow())),
        ipc::Type::LargeList => {
            DataType::LargeList(Arc::new(single_child(name, children)?.to_arrow()))
        }
        ipc::Type::FixedSizeList => {
            let list = field.type_as_fixed_size_list().ok_or_else(missing)?;
            if list.listSize() < 0 {
                return Err(invalid(format!("negative list size {}", list.listSize())));
            }
            DataType::FixedSizeList(
                Arc::new(single_child(name, children)?.to_arrow()),
                list.listSize(),
            )
        }
        ipc::Type::Struct_ => {
            DataType::Struct(children.iter().map(FieldDescriptor::to_arrow).collect::<Fields>())
        }
        ipc::Type::Map => {
            let map = field.type_as_map().ok_or_else(missing)?;
            let entries = single_child(name, children)?;
            if entries.children.len() != 2 || !matches!(entries.data_type, DataType::Struct(_)) {
                return Err(invalid(
                    "map entries must be a struct of key and value".to_string(),
                ));
            }
            DataType::Map(Arc::new(entries.to_arrow()), map.keysSorted())
        }
        other => return Err(DecodeError::unsupported(format!("field type {other:?}"))),
    };
    Ok(data_type)
}

fn single_child<'a>(
    name: &str,
    children: &'a [FieldDescriptor],
) -> Result<&'a FieldDescriptor, DecodeError> {
    match children {
        [child] => Ok(child),
        _ => Err(DecodeError::invalid_schema(format!(
            "field '{name}' needs exactly one child but has {}",
            children.len()
        ))),
    }
}

fn int_type(bit_width: i32, signed: bool) -> Option<DataType> {
    Some(match (bit_width, signed) {
        (8, true) => DataType::Int8,
        (16, true) => DataType::Int16,
        (32, true) => DataType::Int32,
        (64, true) => DataType::Int64,
        (8, false) => DataType::UInt8,
        (16, false) => DataType::UInt16,
        (32, false) => DataType::UInt32,
        (64, false) => DataType::UInt64,
        _ => return None,
    })
}

fn time_unit(unit: ipc::TimeUnit) -> Option<TimeUnit> {
    Some(match unit {
        ipc::TimeUnit::SECOND => TimeUnit::Second,
        ipc::TimeUnit::MILLISECOND => TimeUnit::Millisecond,
        ipc::TimeUnit::MICROSECOND => TimeUnit::Microsecond,
        ipc::TimeUnit::NANOSECOND => TimeUnit::Nanosecond,
        _ => return None,
    })
}

fn decode_metadata<'a>(
    entries: impl Iterator<Item = ipc::KeyValue<'a>>,
) -> HashMap<String, String> {
    entries
        .filter_map(|kv| Some((kv.key()?.to_string(), kv.value()?.to_string())))
        .collect()
}
