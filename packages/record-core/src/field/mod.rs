//! Typed field accessors.
//!
//! A [`Field`] pairs a schema with its byte offset inside a record and
//! knows how to read and write its value in every supported
//! representation. Conversion problems are reported through the field's
//! message sink and null the value; unsupported accessors return
//! [`RecordError::Unsupported`].
//!
//! Narrow strings are exchanged as Latin-1 bytes and wide strings as Rust
//! `String`s, stored in records as UTF-16LE.

mod blob;
mod boolean;
mod datetime;
mod fixed_decimal;
mod numeric;
mod reporter;
mod string;

use std::borrow::Cow;
use std::fmt;

use crate::engine::{SharedCodec, SharedSink};
use crate::error::RecordError;
use crate::record::{Record, RecordData};
use crate::schema::FieldSchema;
use crate::types::{FieldType, FieldVal, MAX_FIELD_LENGTH, VAR_DATA_SLOT_SIZE};

pub use datetime::{validate_date, validate_date_time, validate_time};
pub(crate) use string::parse_double_reporting;

use reporter::ConversionReporter;

/// V_String sizes above this are promoted to the maximum field length.
const V_STRING_PROMOTE_SIZE: u32 = 250_000_000;
/// V_WString sizes above this are promoted to half the maximum field length.
const V_WSTRING_PROMOTE_SIZE: u32 = 125_000_000;

/// Storage strategy of a field, derived from its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Bool,
    Number,
    /// String storage; `wide` for UTF-16, `var` for var-data slots
    Text { wide: bool, var: bool },
    FixedDecimal,
    DateTime,
    Blob,
}

impl Kind {
    fn of(field_type: FieldType) -> Kind {
        match field_type {
            FieldType::Bool => Kind::Bool,
            FieldType::Byte
            | FieldType::Int16
            | FieldType::Int32
            | FieldType::Int64
            | FieldType::Float
            | FieldType::Double => Kind::Number,
            FieldType::String => Kind::Text {
                wide: false,
                var: false,
            },
            FieldType::WString => Kind::Text {
                wide: true,
                var: false,
            },
            FieldType::V_String => Kind::Text {
                wide: false,
                var: true,
            },
            FieldType::V_WString => Kind::Text {
                wide: true,
                var: true,
            },
            FieldType::FixedDecimal => Kind::FixedDecimal,
            FieldType::Date | FieldType::Time | FieldType::DateTime => Kind::DateTime,
            FieldType::Blob | FieldType::SpatialObj | FieldType::Unknown => Kind::Blob,
        }
    }
}

/// A field placed in a record layout.
pub struct Field {
    schema: FieldSchema,
    kind: Kind,
    offset: usize,
    raw_size: usize,
    is_var_length: bool,
    reporter: ConversionReporter,
    codec: Option<SharedCodec>,
}

impl Field {
    /// Builds a field from a schema, normalising size and scale for the
    /// field type.
    pub(crate) fn new(mut schema: FieldSchema) -> Result<Self, RecordError> {
        let field_type = schema.field_type();
        let (size, scale): (u32, i32) = match field_type {
            FieldType::Unknown => {
                return Err(RecordError::UnknownFieldType {
                    name: field_type.name().to_string(),
                })
            }
            FieldType::Bool => (1, 0),
            FieldType::Byte => (1, -1),
            FieldType::Int16 => (2, -1),
            FieldType::Int32 | FieldType::Float => (4, -1),
            FieldType::Int64 | FieldType::Double => (8, -1),
            FieldType::FixedDecimal => (schema.size(), schema.scale()),
            FieldType::String | FieldType::WString => (schema.size(), -1),
            FieldType::V_String => {
                let size = if schema.size() > V_STRING_PROMOTE_SIZE {
                    MAX_FIELD_LENGTH as u32
                } else {
                    schema.size()
                };
                (size, -1)
            }
            FieldType::V_WString => {
                let size = if schema.size() > V_WSTRING_PROMOTE_SIZE {
                    (MAX_FIELD_LENGTH / 2) as u32
                } else {
                    schema.size()
                };
                (size, -1)
            }
            FieldType::Date => (10, -1),
            FieldType::Time => (8, -1),
            FieldType::DateTime => (19, -1),
            FieldType::Blob | FieldType::SpatialObj => (MAX_FIELD_LENGTH as u32, 0),
        };
        schema.set_size(size);
        schema.set_scale(scale);

        let kind = Kind::of(field_type);
        let (raw_size, is_var_length) = match kind {
            Kind::Bool => (1, false),
            Kind::Number => (size as usize + 1, false),
            Kind::Text { var: true, .. } | Kind::Blob => (VAR_DATA_SLOT_SIZE, true),
            Kind::Text { wide: true, .. } => (size as usize * 2 + 1, false),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => (size as usize + 1, false),
        };

        Ok(Self {
            schema,
            kind,
            offset: 0,
            raw_size,
            is_var_length,
            reporter: ConversionReporter::new(None),
            codec: None,
        })
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    pub(crate) fn schema_mut(&mut self) -> &mut FieldSchema {
        &mut self.schema
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn field_type(&self) -> FieldType {
        self.schema.field_type()
    }

    pub fn size(&self) -> u32 {
        self.schema.size()
    }

    pub fn scale(&self) -> i32 {
        self.schema.scale()
    }

    /// Byte offset of the field within the fixed region.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    /// Bytes the field occupies in the fixed region, null flag included.
    pub fn raw_size(&self) -> usize {
        self.raw_size
    }

    pub fn is_var_length(&self) -> bool {
        self.is_var_length
    }

    /// Maximum payload size in bytes.
    pub fn max_bytes(&self) -> usize {
        match self.kind {
            Kind::Text { wide: true, .. } => self.size() as usize * 2,
            _ => self.size() as usize,
        }
    }

    /// Attaches a host sink and resets the conversion error count.
    pub fn set_message_sink(&self, sink: Option<SharedSink>) {
        self.reporter.attach(sink);
    }

    pub fn message_sink(&self) -> Option<SharedSink> {
        self.reporter.sink()
    }

    /// Detaches the sink, returning it for a later
    /// [`Field::restore_message_sink`].
    pub fn take_message_sink(&self) -> Option<SharedSink> {
        self.reporter.take()
    }

    /// Reattaches a sink without touching the error count.
    pub fn restore_message_sink(&self, sink: Option<SharedSink>) {
        self.reporter.restore(sink);
    }

    /// True while conversion errors still reach a sink.
    pub fn is_reporting_conversion_errors(&self) -> bool {
        self.reporter.is_reporting()
    }

    /// Conversion errors reported since the sink was attached.
    pub fn conversion_error_count(&self) -> u32 {
        self.reporter.error_count()
    }

    pub(crate) fn set_spatial_codec(&mut self, codec: Option<SharedCodec>) {
        self.codec = codec;
    }

    pub(crate) fn codec(&self) -> Option<&SharedCodec> {
        self.codec.as_ref()
    }

    /// Reports a conversion error for this field.
    pub fn report_conversion_error(&self, message: &str) {
        self.reporter.report(self.name(), message);
    }

    /// Reports a conversion error, building the message only if a sink is
    /// listening.
    pub(crate) fn report_with(&self, message: impl FnOnce() -> String) {
        if self.reporter.is_reporting() {
            self.report_conversion_error(&message());
        }
    }

    fn unsupported(&self, operation: &'static str) -> RecordError {
        RecordError::Unsupported {
            operation,
            field_type: self.field_type(),
        }
    }

    /// Structural equality: schema plus storage layout.
    pub fn same_layout(&self, other: &Field) -> bool {
        self.schema.compare(&other.schema)
            && self.raw_size == other.raw_size
            && self.is_var_length == other.is_var_length
    }

    pub fn get_null(&self, data: RecordData<'_>) -> bool {
        match self.kind {
            Kind::Bool => boolean::get_null(self, data),
            Kind::Number => numeric::get_null(self, data),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => string::get_null(self, data),
            Kind::Blob => blob::get_null(self, data),
        }
    }

    pub fn set_null(&self, record: &mut Record) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set_null(self, record),
            Kind::Number => numeric::set_null(self, record),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                string::set_null(self, record)
            }
            Kind::Blob => blob::set_null(self, record),
        }
    }

    pub fn get_as_bool(&self, data: RecordData<'_>) -> Result<FieldVal<bool>, RecordError> {
        match self.kind {
            Kind::Bool => Ok(boolean::get(self, data)),
            Kind::Number => Ok(numeric::get_as_bool(self, data)),
            Kind::Text { .. } | Kind::DateTime => Ok(string::get_as_bool(self, data)),
            Kind::FixedDecimal => Ok(fixed_decimal::get_as_bool(self, data)),
            Kind::Blob => Err(self.unsupported("get_as_bool")),
        }
    }

    pub fn get_as_int32(&self, data: RecordData<'_>) -> Result<FieldVal<i32>, RecordError> {
        match self.kind {
            Kind::Bool => Ok(boolean::get(self, data).map(i32::from)),
            Kind::Number => Ok(numeric::get_as_int32(self, data)),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                Ok(string::get_as_int32(self, data))
            }
            Kind::Blob => Err(self.unsupported("get_as_int32")),
        }
    }

    pub fn get_as_int64(&self, data: RecordData<'_>) -> Result<FieldVal<i64>, RecordError> {
        match self.kind {
            Kind::Bool => Ok(boolean::get(self, data).map(i64::from)),
            Kind::Number => Ok(numeric::get_as_int64(self, data)),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                Ok(string::get_as_int64(self, data))
            }
            Kind::Blob => Err(self.unsupported("get_as_int64")),
        }
    }

    pub fn get_as_double(&self, data: RecordData<'_>) -> Result<FieldVal<f64>, RecordError> {
        match self.kind {
            Kind::Bool => Ok(boolean::get(self, data).map(|b| if b { 1.0 } else { 0.0 })),
            Kind::Number => Ok(numeric::get_as_double(self, data)),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                Ok(string::get_as_double(self, data))
            }
            Kind::Blob => Err(self.unsupported("get_as_double")),
        }
    }

    /// Reads the value as narrow (Latin-1) text.
    pub fn get_as_astring(&self, data: RecordData<'_>) -> Result<FieldVal<Vec<u8>>, RecordError> {
        Ok(match self.kind {
            Kind::Bool => boolean::get_as_text(self, data).map(|s| s.as_bytes().to_vec()),
            Kind::Number => numeric::get_as_text(self, data).map(String::into_bytes),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                string::get_as_astring(self, data)
            }
            Kind::Blob => {
                let text = blob::get_as_text(self, data);
                let (bytes, _) = crate::text::string_to_latin1(&text.value);
                FieldVal::with_null(text.is_null, bytes)
            }
        })
    }

    /// Reads the value as wide text.
    pub fn get_as_wstring(&self, data: RecordData<'_>) -> Result<FieldVal<String>, RecordError> {
        Ok(match self.kind {
            Kind::Bool => boolean::get_as_text(self, data).map(str::to_string),
            Kind::Number => numeric::get_as_text(self, data),
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                string::get_as_wstring(self, data)
            }
            Kind::Blob => blob::get_as_text(self, data),
        })
    }

    /// Reads the raw payload bytes.
    pub fn get_as_blob<'a>(&self, data: RecordData<'a>) -> Result<FieldVal<&'a [u8]>, RecordError> {
        match self.kind {
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                Ok(string::get_as_blob(self, data))
            }
            Kind::Blob => Ok(blob::get(self, data)),
            Kind::Bool | Kind::Number => Err(self.unsupported("get_as_blob")),
        }
    }

    /// Reads the value as a spatial object blob.
    pub fn get_as_spatial_blob<'a>(
        &self,
        data: RecordData<'a>,
    ) -> Result<FieldVal<Cow<'a, [u8]>>, RecordError> {
        match self.kind {
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                Ok(string::get_as_spatial_blob(self, data))
            }
            Kind::Blob => blob::get_as_spatial_blob(self, data),
            Kind::Bool | Kind::Number => Err(self.unsupported("get_as_spatial_blob")),
        }
    }

    pub fn set_from_bool(&self, record: &mut Record, value: bool) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set(self, record, value),
            Kind::FixedDecimal => {
                fixed_decimal::set_from_double(self, record, if value { 1.0 } else { 0.0 })
            }
            Kind::DateTime => Err(RecordError::DateTimeConversion { from: "Bool" }),
            _ => self.set_from_int32(record, i32::from(value)),
        }
    }

    pub fn set_from_int32(&self, record: &mut Record, value: i32) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set(self, record, value != 0),
            Kind::Number => numeric::set_from_int64(self, record, value as i64),
            Kind::Text { .. } => string::set_from_text(self, record, &value.to_string()),
            Kind::FixedDecimal => fixed_decimal::set_from_double(self, record, value as f64),
            Kind::DateTime => Err(RecordError::DateTimeConversion { from: "Int32" }),
            Kind::Blob => Err(self.unsupported("set_from_int32")),
        }
    }

    pub fn set_from_int64(&self, record: &mut Record, value: i64) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set(self, record, value != 0),
            Kind::Number => numeric::set_from_int64(self, record, value),
            Kind::Text { .. } => string::set_from_text(self, record, &value.to_string()),
            Kind::FixedDecimal => fixed_decimal::set_from_int64(self, record, value),
            Kind::DateTime => Err(RecordError::DateTimeConversion { from: "Int64" }),
            Kind::Blob => Err(self.unsupported("set_from_int64")),
        }
    }

    pub fn set_from_double(&self, record: &mut Record, value: f64) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set(self, record, value != 0.0),
            Kind::Number => numeric::set_from_double(self, record, value),
            Kind::Text { .. } => {
                string::set_from_text(self, record, &crate::text::double_to_string(value))
            }
            Kind::FixedDecimal => fixed_decimal::set_from_double(self, record, value),
            Kind::DateTime => datetime::set_from_double(self, record, value),
            Kind::Blob => Err(self.unsupported("set_from_double")),
        }
    }

    /// Writes narrow (Latin-1) text.
    pub fn set_from_astring(&self, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set(
                self,
                record,
                boolean::test_char(value.first().map_or('\0', |&b| b as char)),
            ),
            Kind::Number => numeric::set_from_text(self, record, value),
            Kind::Text { .. } => string::set_from_astring(self, record, value),
            Kind::FixedDecimal => fixed_decimal::set_from_astring(self, record, value),
            Kind::DateTime => datetime::set_from_astring(self, record, value),
            Kind::Blob => Err(self.unsupported("set_from_astring")),
        }
    }

    /// Writes wide text.
    pub fn set_from_wstring(&self, record: &mut Record, value: &str) -> Result<(), RecordError> {
        match self.kind {
            Kind::Bool => boolean::set(
                self,
                record,
                boolean::test_char(value.chars().next().unwrap_or('\0')),
            ),
            Kind::Number => {
                let (bytes, _) = crate::text::string_to_latin1(value);
                numeric::set_from_text(self, record, &bytes)
            }
            Kind::Text { .. } => string::set_from_wstring(self, record, value),
            Kind::FixedDecimal => {
                let (bytes, _) = crate::text::string_to_latin1(value);
                fixed_decimal::set_from_astring(self, record, &bytes)
            }
            Kind::DateTime => {
                let bytes = string::narrow_reporting(self, value);
                datetime::set_from_astring(self, record, &bytes)
            }
            Kind::Blob => Err(self.unsupported("set_from_wstring")),
        }
    }

    /// Writes raw payload bytes.
    pub fn set_from_blob(&self, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
        match self.kind {
            Kind::Text { .. } | Kind::DateTime => string::set_from_blob(self, record, value),
            Kind::Blob => blob::set(self, record, value),
            Kind::Bool | Kind::Number | Kind::FixedDecimal => {
                Err(self.unsupported("set_from_blob"))
            }
        }
    }

    /// Writes a spatial object blob.
    pub fn set_from_spatial_blob(
        &self,
        record: &mut Record,
        value: &[u8],
    ) -> Result<(), RecordError> {
        match self.kind {
            Kind::Text { .. } | Kind::FixedDecimal | Kind::DateTime => {
                string::set_from_spatial_blob(self, record, value)
            }
            Kind::Blob => blob::set(self, record, value),
            Kind::Bool | Kind::Number => Err(self.unsupported("set_from_spatial_blob")),
        }
    }
}

impl Clone for Field {
    /// Copies the field with a fresh conversion error count.
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            kind: self.kind,
            offset: self.offset,
            raw_size: self.raw_size,
            is_var_length: self.is_var_length,
            reporter: self.reporter.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name())
            .field("type", &self.field_type())
            .field("size", &self.size())
            .field("scale", &self.scale())
            .field("offset", &self.offset)
            .field("raw_size", &self.raw_size)
            .field("is_var_length", &self.is_var_length)
            .finish()
    }
}
