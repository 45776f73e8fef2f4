//! Record engine error types.
//!
//! Only structural, unsupported-operation and I/O failures surface here.
//! Data conversion problems are reported through the field's message sink
//! and never abort an operation.

use thiserror::Error;

use crate::types::FieldType;

/// Record engine errors.
#[derive(Error, Debug)]
pub enum RecordError {
    /// Field type name could not be parsed
    #[error("Unknown field type: {name}")]
    UnknownFieldType { name: String },

    /// A sized field was declared with no length
    #[error("Field: \"{field}\" is 0 length.")]
    ZeroLengthField { field: String },

    /// FixedDecimal scale does not leave room for sign and decimal point
    #[error("Field: \"{field}\" has too large a scale ({scale}) for the precision ({size}).")]
    ScaleTooLarge { field: String, scale: i32, size: i64 },

    /// Field count limit reached
    #[error("Number of fields is larger than the {limit} limit. Please reduce the number of fields.")]
    TooManyFields { limit: usize },

    /// Adding a field pushes the fixed region past the record ceiling
    #[error("Record too big:  Records are limited to {limit} bytes. Trying to make a record with {size} bytes, when adding field named '{field}'")]
    FieldMakesRecordTooBig { limit: usize, size: u64, field: String },

    /// Variable data pushes the record past the ceiling
    #[error("Record too big:  Records are limited to {limit} bytes")]
    RecordTooBig { limit: usize },

    /// Record bytes end before the length the header claims
    #[error("Truncated record: expected {expected} bytes, found {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    /// Record buffer belongs to a different layout
    #[error("Record layout mismatch: expected a fixed size of {expected} bytes, found {actual}")]
    LayoutMismatch { expected: usize, actual: usize },

    /// Name uniquification gave up
    #[error("Could not generate a unique name for field <{field}>, number {field_num}, after attempting {attempts} generated names")]
    UniqueNameExhausted {
        field: String,
        field_num: usize,
        attempts: u32,
    },

    /// Field lookup by name failed
    #[error("The field \"{field}\" is missing. Compare the tool configuration with the input stream.")]
    FieldMissing { field: String },

    /// Field lookup by type failed
    #[error("Field not found by wanted FieldType {field_type}")]
    FieldTypeNotFound { field_type: FieldType },

    /// Field index outside the schema
    #[error("Field index {index} out of range (fields: {count})")]
    FieldIndexOutOfRange { index: usize, count: usize },

    /// Accessor not supported by this field kind
    #[error("{operation}: Field type {field_type} is not supported.")]
    Unsupported {
        operation: &'static str,
        field_type: FieldType,
    },

    /// Date/Time fields reject non-text numeric input except doubles
    #[error("Date/Time fields do not support Conversion from {from}")]
    DateTimeConversion { from: &'static str },

    /// Spatial blob failed codec validation
    #[error("Invalid SpatialBlob in field '{field}'")]
    InvalidSpatialBlob { field: String },

    /// This side is locked in but the stream is not
    #[error("This tool can only be connected to another In-Database tool.")]
    LockInRequired,

    /// The stream is locked in but this side is not
    #[error("This tool is not compatible with an In-Database workflow.")]
    LockInNotSupported,

    /// Malformed schema XML
    #[error("XML error: {message}")]
    Xml { message: String },

    /// Required XML attribute missing
    #[error("Missing required attribute '{attribute}' in <{tag}>")]
    MissingAttribute { tag: String, attribute: String },

    /// Configuration could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error from the byte-stream collaborator
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}
