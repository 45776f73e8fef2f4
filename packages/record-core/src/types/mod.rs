//! Field type system, record limits, and nullable value wrapper.

mod field_type;
mod value;

pub use field_type::FieldType;
pub use value::FieldVal;

/// Maximum total record size in bytes (fixed plus variable region).
pub const MAX_FIELD_LENGTH: usize = 0x7fff_ffff;

/// Variable data offsets above this need the extended-addressing bit.
pub const MAX_FIELD_LENGTH_32: usize = 0x0fff_ffff;

/// Fixed-length strings above this size only produce a warning.
pub const MAX_FIXED_LENGTH_STRING_SIZE: usize = 16384;

/// FixedDecimal precision above this only produces an error message.
pub const MAX_FIXED_DECIMAL_PRECISION: usize = 258;

/// Maximum number of fields in one record.
pub const MAX_FIELDS_LIMIT: usize = 32000;

/// Width in bytes of a variable-data slot in the fixed region.
pub const VAR_DATA_SLOT_SIZE: usize = 4;
