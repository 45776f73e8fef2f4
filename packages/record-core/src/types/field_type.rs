//! Field type enumeration and classification predicates.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Data type of a single field.
///
/// The discriminant order is part of the persisted format: it feeds the
/// schema hash and must not be reordered.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum FieldType {
    #[default]
    Unknown = 0,
    Bool,
    /// Unsigned 8-bit integer
    Byte,
    Int16,
    Int32,
    Int64,
    /// Decimal number stored as fixed-width ASCII text
    FixedDecimal,
    Float,
    Double,
    String,
    WString,
    V_String,
    V_WString,
    /// `yyyy-mm-dd`
    Date,
    /// `hh:mm:ss`
    Time,
    /// `yyyy-mm-dd hh:mm:ss`
    DateTime,
    Blob,
    SpatialObj,
}

const ALL_TYPES: [FieldType; 18] = [
    FieldType::Unknown,
    FieldType::Bool,
    FieldType::Byte,
    FieldType::Int16,
    FieldType::Int32,
    FieldType::Int64,
    FieldType::FixedDecimal,
    FieldType::Float,
    FieldType::Double,
    FieldType::String,
    FieldType::WString,
    FieldType::V_String,
    FieldType::V_WString,
    FieldType::Date,
    FieldType::Time,
    FieldType::DateTime,
    FieldType::Blob,
    FieldType::SpatialObj,
];

impl FieldType {
    /// Returns the on-wire spelling of the type name.
    pub fn name(self) -> &'static str {
        match self {
            FieldType::Unknown => "Unknown",
            FieldType::Bool => "Bool",
            FieldType::Byte => "Byte",
            FieldType::Int16 => "Int16",
            FieldType::Int32 => "Int32",
            FieldType::Int64 => "Int64",
            FieldType::FixedDecimal => "FixedDecimal",
            FieldType::Float => "Float",
            FieldType::Double => "Double",
            FieldType::String => "String",
            FieldType::WString => "WString",
            FieldType::V_String => "V_String",
            FieldType::V_WString => "V_WString",
            FieldType::Date => "Date",
            FieldType::Time => "Time",
            FieldType::DateTime => "DateTime",
            FieldType::Blob => "Blob",
            FieldType::SpatialObj => "SpatialObj",
        }
    }

    /// Parses a type name case-insensitively.
    ///
    /// Empty and unrecognised names map to [`FieldType::Unknown`].
    pub fn from_name(name: &str) -> FieldType {
        if name.is_empty() {
            return FieldType::Unknown;
        }
        ALL_TYPES[1..]
            .iter()
            .copied()
            .find(|ft| ft.name().eq_ignore_ascii_case(name))
            .unwrap_or(FieldType::Unknown)
    }

    /// Ordinal used by the schema hash.
    pub fn ordinal(self) -> i32 {
        self as u8 as i32
    }

    /// Every concrete type, in ordinal order, excluding `Unknown`.
    pub fn all() -> &'static [FieldType] {
        &ALL_TYPES[1..]
    }

    pub fn is_bool(self) -> bool {
        self == FieldType::Bool
    }

    pub fn is_bool_or_integer(self) -> bool {
        self.is_bool() || self.is_integer()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            FieldType::Byte | FieldType::Int16 | FieldType::Int32 | FieldType::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, FieldType::Float | FieldType::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self == FieldType::FixedDecimal
    }

    pub fn is_string(self) -> bool {
        matches!(
            self,
            FieldType::String | FieldType::WString | FieldType::V_String | FieldType::V_WString
        )
    }

    pub fn is_string_or_date(self) -> bool {
        self.is_string() || self.is_date_or_time()
    }

    pub fn is_date_or_time(self) -> bool {
        matches!(self, FieldType::Date | FieldType::Time | FieldType::DateTime)
    }

    pub fn is_binary(self) -> bool {
        matches!(self, FieldType::Blob | FieldType::SpatialObj)
    }

    pub fn is_narrow_string(self) -> bool {
        matches!(self, FieldType::String | FieldType::V_String)
    }

    pub fn is_wide_string(self) -> bool {
        matches!(self, FieldType::WString | FieldType::V_WString)
    }

    pub fn is_variable_len_string(self) -> bool {
        matches!(self, FieldType::V_String | FieldType::V_WString)
    }

    /// True for types whose XML form carries no `size` attribute.
    pub fn has_implicit_size(self) -> bool {
        matches!(
            self,
            FieldType::Bool
                | FieldType::Byte
                | FieldType::Int16
                | FieldType::Int32
                | FieldType::Int64
                | FieldType::Float
                | FieldType::Double
                | FieldType::Date
                | FieldType::Time
                | FieldType::DateTime
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        match FieldType::from_name(&name) {
            FieldType::Unknown => Err(serde::de::Error::custom(format!(
                "Unknown field type: {}",
                name
            ))),
            ft => Ok(ft),
        }
    }
}
