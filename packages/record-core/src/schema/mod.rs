//! Field schema: the name, type and dimensions of one column.

pub mod xml;

use serde::{Deserialize, Serialize};

use crate::error::RecordError;
use crate::text::parse_integer;
use crate::types::FieldType;

pub use xml::XmlElement;

/// Descriptor of a single field.
///
/// Type, size and scale form the field's identity. Name, source and
/// description are metadata that may change after the field is placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Index within the owning record info, -1 while detached
    #[serde(skip, default = "detached")]
    position: i32,
    name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    source: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default)]
    size: u32,
    #[serde(rename = "type")]
    field_type: FieldType,
    #[serde(default)]
    scale: i32,
}

fn detached() -> i32 {
    -1
}

impl FieldSchema {
    /// Creates a detached schema.
    pub fn new(name: impl Into<String>, field_type: FieldType, size: u32, scale: i32) -> Self {
        Self::with_metadata(name, field_type, size, scale, String::new(), String::new())
    }

    /// Creates a detached schema with source and description metadata.
    pub fn with_metadata(
        name: impl Into<String>,
        field_type: FieldType,
        size: u32,
        scale: i32,
        source: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            position: -1,
            name: name.into(),
            source: source.into(),
            description: description.into(),
            size,
            field_type,
            scale,
        }
    }

    /// Copy of this schema under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        self.retyped(name, self.field_type)
    }

    /// Copy of this schema with a new name and type.
    pub fn retyped(&self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.resized(name, field_type, self.size)
    }

    /// Copy of this schema with a new name, type and size.
    pub fn resized(&self, name: impl Into<String>, field_type: FieldType, size: u32) -> Self {
        self.rescaled(name, field_type, size, self.scale)
    }

    /// Copy of this schema with a new name, type, size and scale.
    pub fn rescaled(
        &self,
        name: impl Into<String>,
        field_type: FieldType,
        size: u32,
        scale: i32,
    ) -> Self {
        self.resourced(name, field_type, size, scale, self.source.clone())
    }

    /// Copy of this schema with a new name, type, size, scale and source.
    pub fn resourced(
        &self,
        name: impl Into<String>,
        field_type: FieldType,
        size: u32,
        scale: i32,
        source: impl Into<String>,
    ) -> Self {
        Self::with_metadata(
            name,
            field_type,
            size,
            scale,
            source,
            self.description.clone(),
        )
    }

    /// Parses a `<Field .../>` element.
    ///
    /// # Arguments
    /// * `element` - The parsed field element
    /// * `name_prefix` - Optional text prepended to the field name
    ///
    /// # Returns
    /// The detached schema, or an error for an unknown type, a missing
    /// required attribute, or a string field without a positive size.
    pub fn from_xml_tag(element: &XmlElement<'_>, name_prefix: Option<&str>) -> Result<Self, RecordError> {
        let type_name = element.required_attribute("type")?;
        let field_type = FieldType::from_name(type_name);
        if field_type == FieldType::Unknown {
            return Err(RecordError::UnknownFieldType {
                name: type_name.to_string(),
            });
        }

        let mut name = element.required_attribute("name")?.to_string();
        if let Some(prefix) = name_prefix {
            name.insert_str(0, prefix);
        }

        let size_text = element.attribute("size").unwrap_or("");
        let size = parse_integer(size_text.as_bytes(), 10, i32::MIN as i64, i32::MAX as i64).value;
        if size <= 0 && field_type.is_string() {
            return Err(RecordError::ZeroLengthField { field: name });
        }

        let source = element.attribute("source").unwrap_or("").to_string();
        let description = element.attribute("description").unwrap_or("").to_string();

        let mut scale = 0i64;
        if field_type == FieldType::FixedDecimal {
            let scale_text = match size_text.find('.') {
                Some(dot) => &size_text[dot + 1..],
                None => element.required_attribute("scale")?,
            };
            scale = parse_integer(scale_text.as_bytes(), 10, i32::MIN as i64, i32::MAX as i64).value;
        }

        Ok(Self::with_metadata(
            name,
            field_type,
            size.max(0) as u32,
            scale as i32,
            source,
            description,
        ))
    }

    /// Structural equality: type, case-insensitive name, size and scale.
    pub fn compare(&self, other: &FieldSchema) -> bool {
        self.field_type == other.field_type
            && names_equal(&self.name, &other.name)
            && self.size == other.size
            && self.scale == other.scale
    }

    /// Type, size and scale equality, ignoring the name.
    pub fn equal_type(&self, other: &FieldSchema) -> bool {
        self.field_type == other.field_type && self.size == other.size && self.scale == other.scale
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Index within the owning record info, or -1 when detached.
    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Stores the source as `scope:value`.
    pub fn set_source_scoped(&mut self, scope: &str, value: &str) {
        debug_assert!(!scope.contains(':'));
        self.source = format!("{}:{}", scope, value);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    pub(crate) fn set_size(&mut self, size: u32) {
        self.size = size;
    }

    pub(crate) fn set_scale(&mut self, scale: i32) {
        self.scale = scale;
    }
}

impl PartialEq for FieldSchema {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other)
    }
}

/// Case-insensitive field name comparison.
pub fn names_equal(a: &str, b: &str) -> bool {
    a.chars().map(fold).eq(b.chars().map(fold))
}

pub(crate) fn fold(c: char) -> char {
    c.to_uppercase().next().unwrap_or(c)
}
