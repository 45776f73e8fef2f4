//! Record layout: the ordered set of fields that make up a record.
//!
//! A [`RecordInfo`] owns its fields, assigns their byte offsets, keeps field
//! names unique, creates records, and round-trips the layout through the
//! `<RecordInfo>` XML form.

mod io;
pub(crate) mod validation;
mod xml;

use std::collections::HashMap;

use crate::config::RecordConfig;
use crate::engine::{MessageType, SharedCodec, SharedSink};
use crate::error::RecordError;
use crate::field::Field;
use crate::record::Record;
use crate::schema::{FieldSchema, XmlElement};
use crate::types::{FieldType, MAX_FIELDS_LIMIT, MAX_FIELD_LENGTH};

use validation::name_key;

/// Ordered field layout of a record.
pub struct RecordInfo {
    fields: Vec<Field>,
    /// Case-folded name to field index
    field_nums: HashMap<String, usize>,
    /// Names as requested, before duplicate renaming
    original_names: Vec<String>,
    fixed_size: usize,
    contains_var_data: bool,
    max_field_name_len: usize,
    strict_naming: bool,
    lock_in: bool,
    sink: Option<SharedSink>,
    codec: Option<SharedCodec>,
}

impl RecordInfo {
    /// Creates an empty layout.
    ///
    /// # Arguments
    /// * `max_field_name_len` - Names are truncated to this many characters
    /// * `strict_naming` - Restrict names to letters, digits and `_`
    /// * `sink` - Host sink for warnings and conversion errors
    pub fn new(max_field_name_len: usize, strict_naming: bool, sink: Option<SharedSink>) -> Self {
        Self {
            fields: Vec::new(),
            field_nums: HashMap::new(),
            original_names: Vec::new(),
            fixed_size: 0,
            contains_var_data: false,
            max_field_name_len,
            strict_naming,
            lock_in: false,
            sink,
            codec: None,
        }
    }

    /// Creates an empty layout using the naming rules from `config`.
    pub fn with_config(config: &RecordConfig, sink: Option<SharedSink>) -> Self {
        Self::new(config.max_field_name_len, config.strict_naming, sink)
    }

    pub(crate) fn output_message(&self, kind: MessageType, message: &str) {
        if let Some(sink) = &self.sink {
            sink.output_message(kind, message);
        }
    }

    /// Adds a field at the end of the layout.
    ///
    /// # Arguments
    /// * `schema` - The field to add; its name may be changed to keep
    ///   names unique
    ///
    /// # Returns
    /// The placed field, or an error for an invalid size or scale, too many
    /// fields, or a fixed region that would exceed the record ceiling.
    pub fn add_field(&mut self, schema: FieldSchema) -> Result<&Field, RecordError> {
        self.add_field_inner(schema, true)
    }

    /// Like [`RecordInfo::add_field`] without the duplicate-name warning.
    pub fn add_field_quiet(&mut self, schema: FieldSchema) -> Result<&Field, RecordError> {
        self.add_field_inner(schema, false)
    }

    /// Adds a field from its parts. A negative size is rejected.
    pub fn add_field_with(
        &mut self,
        name: &str,
        field_type: FieldType,
        size: i64,
        scale: i32,
        source: &str,
        description: &str,
    ) -> Result<&Field, RecordError> {
        if size < 0 {
            return Err(RecordError::ZeroLengthField {
                field: name.to_string(),
            });
        }
        let size = u32::try_from(size).map_err(|_| RecordError::FieldMakesRecordTooBig {
            limit: MAX_FIELD_LENGTH,
            size: size as u64,
            field: name.to_string(),
        })?;
        self.add_field(FieldSchema::with_metadata(
            name,
            field_type,
            size,
            scale,
            source,
            description,
        ))
    }

    /// Adds a field from a parsed `<Field .../>` element.
    pub fn add_field_from_xml(
        &mut self,
        element: &XmlElement<'_>,
        name_prefix: Option<&str>,
    ) -> Result<&Field, RecordError> {
        self.add_field(FieldSchema::from_xml_tag(element, name_prefix)?)
    }

    fn add_field_inner(
        &mut self,
        schema: FieldSchema,
        issue_warnings: bool,
    ) -> Result<&Field, RecordError> {
        if self.fields.len() >= MAX_FIELDS_LIMIT {
            return Err(RecordError::TooManyFields {
                limit: MAX_FIELDS_LIMIT,
            });
        }
        self.check_schema(&schema)?;
        let mut field = Field::new(schema)?;

        let total = self.fixed_size as u64 + field.raw_size() as u64;
        if total > MAX_FIELD_LENGTH as u64 {
            return Err(RecordError::FieldMakesRecordTooBig {
                limit: MAX_FIELD_LENGTH,
                size: total,
                field: field.name().to_string(),
            });
        }

        let position = self.fields.len();
        let requested = field.name().to_string();
        let name = self.with_name_journal(|info, journal| {
            info.validate_field_name(&requested, position, issue_warnings, journal)
        })?;
        field.schema_mut().set_name(name);
        field.schema_mut().set_position(position as i32);
        field.set_offset(self.fixed_size);
        field.set_message_sink(self.sink.clone());
        field.set_spatial_codec(self.codec.clone());

        self.fixed_size += field.raw_size();
        self.contains_var_data |= field.is_var_length();
        tracing::debug!(
            field = field.name(),
            field_type = %field.field_type(),
            offset = field.offset(),
            raw_size = field.raw_size(),
            fixed_size = self.fixed_size,
            "field added"
        );
        self.fields.push(field);
        Ok(&self.fields[position])
    }

    /// Creates an empty record sized for this layout.
    pub fn create_record(&self) -> Result<Record, RecordError> {
        Record::new(self.fixed_size, self.contains_var_data)
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Field at `index`.
    pub fn field(&self, index: usize) -> Result<&Field, RecordError> {
        self.fields
            .get(index)
            .ok_or(RecordError::FieldIndexOutOfRange {
                index,
                count: self.fields.len(),
            })
    }

    /// Size of the fixed region in bytes.
    pub fn fixed_size(&self) -> usize {
        self.fixed_size
    }

    pub fn contains_var_data(&self) -> bool {
        self.contains_var_data
    }

    pub fn max_field_name_len(&self) -> usize {
        self.max_field_name_len
    }

    pub fn strict_naming(&self) -> bool {
        self.strict_naming
    }

    /// Renames field `index`, keeping names unique.
    pub fn rename_field(&mut self, index: usize, new_name: &str) -> Result<&Field, RecordError> {
        let current = name_key(self.field(index)?.name());
        self.with_name_journal(|info, journal| {
            if info.field_nums.get(&current) == Some(&index) {
                info.remove_name_key(journal, &current);
            }
            let name = info.validate_field_name(new_name, index, true, journal)?;
            info.set_field_name(journal, index, name);
            Ok(())
        })?;
        Ok(&self.fields[index])
    }

    /// Renames the field currently called `old_name`.
    pub fn rename_field_by_name(
        &mut self,
        old_name: &str,
        new_name: &str,
    ) -> Result<&Field, RecordError> {
        let index = self.field_num(old_name)?;
        self.rename_field(index, new_name)
    }

    /// Renames several fields at once.
    ///
    /// All old names are released before any new name is assigned, so a
    /// batch may swap or rotate names.
    pub fn rename_fields<S: AsRef<str>>(&mut self, renames: &[(S, S)]) -> Result<(), RecordError> {
        let mut indexes = Vec::with_capacity(renames.len());
        for (old_name, _) in renames {
            indexes.push(self.field_num(old_name.as_ref())?);
        }
        self.with_name_journal(|info, journal| {
            for (old_name, _) in renames {
                info.remove_name_key(journal, &name_key(old_name.as_ref()));
            }
            for (index, (_, new_name)) in indexes.into_iter().zip(renames) {
                let name = info.validate_field_name(new_name.as_ref(), index, true, journal)?;
                info.set_field_name(journal, index, name);
            }
            Ok(())
        })
    }

    /// Exchanges the names of two fields.
    pub fn swap_field_names(&mut self, first: usize, second: usize) -> Result<(), RecordError> {
        let first_name = self.field(first)?.name().to_string();
        let second_name = self.field(second)?.name().to_string();
        self.fields[first].schema_mut().set_name(second_name.clone());
        self.fields[second].schema_mut().set_name(first_name.clone());
        self.field_nums.insert(name_key(&first_name), second);
        self.field_nums.insert(name_key(&second_name), first);
        Ok(())
    }

    /// Index of the field called `name`, ignoring case.
    pub fn field_num(&self, name: &str) -> Result<usize, RecordError> {
        self.field_num_opt(name).ok_or_else(|| RecordError::FieldMissing {
            field: name.to_string(),
        })
    }

    pub fn field_num_opt(&self, name: &str) -> Option<usize> {
        self.field_nums.get(&name_key(name)).copied()
    }

    pub fn field_by_name(&self, name: &str) -> Result<&Field, RecordError> {
        let index = self.field_num(name)?;
        Ok(&self.fields[index])
    }

    /// First field of `field_type` at or after `skip_to`.
    pub fn field_and_index_by_type(
        &self,
        field_type: FieldType,
        skip_to: usize,
    ) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .skip(skip_to)
            .find(|(_, field)| field.field_type() == field_type)
    }

    /// Index of the first field of `field_type`.
    pub fn field_num_by_type(&self, field_type: FieldType) -> Result<usize, RecordError> {
        self.field_and_index_by_type(field_type, 0)
            .map(|(index, _)| index)
            .ok_or(RecordError::FieldTypeNotFound { field_type })
    }

    /// First field of `field_type`.
    pub fn field_by_type(&self, field_type: FieldType) -> Result<&Field, RecordError> {
        self.field_and_index_by_type(field_type, 0)
            .map(|(_, field)| field)
            .ok_or(RecordError::FieldTypeNotFound { field_type })
    }

    pub fn fields_by_type(&self, field_type: FieldType) -> Vec<&Field> {
        self.fields
            .iter()
            .filter(|field| field.field_type() == field_type)
            .collect()
    }

    pub fn num_fields_by_type(&self, field_type: FieldType) -> usize {
        self.fields
            .iter()
            .filter(|field| field.field_type() == field_type)
            .count()
    }

    /// True when both layouts have the same fields, names included.
    pub fn compare_schemas(&self, other: &RecordInfo) -> bool {
        self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.schema().compare(b.schema()))
    }

    /// True when field types, sizes and scales match position by position.
    ///
    /// With `allow_additional_fields`, `other` may have extra trailing
    /// fields.
    pub fn equal_types(&self, other: &RecordInfo, allow_additional_fields: bool) -> bool {
        let count_ok = if allow_additional_fields {
            self.fields.len() <= other.fields.len()
        } else {
            self.fields.len() == other.fields.len()
        };
        count_ok
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.schema().equal_type(b.schema()))
    }

    /// Attaches a host sink to the layout and every field.
    pub fn set_message_sink(&mut self, sink: Option<SharedSink>) {
        for field in &self.fields {
            field.set_message_sink(sink.clone());
        }
        self.sink = sink;
    }

    pub fn message_sink(&self) -> Option<&SharedSink> {
        self.sink.as_ref()
    }

    /// Attaches a spatial codec to every field.
    pub fn set_spatial_codec(&mut self, codec: Option<SharedCodec>) {
        for field in &mut self.fields {
            field.set_spatial_codec(codec.clone());
        }
        self.codec = codec;
    }

    pub fn set_lock_in(&mut self, lock_in: bool) {
        self.lock_in = lock_in;
    }

    pub fn lock_in(&self) -> bool {
        self.lock_in
    }

    /// Changes the naming rules for later renames.
    pub fn reset_for_late_rename(&mut self, max_field_name_len: usize, strict_naming: bool) {
        self.max_field_name_len = max_field_name_len;
        self.strict_naming = strict_naming;
    }

    /// CRC-32 of the field count and every field's type, size and scale.
    pub fn hash(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&(self.fields.len() as u32).to_le_bytes());
        for field in &self.fields {
            hasher.update(&field.field_type().ordinal().to_le_bytes());
            hasher.update(&field.size().to_le_bytes());
            hasher.update(&field.scale().to_le_bytes());
        }
        hasher.finalize()
    }
}

impl Clone for RecordInfo {
    fn clone(&self) -> Self {
        let fields: Vec<Field> = self
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| {
                let mut copy = field.clone();
                copy.schema_mut().set_position(position as i32);
                copy
            })
            .collect();
        Self {
            fields,
            field_nums: self.field_nums.clone(),
            original_names: self.original_names.clone(),
            fixed_size: self.fixed_size,
            contains_var_data: self.contains_var_data,
            max_field_name_len: self.max_field_name_len,
            strict_naming: self.strict_naming,
            lock_in: self.lock_in,
            sink: self.sink.clone(),
            codec: self.codec.clone(),
        }
    }
}

impl PartialEq for RecordInfo {
    fn eq(&self, other: &Self) -> bool {
        self.compare_schemas(other)
    }
}

impl std::fmt::Debug for RecordInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordInfo")
            .field("fields", &self.fields)
            .field("fixed_size", &self.fixed_size)
            .field("contains_var_data", &self.contains_var_data)
            .field("lock_in", &self.lock_in)
            .finish()
    }
}

impl<'a> IntoIterator for &'a RecordInfo {
    type Item = &'a Field;
    type IntoIter = std::slice::Iter<'a, Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
