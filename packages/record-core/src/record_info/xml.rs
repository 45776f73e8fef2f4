//! `<RecordInfo>` XML form of a layout.
//!
//! Attributes are written in alphabetical order so generated text compares
//! equal to text that was parsed and rebuilt.

use super::RecordInfo;
use crate::error::RecordError;
use crate::schema::xml::{escape_attribute, find_element, find_elements};
use crate::schema::FieldSchema;
use crate::types::{FieldType, MAX_FIELD_LENGTH};

const RECORD_INFO_TAG: &str = "RecordInfo";
const FIELD_TAG: &str = "Field";

fn parse_bool_attribute(value: Option<&str>) -> bool {
    match value {
        Some(text) => {
            let text = text.trim();
            text.eq_ignore_ascii_case("true") || text == "1"
        }
        None => false,
    }
}

impl RecordInfo {
    /// Renders one `<Field .../>` line.
    ///
    /// Empty source and description are left out, `scale` is written only
    /// for FixedDecimal, and `size` only for types that have one.
    pub fn create_field_xml(
        name: &str,
        field_type: FieldType,
        size: u32,
        scale: i32,
        source: &str,
        description: &str,
    ) -> String {
        let mut out = String::from("\t<Field ");
        if !description.is_empty() {
            out.push_str(&format!("description=\"{}\" ", escape_attribute(description)));
        }
        out.push_str(&format!("name=\"{}\"", escape_attribute(name)));
        if field_type == FieldType::FixedDecimal {
            out.push_str(&format!(" scale=\"{}\"", scale));
        }

        // some callers pass the byte limit as a character count
        let size = if field_type == FieldType::V_WString {
            size.min((MAX_FIELD_LENGTH / 2) as u32)
        } else {
            size
        };
        if !field_type.has_implicit_size() {
            out.push_str(&format!(" size=\"{}\"", size));
        }
        if !source.is_empty() {
            out.push_str(&format!(" source=\"{}\"", escape_attribute(source)));
        }
        out.push_str(&format!(" type=\"{}\"/>\n", field_type.name()));
        out
    }

    /// Renders a schema as a `<Field .../>` line.
    pub fn field_xml(schema: &FieldSchema, include_source: bool) -> String {
        Self::create_field_xml(
            schema.name(),
            schema.field_type(),
            schema.size(),
            schema.scale(),
            if include_source { schema.source() } else { "" },
            schema.description(),
        )
    }

    /// Renders the whole layout as a `<RecordInfo>` block.
    pub fn record_xml_metadata(&self, include_source: bool) -> String {
        let mut out = if self.lock_in {
            String::from("<RecordInfo LockIn=\"True\" >\n")
        } else {
            String::from("<RecordInfo>\n")
        };
        for field in &self.fields {
            out.push_str(&Self::field_xml(field.schema(), include_source));
        }
        out.push_str("</RecordInfo>\n");
        out
    }

    /// Adds the fields of the first `<RecordInfo>` block in `xml`.
    ///
    /// # Arguments
    /// * `xml` - Text containing a `<RecordInfo>` element
    /// * `name_prefix` - Optional text prepended to every field name
    /// * `ignore_lock_in` - Skip the lock-in compatibility check
    ///
    /// # Returns
    /// `Ok(())` with no change when there is no `<RecordInfo>` element.
    /// Fields are appended to any already present.
    pub fn init_from_xml(
        &mut self,
        xml: &str,
        name_prefix: Option<&str>,
        ignore_lock_in: bool,
    ) -> Result<(), RecordError> {
        let Some(element) = find_element(xml, RECORD_INFO_TAG)? else {
            return Ok(());
        };
        let stream_lock_in = parse_bool_attribute(element.attribute("LockIn"));
        if !ignore_lock_in && self.lock_in != stream_lock_in {
            return Err(if self.lock_in {
                RecordError::LockInRequired
            } else {
                RecordError::LockInNotSupported
            });
        }

        let body = element.body.unwrap_or("");
        for field in find_elements(body, FIELD_TAG)? {
            self.add_field_from_xml(&field, name_prefix)?;
        }
        Ok(())
    }

    /// Builds a layout from XML using the given naming rules.
    pub fn from_xml(
        xml: &str,
        max_field_name_len: usize,
        strict_naming: bool,
    ) -> Result<Self, RecordError> {
        let mut info = Self::new(max_field_name_len, strict_naming, None);
        info.init_from_xml(xml, None, true)?;
        Ok(info)
    }
}
