//! Field name validation and per-type schema checks.

use super::RecordInfo;
use crate::engine::MessageType;
use crate::error::RecordError;
use crate::schema::{fold, names_equal, FieldSchema};
use crate::types::{FieldType, MAX_FIXED_DECIMAL_PRECISION, MAX_FIXED_LENGTH_STRING_SIZE};

/// Generated names tried before giving up on a duplicate.
const MAX_DUPLICATE_ATTEMPTS: u32 = 999;

/// Case-folded map key for a field name.
pub(crate) fn name_key(name: &str) -> String {
    name.chars().map(fold).collect()
}

fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
}

/// Suffix state carried across generated names.
struct Suffix {
    root: String,
    next: u32,
    multi_digit: bool,
    append9: bool,
}

impl Suffix {
    /// Picks the numbering scheme from how the conflicting name ends.
    fn for_name(name: &str) -> Self {
        let chars: Vec<char> = name.chars().collect();
        let len = chars.len();
        let last = chars.last().copied().unwrap_or(' ');
        if len >= 2 && !chars[len - 2].is_ascii_digit() && ('2'..='8').contains(&last) {
            // continue the single digit sequence
            Self {
                root: chars[..len - 1].iter().collect(),
                next: last as u32 - '0' as u32,
                multi_digit: false,
                append9: true,
            }
        } else if last.is_ascii_digit() {
            Self {
                root: format!("{}_", name),
                next: 1,
                multi_digit: true,
                append9: false,
            }
        } else {
            Self {
                root: name.to_string(),
                next: 1,
                multi_digit: false,
                append9: true,
            }
        }
    }

    fn next_name(&mut self, max_len: usize) -> String {
        self.next += 1;
        if self.next == 10 && !self.multi_digit {
            self.next = 2;
            if self.append9 {
                self.root.push('9');
            }
            self.root.push('_');
            self.multi_digit = true;
        }
        let digits = self.next.to_string();
        let mut name = self.root.clone();
        truncate_chars(&mut name, max_len.saturating_sub(digits.len()));
        name.push_str(&digits);
        name
    }
}

/// One reversible change made while assigning names.
enum NameChange {
    Key { key: String, previous: Option<usize> },
    Original { index: usize, previous: String },
    FieldName { index: usize, previous: String },
}

/// Changes made by one naming operation, replayed backwards if it fails.
#[derive(Default)]
pub(super) struct NameJournal {
    original_len: Option<usize>,
    changes: Vec<NameChange>,
}

impl RecordInfo {
    /// Runs a naming operation and restores the name state if it fails.
    pub(super) fn with_name_journal<T>(
        &mut self,
        op: impl FnOnce(&mut Self, &mut NameJournal) -> Result<T, RecordError>,
    ) -> Result<T, RecordError> {
        let mut journal = NameJournal::default();
        let result = op(self, &mut journal);
        if result.is_err() {
            self.rollback_names(journal);
        }
        result
    }

    fn rollback_names(&mut self, journal: NameJournal) {
        for change in journal.changes.into_iter().rev() {
            match change {
                NameChange::Key { key, previous: Some(index) } => {
                    self.field_nums.insert(key, index);
                }
                NameChange::Key { key, previous: None } => {
                    self.field_nums.remove(&key);
                }
                NameChange::Original { index, previous } => {
                    if let Some(slot) = self.original_names.get_mut(index) {
                        *slot = previous;
                    }
                }
                NameChange::FieldName { index, previous } => {
                    if let Some(field) = self.fields.get_mut(index) {
                        field.schema_mut().set_name(previous);
                    }
                }
            }
        }
        if let Some(len) = journal.original_len {
            self.original_names.truncate(len);
        }
    }

    fn insert_name_key(&mut self, journal: &mut NameJournal, key: String, index: usize) {
        let previous = self.field_nums.insert(key.clone(), index);
        journal.changes.push(NameChange::Key { key, previous });
    }

    pub(super) fn remove_name_key(&mut self, journal: &mut NameJournal, key: &str) {
        if let Some(previous) = self.field_nums.remove(key) {
            journal.changes.push(NameChange::Key {
                key: key.to_string(),
                previous: Some(previous),
            });
        }
    }

    pub(super) fn set_field_name(&mut self, journal: &mut NameJournal, index: usize, name: String) {
        let schema = self.fields[index].schema_mut();
        let previous = schema.name().to_string();
        schema.set_name(name);
        journal.changes.push(NameChange::FieldName { index, previous });
    }

    /// Applies the naming rules: empty names get a default, strict naming
    /// restricts the character set, and the length is capped.
    fn normalize_name(&self, name: &str) -> String {
        let mut name = if name.is_empty() {
            format!("Field_{}", self.fields.len() + 1)
        } else {
            name.to_string()
        };
        if self.strict_naming {
            let first = name.chars().next().unwrap_or('_');
            if !first.is_alphabetic() && first != '_' {
                name.insert(0, '_');
            }
        }
        truncate_chars(&mut name, self.max_field_name_len);
        if self.strict_naming {
            name = name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
        }
        name
    }

    /// Returns a unique name for field `field_num` and records it in the
    /// name map.
    ///
    /// When the name collides with a field whose current name was itself
    /// generated, the newcomer keeps the name and the older field is
    /// renamed again from its original name.
    pub(super) fn validate_field_name(
        &mut self,
        requested: &str,
        field_num: usize,
        issue_warnings: bool,
        journal: &mut NameJournal,
    ) -> Result<String, RecordError> {
        let mut name = self.normalize_name(requested);
        if self.original_names.len() <= field_num {
            journal.original_len.get_or_insert(self.original_names.len());
            self.original_names.resize(field_num + 1, String::new());
        }
        let previous = std::mem::replace(&mut self.original_names[field_num], name.clone());
        journal.changes.push(NameChange::Original {
            index: field_num,
            previous,
        });

        let mut dups = 0u32;
        let mut suffix: Option<Suffix> = None;
        loop {
            let Some(previous) = self.field_nums.get(&name_key(&name)).copied() else {
                break;
            };
            if dups == 0 {
                if !names_equal(&name, &self.original_names[previous]) {
                    self.insert_name_key(journal, name_key(&name), field_num);
                    let original = self.original_names[previous].clone();
                    let renamed = self.validate_field_name(&original, previous, false, journal)?;
                    self.set_field_name(journal, previous, renamed);
                    return Ok(name);
                }
                suffix = Some(Suffix::for_name(&name));
            }
            dups += 1;
            if dups >= MAX_DUPLICATE_ATTEMPTS {
                return Err(RecordError::UniqueNameExhausted {
                    field: requested.to_string(),
                    field_num: field_num + 1,
                    attempts: MAX_DUPLICATE_ATTEMPTS,
                });
            }
            if let Some(suffix) = suffix.as_mut() {
                name = suffix.next_name(self.max_field_name_len);
            }
        }

        if issue_warnings && dups > 0 {
            self.output_message(
                MessageType::Warning,
                &format!(
                    "There were multiple fields named \"{}\".  The duplicate was renamed.",
                    requested
                ),
            );
        }
        self.insert_name_key(journal, name_key(&name), field_num);
        Ok(name)
    }

    /// Checks type-specific size and scale rules before a field is placed.
    pub(super) fn check_schema(&self, schema: &FieldSchema) -> Result<(), RecordError> {
        let size = schema.size() as usize;
        match schema.field_type() {
            FieldType::FixedDecimal => {
                if size > MAX_FIXED_DECIMAL_PRECISION {
                    self.output_message(
                        MessageType::Error,
                        &format!(
                            "Fixed Decimal fields are limited to a precision of {} characters including the sign and decimal point.",
                            MAX_FIXED_DECIMAL_PRECISION
                        ),
                    );
                }
                if size == 0 {
                    return Err(RecordError::ZeroLengthField {
                        field: schema.name().to_string(),
                    });
                }
                let scale = schema.scale();
                // one character each for the sign and the decimal point
                if scale > 0 && (size < 2 || scale as usize > size - 2) {
                    return Err(RecordError::ScaleTooLarge {
                        field: schema.name().to_string(),
                        scale,
                        size: size as i64,
                    });
                }
            }
            FieldType::String | FieldType::WString => {
                if size == 0 {
                    return Err(RecordError::ZeroLengthField {
                        field: schema.name().to_string(),
                    });
                }
                if size > MAX_FIXED_LENGTH_STRING_SIZE {
                    let (fixed, var) = if schema.field_type() == FieldType::String {
                        ("String", "V_String")
                    } else {
                        ("WString", "V_WString")
                    };
                    self.output_message(
                        MessageType::Warning,
                        &format!(
                            "{} fields are limited to {} bytes.  Use a {} field instead.",
                            fixed, MAX_FIXED_LENGTH_STRING_SIZE, var
                        ),
                    );
                }
            }
            _ => {}
        }
        Ok(())
    }
}
