//! Record-to-record copying.
//!
//! A [`RecordCopier`] is planned once for a pair of layouts and then run
//! for every record. Fields with identical storage are copied as raw bytes,
//! and neighbouring raw copies are merged into a single block move. Fields
//! whose type, size or scale differ go through the typed accessors.

use crate::config::RecordConfig;
use crate::error::RecordError;
use crate::field::{parse_double_reporting, Field};
use crate::record::{get_var_data_value, set_var_data_value, Record, RecordData};
use crate::record_info::RecordInfo;
use crate::types::{FieldType, FieldVal};

/// One step of a compiled copy plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CopyCmd {
    src_offset: usize,
    dest_offset: usize,
    /// Bytes moved by a raw copy
    len: usize,
    src_idx: usize,
    dest_idx: usize,
    /// Goes through the typed accessors
    is_field_change: bool,
    /// Same type, stored in the var-data region
    is_var_data: bool,
    var_data_max_bytes: usize,
}

impl CopyCmd {
    fn is_raw(&self) -> bool {
        !self.is_field_change && !self.is_var_data
    }
}

/// Copies fields from records of one layout into records of another.
///
/// # Example
/// ```ignore
/// let mut copier = RecordCopier::new(&dest_info, &src_info);
/// for i in 0..src_info.num_fields() {
///     copier.add(i, i);
/// }
/// copier.done_adding()?;
/// copier.copy(&mut dest_record, src_record.data())?;
/// ```
pub struct RecordCopier<'a> {
    dest: &'a RecordInfo,
    src: &'a RecordInfo,
    suppress_size_only_conv_errors: bool,
    decimal_sep: char,
    deferred: Vec<(usize, usize)>,
    commands: Vec<CopyCmd>,
}

impl<'a> RecordCopier<'a> {
    /// Creates a copier with `.` as the decimal separator.
    pub fn new(dest: &'a RecordInfo, src: &'a RecordInfo) -> Self {
        Self::with_options(dest, src, false, '.')
    }

    /// Creates a copier.
    ///
    /// # Arguments
    /// * `dest` - Layout of the records written
    /// * `src` - Layout of the records read
    /// * `suppress_size_only_conv_errors` - Silence conversion errors when
    ///   both fields have the same type and only size differs
    /// * `decimal_sep` - With `,`, text and numbers are converted with a
    ///   comma as the decimal point
    pub fn with_options(
        dest: &'a RecordInfo,
        src: &'a RecordInfo,
        suppress_size_only_conv_errors: bool,
        decimal_sep: char,
    ) -> Self {
        Self {
            dest,
            src,
            suppress_size_only_conv_errors,
            decimal_sep,
            deferred: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Creates a copier using the separator and suppression settings of
    /// `config`.
    pub fn with_config(dest: &'a RecordInfo, src: &'a RecordInfo, config: &RecordConfig) -> Self {
        Self::with_options(
            dest,
            src,
            config.suppress_size_only_conv_errors,
            config.decimal_separator,
        )
    }

    /// Queues a copy from source field `src_idx` to destination field
    /// `dest_idx`. Indexes are checked by [`RecordCopier::done_adding`].
    pub fn add(&mut self, dest_idx: usize, src_idx: usize) {
        self.deferred.push((dest_idx, src_idx));
    }

    /// True once anything has been added.
    pub fn is_valid(&self) -> bool {
        !self.deferred.is_empty() || !self.commands.is_empty()
    }

    /// Number of compiled commands.
    pub fn num_commands(&self) -> usize {
        self.commands.len()
    }

    fn plan(&self, dest_idx: usize, src_idx: usize) -> Result<CopyCmd, RecordError> {
        let src = self.src.field(src_idx)?;
        let dest = self.dest.field(dest_idx)?;
        let is_field_change = src.field_type() != dest.field_type()
            || src.raw_size() != dest.raw_size()
            || src.size() != dest.size()
            || (src.field_type() == FieldType::FixedDecimal && src.scale() != dest.scale());
        let is_var_data = !is_field_change && dest.is_var_length();
        Ok(CopyCmd {
            src_offset: src.offset(),
            dest_offset: dest.offset(),
            len: src.raw_size(),
            src_idx,
            dest_idx,
            is_field_change,
            is_var_data,
            var_data_max_bytes: if is_var_data { dest.max_bytes() } else { 0 },
        })
    }

    /// Compiles queued adds into the copy plan.
    ///
    /// Commands are ordered by source offset, and raw copies that are
    /// contiguous in both layouts are merged.
    pub fn done_adding(&mut self) -> Result<(), RecordError> {
        let mut commands = std::mem::take(&mut self.commands);
        for (dest_idx, src_idx) in std::mem::take(&mut self.deferred) {
            commands.push(self.plan(dest_idx, src_idx)?);
        }
        let planned = commands.len();
        commands.sort_by_key(|cmd| cmd.src_offset);

        let mut merged: Vec<CopyCmd> = Vec::with_capacity(commands.len());
        for cmd in commands {
            if let Some(prev) = merged.last_mut() {
                if prev.is_raw()
                    && cmd.is_raw()
                    && cmd.src_offset == prev.src_offset + prev.len
                    && cmd.dest_offset == prev.dest_offset + prev.len
                {
                    prev.len += cmd.len;
                    continue;
                }
            }
            merged.push(cmd);
        }
        tracing::debug!(
            planned,
            commands = merged.len(),
            "copy plan compiled"
        );
        self.commands = merged;
        Ok(())
    }

    /// Copies one record.
    ///
    /// `dest` is not reset first, so callers reuse a record by calling
    /// [`Record::reset`] between rows. Conversion problems null the
    /// destination field and go to its message sink; an error is only
    /// returned for structural problems.
    pub fn copy(&mut self, dest: &mut Record, src: RecordData<'_>) -> Result<(), RecordError> {
        if !self.deferred.is_empty() {
            self.done_adding()?;
        }
        if dest.fixed_size() != self.dest.fixed_size() {
            return Err(RecordError::LayoutMismatch {
                expected: self.dest.fixed_size(),
                actual: dest.fixed_size(),
            });
        }

        for cmd in &self.commands {
            if cmd.is_field_change {
                self.convert(cmd, dest, src)?;
            } else if cmd.is_var_data {
                let src_field = &self.src.fields()[cmd.src_idx];
                let dest_field = &self.dest.fields()[cmd.dest_idx];
                let value = get_var_data_value(src, src_field.offset())
                    .map(|bytes| &bytes[..bytes.len().min(cmd.var_data_max_bytes)]);
                set_var_data_value(dest, dest_field.offset(), value)?;
            } else {
                let bytes = src
                    .slice(cmd.src_offset, cmd.len)
                    .ok_or(RecordError::TruncatedRecord {
                        expected: cmd.src_offset + cmd.len,
                        actual: src.len(),
                    })?;
                dest.fixed_mut()[cmd.dest_offset..cmd.dest_offset + cmd.len]
                    .copy_from_slice(bytes);
            }
        }
        Ok(())
    }

    /// Sets every destination field to null.
    pub fn set_dest_to_null(&self, dest: &mut Record) -> Result<(), RecordError> {
        for field in self.dest {
            field.set_null(dest)?;
        }
        Ok(())
    }

    /// Swaps `.` and `,` in numeric text.
    pub fn convert_decimal_sep(text: &[u8]) -> Vec<u8> {
        text.iter()
            .map(|&c| match c {
                b'.' => b',',
                b',' => b'.',
                other => other,
            })
            .collect()
    }

    fn comma_decimal(&self) -> bool {
        self.decimal_sep == ','
    }

    fn convert(
        &self,
        cmd: &CopyCmd,
        dest: &mut Record,
        src: RecordData<'_>,
    ) -> Result<(), RecordError> {
        let src_field = &self.src.fields()[cmd.src_idx];
        let dest_field = &self.dest.fields()[cmd.dest_idx];

        let suppress = self.suppress_size_only_conv_errors
            && dest_field.field_type() == src_field.field_type();
        let saved = if suppress {
            dest_field.take_message_sink()
        } else {
            None
        };
        let result = self.convert_value(dest_field, src_field, dest, src);
        if suppress {
            dest_field.restore_message_sink(saved);
        }
        result
    }

    /// Writes the source text with `.` and `,` swapped, if it is not null.
    ///
    /// Returns false when the source was null and nothing was written.
    fn set_swapped(
        dest_field: &Field,
        src_field: &Field,
        dest: &mut Record,
        src: RecordData<'_>,
    ) -> Result<bool, RecordError> {
        let text = src_field.get_as_astring(src)?;
        if text.is_null {
            return Ok(false);
        }
        dest_field.set_from_astring(dest, &Self::convert_decimal_sep(&text.value))?;
        Ok(true)
    }

    fn convert_value(
        &self,
        dest_field: &Field,
        src_field: &Field,
        dest: &mut Record,
        src: RecordData<'_>,
    ) -> Result<(), RecordError> {
        let src_type = src_field.field_type();
        let numeric_text_source = matches!(
            src_type,
            FieldType::Double | FieldType::FixedDecimal | FieldType::Float
        );

        match dest_field.field_type() {
            FieldType::Bool => set_or_null(dest_field, dest, src_field.get_as_bool(src)?, |f, r, v| {
                f.set_from_bool(r, v)
            }),
            FieldType::Byte | FieldType::Int16 | FieldType::Int32 => {
                set_or_null(dest_field, dest, src_field.get_as_int32(src)?, |f, r, v| {
                    f.set_from_int32(r, v)
                })
            }
            FieldType::Int64 => set_or_null(dest_field, dest, src_field.get_as_int64(src)?, |f, r, v| {
                f.set_from_int64(r, v)
            }),
            FieldType::FixedDecimal => match src_type {
                FieldType::Byte | FieldType::Int16 | FieldType::Int32 => {
                    set_or_null(dest_field, dest, src_field.get_as_int32(src)?, |f, r, v| {
                        f.set_from_int32(r, v)
                    })
                }
                FieldType::Int64 => {
                    set_or_null(dest_field, dest, src_field.get_as_int64(src)?, |f, r, v| {
                        f.set_from_int64(r, v)
                    })
                }
                FieldType::Float | FieldType::Double => {
                    set_or_null(dest_field, dest, src_field.get_as_double(src)?, |f, r, v| {
                        f.set_from_double(r, v)
                    })
                }
                _ => {
                    if self.comma_decimal()
                        && src_type.is_string()
                        && Self::set_swapped(dest_field, src_field, dest, src)?
                    {
                        return Ok(());
                    }
                    set_astring(dest_field, src_field, dest, src)
                }
            },
            FieldType::Float | FieldType::Double => {
                if self.comma_decimal() && src_type.is_string() {
                    let text = src_field.get_as_astring(src)?;
                    let value = if text.is_null {
                        FieldVal::null()
                    } else {
                        parse_double_reporting(src_field, &text.value, b',')
                    };
                    set_or_null(dest_field, dest, value, |f, r, v| f.set_from_double(r, v))
                } else {
                    set_or_null(dest_field, dest, src_field.get_as_double(src)?, |f, r, v| {
                        f.set_from_double(r, v)
                    })
                }
            }
            FieldType::WString | FieldType::V_WString => {
                if self.comma_decimal()
                    && numeric_text_source
                    && Self::set_swapped(dest_field, src_field, dest, src)?
                {
                    return Ok(());
                }
                let text = src_field.get_as_wstring(src)?;
                if text.is_null {
                    dest_field.set_null(dest)
                } else {
                    dest_field.set_from_wstring(dest, &text.value)
                }
            }
            FieldType::String | FieldType::V_String => {
                if self.comma_decimal()
                    && numeric_text_source
                    && Self::set_swapped(dest_field, src_field, dest, src)?
                {
                    return Ok(());
                }
                set_astring(dest_field, src_field, dest, src)
            }
            FieldType::Date | FieldType::Time | FieldType::DateTime => {
                set_astring(dest_field, src_field, dest, src)
            }
            FieldType::Blob => {
                let blob = src_field.get_as_blob(src)?;
                if blob.is_null {
                    dest_field.set_null(dest)
                } else {
                    dest_field.set_from_blob(dest, blob.value)
                }
            }
            FieldType::SpatialObj => {
                let blob = src_field.get_as_spatial_blob(src)?;
                if blob.is_null {
                    dest_field.set_null(dest)
                } else {
                    dest_field.set_from_spatial_blob(dest, &blob.value)
                }
            }
            FieldType::Unknown => Ok(()),
        }
    }
}

fn set_or_null<T>(
    field: &Field,
    record: &mut Record,
    value: FieldVal<T>,
    set: impl FnOnce(&Field, &mut Record, T) -> Result<(), RecordError>,
) -> Result<(), RecordError> {
    if value.is_null {
        field.set_null(record)
    } else {
        set(field, record, value.value)
    }
}

fn set_astring(
    dest_field: &Field,
    src_field: &Field,
    dest: &mut Record,
    src: RecordData<'_>,
) -> Result<(), RecordError> {
    let text = src_field.get_as_astring(src)?;
    if text.is_null {
        dest_field.set_null(dest)
    } else {
        dest_field.set_from_astring(dest, &text.value)
    }
}
