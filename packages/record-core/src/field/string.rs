//! String storage shared by the text, fixed decimal and date/time fields.
//!
//! Fixed strings occupy `size * char_width` bytes followed by a null flag
//! byte. A value shorter than the field is terminated by a zero character.
//! Variable strings live in a var-data slot.

use std::borrow::Cow;

use super::{Field, Kind};
use crate::error::RecordError;
use crate::record::{get_var_data_value, set_var_data_value, Record, RecordData};
use crate::text::{
    convert_to_double, latin1_to_string, latin1_to_utf16, parse_integer, string_to_latin1,
    utf16_from_le_bytes, utf16_to_latin1, utf16_to_le_bytes,
};
use crate::types::FieldVal;

/// Longest value echoed in a truncation message for large var fields.
const TRUNCATED_ECHO_CHARS: usize = 97;
/// Longest value echoed in a spatial conversion message.
const SPATIAL_ECHO_CHARS: usize = 64;

/// Value as stored: Latin-1 bytes or UTF-16 units.
enum Stored<'a> {
    Narrow(&'a [u8]),
    Wide(Vec<u16>),
}

impl Stored<'_> {
    fn first_char(&self) -> Option<char> {
        match self {
            Stored::Narrow(bytes) => bytes.first().map(|&b| b as char),
            Stored::Wide(units) => units
                .first()
                .map(|&u| char::from_u32(u as u32).unwrap_or(char::REPLACEMENT_CHARACTER)),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Stored::Narrow(bytes) => bytes.is_empty(),
            Stored::Wide(units) => units.is_empty(),
        }
    }
}

fn is_wide(field: &Field) -> bool {
    matches!(field.kind, Kind::Text { wide: true, .. })
}

fn is_var(field: &Field) -> bool {
    matches!(field.kind, Kind::Text { var: true, .. })
}

fn char_width(field: &Field) -> usize {
    if is_wide(field) {
        2
    } else {
        1
    }
}

fn flag_offset(field: &Field) -> usize {
    field.offset() + field.size() as usize * char_width(field)
}

fn read<'a>(field: &Field, data: RecordData<'a>) -> FieldVal<Stored<'a>> {
    let raw = if is_var(field) {
        get_var_data_value(data, field.offset())
    } else if data.read_u8(flag_offset(field)) != 0 {
        None
    } else {
        data.slice(field.offset(), field.size() as usize * char_width(field))
    };
    let Some(raw) = raw else {
        return FieldVal::with_null(true, Stored::Narrow(&[]));
    };

    let stored = if is_wide(field) {
        let mut units = utf16_from_le_bytes(raw);
        if !is_var(field) {
            if let Some(end) = units.iter().position(|&u| u == 0) {
                units.truncate(end);
            }
        }
        Stored::Wide(units)
    } else if is_var(field) {
        Stored::Narrow(raw)
    } else {
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        Stored::Narrow(&raw[..end])
    };
    FieldVal::new(stored)
}

fn wide_text(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
fn echo(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    }
}

/// Narrows wide text, reporting characters with no Latin-1 form.
pub(super) fn narrow_reporting(field: &Field, text: &str) -> Vec<u8> {
    let (bytes, lossy) = string_to_latin1(text);
    if lossy {
        field.report_with(|| {
            format!(
                "\"{}\" could not be fully converted from a WString to a String.",
                text
            )
        });
    }
    bytes
}

fn report_truncated(field: &Field, shown: impl FnOnce() -> String) {
    field.report_with(|| format!("\"{}\" was truncated", shown()));
}

/// Writes `units` (bytes for narrow fields, UTF-16 units for wide) into
/// the field, truncating to the declared size.
fn write_units(
    field: &Field,
    record: &mut Record,
    len: usize,
    bytes_of: impl Fn(usize) -> Vec<u8>,
    shown: impl Fn() -> String,
) -> Result<(), RecordError> {
    let size = field.size() as usize;
    if len > size {
        if is_var(field) && size > 100 {
            report_truncated(field, || {
                let mut cut: String = shown().chars().take(TRUNCATED_ECHO_CHARS).collect();
                cut.push_str("...");
                cut
            });
        } else {
            report_truncated(field, &shown);
        }
    }
    let kept = len.min(size);
    let payload = bytes_of(kept);

    if is_var(field) {
        return set_var_data_value(record, field.offset(), Some(&payload));
    }

    let width = char_width(field);
    let offset = field.offset();
    let flag = flag_offset(field);
    let fixed = record.fixed_mut();
    fixed[flag] = 0;
    fixed[offset..offset + payload.len()].copy_from_slice(&payload);
    if kept < size {
        let end = offset + kept * width;
        fixed[end..end + width].fill(0);
    }
    Ok(())
}

fn write_narrow(field: &Field, record: &mut Record, bytes: &[u8]) -> Result<(), RecordError> {
    write_units(
        field,
        record,
        bytes.len(),
        |kept| bytes[..kept].to_vec(),
        || latin1_to_string(bytes),
    )
}

fn write_wide(field: &Field, record: &mut Record, units: &[u16]) -> Result<(), RecordError> {
    write_units(
        field,
        record,
        units.len(),
        |kept| utf16_to_le_bytes(&units[..kept]),
        || wide_text(units),
    )
}

/// Writes plain ASCII text such as a formatted number.
pub(super) fn set_from_text(field: &Field, record: &mut Record, text: &str) -> Result<(), RecordError> {
    if is_wide(field) {
        let units: Vec<u16> = text.encode_utf16().collect();
        write_wide(field, record, &units)
    } else {
        write_narrow(field, record, text.as_bytes())
    }
}

/// Writes narrow text without any format validation.
pub(super) fn store_narrow(field: &Field, record: &mut Record, bytes: &[u8]) -> Result<(), RecordError> {
    write_narrow(field, record, bytes)
}

pub(super) fn get_null(field: &Field, data: RecordData<'_>) -> bool {
    if is_var(field) {
        get_var_data_value(data, field.offset()).is_none()
    } else {
        data.read_u8(flag_offset(field)) != 0
    }
}

pub(super) fn set_null(field: &Field, record: &mut Record) -> Result<(), RecordError> {
    if is_var(field) {
        set_var_data_value(record, field.offset(), None)
    } else {
        let flag = flag_offset(field);
        record.fixed_mut()[flag] = 1;
        Ok(())
    }
}

/// Tests the first character: a non-zero digit or `T` is true.
pub(super) fn get_as_bool(field: &Field, data: RecordData<'_>) -> FieldVal<bool> {
    let val = read(field, data);
    if val.is_null {
        return FieldVal::null();
    }
    FieldVal::new(val.value.first_char().is_some_and(super::boolean::test_char))
}

/// Narrow form of the stored value, without conversion reports.
fn narrow_quiet<'a>(stored: &'a Stored<'a>) -> Cow<'a, [u8]> {
    match stored {
        Stored::Narrow(bytes) => Cow::Borrowed(*bytes),
        Stored::Wide(units) => Cow::Owned(utf16_to_latin1(units).0),
    }
}

fn get_integer(field: &Field, data: RecordData<'_>, wide: bool) -> FieldVal<i64> {
    let val = read(field, data);
    if val.is_null || val.value.is_empty() {
        return FieldVal::null();
    }
    let text = narrow_quiet(&val.value);
    let base = if text.len() > 1 && text[0] == b'0' && (text[1] == b'x' || text[1] == b'X') {
        16
    } else {
        10
    };
    let (min, max) = if wide {
        (i64::MIN, i64::MAX)
    } else {
        (i32::MIN as i64, i32::MAX as i64)
    };
    let parsed = parse_integer(&text, base, min, max);
    let shown = || latin1_to_string(&text);

    if parsed.overflow {
        let target = if wide { "Int64" } else { "Int32" };
        field.report_with(|| format!("{} does not fit in an {}.", shown(), target));
        return FieldVal::null();
    }
    if parsed.consumed == 0 {
        field.report_with(|| format!("{} is not a number.", shown()));
        return FieldVal::null();
    }
    if parsed.consumed != text.len() {
        if text[parsed.consumed] == b',' {
            field.report_with(|| {
                format!("{} stopped converting at a comma. It might be invalid.", shown())
            });
        } else {
            field.report_with(|| format!("{} lost information in translation", shown()));
        }
    }
    FieldVal::new(parsed.value)
}

pub(super) fn get_as_int32(field: &Field, data: RecordData<'_>) -> FieldVal<i32> {
    get_integer(field, data, false).map(|v| v as i32)
}

pub(super) fn get_as_int64(field: &Field, data: RecordData<'_>) -> FieldVal<i64> {
    get_integer(field, data, true)
}

/// Parses `text` as a double, reporting partial or failed conversions on
/// `field`. Empty text is null without a report.
pub(crate) fn parse_double_reporting(field: &Field, text: &[u8], sep: u8) -> FieldVal<f64> {
    if text.is_empty() {
        return FieldVal::null();
    }
    let shown = || latin1_to_string(text);
    let (value, consumed) = convert_to_double(text, sep);
    if consumed == 0 || value.is_nan() {
        field.report_with(|| format!("{} is not a valid number.", shown()));
        return FieldVal::null();
    }
    if consumed != text.len() {
        if text[consumed] == b',' {
            field.report_with(|| {
                format!("{} stopped converting at a comma. It might be invalid.", shown())
            });
        } else {
            field.report_with(|| format!("{} lost information in translation", shown()));
        }
    }
    FieldVal::new(value)
}

pub(super) fn get_as_double(field: &Field, data: RecordData<'_>) -> FieldVal<f64> {
    let val = read(field, data);
    if val.is_null {
        return FieldVal::null();
    }
    parse_double_reporting(field, &narrow_quiet(&val.value), b'.')
}

pub(super) fn get_as_astring(field: &Field, data: RecordData<'_>) -> FieldVal<Vec<u8>> {
    let val = read(field, data);
    if val.is_null {
        return FieldVal::with_null(true, Vec::new());
    }
    match val.value {
        Stored::Narrow(bytes) => FieldVal::new(bytes.to_vec()),
        Stored::Wide(units) => FieldVal::new(narrow_reporting(field, &wide_text(&units))),
    }
}

pub(super) fn get_as_wstring(field: &Field, data: RecordData<'_>) -> FieldVal<String> {
    let val = read(field, data);
    if val.is_null {
        return FieldVal::with_null(true, String::new());
    }
    match val.value {
        Stored::Narrow(bytes) => FieldVal::new(latin1_to_string(bytes)),
        Stored::Wide(units) => FieldVal::new(wide_text(&units)),
    }
}

/// Raw bytes: the whole fixed area, or the var-data payload.
pub(super) fn get_as_blob<'a>(field: &Field, data: RecordData<'a>) -> FieldVal<&'a [u8]> {
    let raw = if is_var(field) {
        get_var_data_value(data, field.offset())
    } else if data.read_u8(flag_offset(field)) != 0 {
        None
    } else {
        data.slice(field.offset(), field.size() as usize * char_width(field))
    };
    match raw {
        Some(bytes) => FieldVal::new(bytes),
        None => FieldVal::null(),
    }
}

/// Parses GeoJSON text through the spatial codec.
pub(super) fn get_as_spatial_blob<'a>(field: &Field, data: RecordData<'a>) -> FieldVal<Cow<'a, [u8]>> {
    let text = get_as_wstring(field, data);
    if text.is_null || text.value.is_empty() {
        return FieldVal::null();
    }
    let Some(codec) = field.codec() else {
        return FieldVal::null();
    };
    match codec.from_geojson(&text.value) {
        Some(blob) if !blob.is_empty() => FieldVal::new(Cow::Owned(blob)),
        _ => {
            field.report_with(|| {
                format!(
                    "No conversion from {} to SpatialObj",
                    echo(&text.value, SPATIAL_ECHO_CHARS)
                )
            });
            FieldVal::null()
        }
    }
}

pub(super) fn set_from_astring(field: &Field, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
    if is_wide(field) {
        write_wide(field, record, &latin1_to_utf16(value))
    } else {
        write_narrow(field, record, value)
    }
}

pub(super) fn set_from_wstring(field: &Field, record: &mut Record, value: &str) -> Result<(), RecordError> {
    if is_wide(field) {
        let units: Vec<u16> = value.encode_utf16().collect();
        write_wide(field, record, &units)
    } else {
        let bytes = narrow_reporting(field, value);
        write_narrow(field, record, &bytes)
    }
}

/// Stores raw bytes as characters: one byte per narrow character, two
/// little-endian bytes per wide character.
pub(super) fn set_from_blob(field: &Field, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
    if is_wide(field) {
        write_wide(field, record, &utf16_from_le_bytes(value))
    } else {
        write_narrow(field, record, value)
    }
}

/// Stores the GeoJSON form of a spatial blob, or null when it has none.
pub(super) fn set_from_spatial_blob(field: &Field, record: &mut Record, value: &[u8]) -> Result<(), RecordError> {
    let geojson = field.codec().and_then(|codec| codec.to_geojson(value));
    match geojson {
        Some(text) => field.set_from_wstring(record, &text),
        None => set_null(field, record),
    }
}
