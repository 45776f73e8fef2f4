//! Fixed-width numeric storage: little-endian value followed by one null
//! flag byte.

use super::Field;
use crate::error::RecordError;
use crate::record::{Record, RecordData};
use crate::text::{convert_to_double, double_to_string, float_to_string, latin1_to_string, parse_integer};
use crate::types::{FieldType, FieldVal};

/// Largest integer magnitude a `f32` holds exactly.
const FLOAT_EXACT_LIMIT: i64 = 1 << 24;
/// Largest integer magnitude a `f64` holds exactly.
const DOUBLE_EXACT_LIMIT: i64 = 1 << 53;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

fn width(field: &Field) -> usize {
    field.size() as usize
}

fn is_float(field: &Field) -> bool {
    field.field_type().is_float()
}

/// Inclusive range of an integer field type.
fn int_bounds(field_type: FieldType) -> (i64, i64) {
    match field_type {
        FieldType::Byte => (u8::MIN as i64, u8::MAX as i64),
        FieldType::Int16 => (i16::MIN as i64, i16::MAX as i64),
        FieldType::Int32 => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    }
}

fn round_half_away(value: f64) -> f64 {
    value + if value < 0.0 { -0.5 } else { 0.5 }
}

fn read(field: &Field, data: RecordData<'_>) -> FieldVal<Number> {
    let offset = field.offset();
    let zero = if is_float(field) {
        Number::Float(0.0)
    } else {
        Number::Int(0)
    };
    if data.read_u8(offset + width(field)) != 0 {
        return FieldVal::with_null(true, zero);
    }
    let Some(bytes) = data.slice(offset, width(field)) else {
        return FieldVal::with_null(true, zero);
    };
    let value = match field.field_type() {
        FieldType::Byte => Number::Int(bytes[0] as i64),
        FieldType::Int16 => Number::Int(i16::from_le_bytes([bytes[0], bytes[1]]) as i64),
        FieldType::Int32 => Number::Int(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64),
        FieldType::Float => {
            Number::Float(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64)
        }
        FieldType::Double => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Number::Float(f64::from_le_bytes(raw))
        }
        _ => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            Number::Int(i64::from_le_bytes(raw))
        }
    };
    FieldVal::new(value)
}

fn write(field: &Field, record: &mut Record, value: Number) {
    let field_type = field.field_type();
    let value = match value {
        Number::Float(v) if !field_type.is_float() => Number::Int(round_half_away(v) as i64),
        _ => value,
    };
    let offset = field.offset();
    let width = width(field);
    let out = &mut record.fixed_mut()[offset..offset + width + 1];
    match (field_type, value) {
        (FieldType::Byte, Number::Int(v)) => out[0] = v as u8,
        (FieldType::Int16, Number::Int(v)) => out[..2].copy_from_slice(&(v as i16).to_le_bytes()),
        (FieldType::Int32, Number::Int(v)) => out[..4].copy_from_slice(&(v as i32).to_le_bytes()),
        (FieldType::Float, Number::Int(v)) => out[..4].copy_from_slice(&(v as f32).to_le_bytes()),
        (FieldType::Float, Number::Float(v)) => out[..4].copy_from_slice(&(v as f32).to_le_bytes()),
        (FieldType::Double, Number::Int(v)) => out[..8].copy_from_slice(&(v as f64).to_le_bytes()),
        (FieldType::Double, Number::Float(v)) => out[..8].copy_from_slice(&v.to_le_bytes()),
        (_, Number::Int(v)) => out[..8].copy_from_slice(&v.to_le_bytes()),
        (_, Number::Float(_)) => {}
    }
    out[width] = 0;
}

/// Text form of a value read from this field.
fn value_text(field: &Field, value: Number) -> String {
    match value {
        Number::Int(v) => v.to_string(),
        Number::Float(v) if field.field_type() == FieldType::Float => float_to_string(v as f32),
        Number::Float(v) => double_to_string(v),
    }
}

fn report_does_not_fit(field: &Field, value_text: impl FnOnce() -> String, type_name: &str) {
    field.report_with(|| format!("{} does not fit in the type {}", value_text(), type_name));
}

pub(super) fn get_null(field: &Field, data: RecordData<'_>) -> bool {
    data.read_u8(field.offset() + width(field)) != 0
}

pub(super) fn set_null(field: &Field, record: &mut Record) -> Result<(), RecordError> {
    let offset = field.offset();
    let width = width(field);
    let out = &mut record.fixed_mut()[offset..offset + width + 1];
    out[..width].fill(0);
    out[width] = 1;
    Ok(())
}

pub(super) fn get_as_bool(field: &Field, data: RecordData<'_>) -> FieldVal<bool> {
    read(field, data).map(|n| match n {
        Number::Int(v) => v != 0,
        Number::Float(v) => v != 0.0,
    })
}

pub(super) fn get_as_int32(field: &Field, data: RecordData<'_>) -> FieldVal<i32> {
    let val = read(field, data);
    if val.is_null {
        return FieldVal::null();
    }
    let (min, max) = (i32::MIN as f64, i32::MAX as f64);
    match val.value {
        Number::Int(v) if v < i32::MIN as i64 || v > i32::MAX as i64 => {
            report_does_not_fit(field, || v.to_string(), "Int32");
            FieldVal::null()
        }
        Number::Int(v) => FieldVal::new(v as i32),
        Number::Float(v) if v > max || v < min => {
            report_does_not_fit(field, || value_text(field, val.value), "Int32");
            FieldVal::null()
        }
        Number::Float(v) => FieldVal::new(round_half_away(v) as i32),
    }
}

pub(super) fn get_as_int64(field: &Field, data: RecordData<'_>) -> FieldVal<i64> {
    let val = read(field, data);
    if val.is_null {
        return FieldVal::null();
    }
    match val.value {
        Number::Int(v) => FieldVal::new(v),
        Number::Float(v) if v >= i64::MAX as f64 || v < i64::MIN as f64 => {
            report_does_not_fit(field, || value_text(field, val.value), "Int64");
            FieldVal::null()
        }
        Number::Float(v) => FieldVal::new(round_half_away(v) as i64),
    }
}

pub(super) fn get_as_double(field: &Field, data: RecordData<'_>) -> FieldVal<f64> {
    let val = read(field, data);
    match val.value {
        Number::Int(v) => {
            if v > DOUBLE_EXACT_LIMIT || v < -DOUBLE_EXACT_LIMIT {
                report_does_not_fit(field, || v.to_string(), "Double");
            }
            FieldVal::with_null(val.is_null, v as f64)
        }
        Number::Float(v) => FieldVal::with_null(val.is_null, v),
    }
}

/// Text form; empty when null.
pub(super) fn get_as_text(field: &Field, data: RecordData<'_>) -> FieldVal<String> {
    let val = read(field, data);
    if val.is_null {
        FieldVal::with_null(true, String::new())
    } else {
        FieldVal::new(value_text(field, val.value))
    }
}

pub(super) fn set_from_int64(field: &Field, record: &mut Record, value: i64) -> Result<(), RecordError> {
    let field_type = field.field_type();
    if field_type.is_float() {
        let limit = if field_type == FieldType::Float {
            FLOAT_EXACT_LIMIT
        } else {
            DOUBLE_EXACT_LIMIT
        };
        if value > limit || value < -limit {
            report_does_not_fit(field, || value.to_string(), field_type.name());
        }
        write(field, record, Number::Int(value));
        return Ok(());
    }

    let (min, max) = int_bounds(field_type);
    if value < min || value > max {
        report_does_not_fit(field, || value.to_string(), field_type.name());
        return set_null(field, record);
    }
    write(field, record, Number::Int(value));
    Ok(())
}

pub(super) fn set_from_double(field: &Field, record: &mut Record, value: f64) -> Result<(), RecordError> {
    let field_type = field.field_type();
    if !field_type.is_float() {
        let (min, max) = int_bounds(field_type);
        if value.is_nan() || value > max as f64 || value < min as f64 {
            report_does_not_fit(field, || double_to_string(value), field_type.name());
            return set_null(field, record);
        }
    }
    write(field, record, Number::Float(value));
    Ok(())
}

pub(super) fn set_from_text(field: &Field, record: &mut Record, text: &[u8]) -> Result<(), RecordError> {
    if is_float(field) {
        return set_float_from_text(field, record, text);
    }

    if text.is_empty() {
        return set_null(field, record);
    }
    let field_type = field.field_type();
    let wide = field_type == FieldType::Int64;
    let (parse_min, parse_max) = if wide {
        (i64::MIN, i64::MAX)
    } else {
        (i32::MIN as i64, i32::MAX as i64)
    };
    let parsed = parse_integer(text, 10, parse_min, parse_max);
    let shown = || latin1_to_string(text);

    if parsed.overflow {
        let target = if wide { "Int64" } else { "Int32" };
        field.report_with(|| format!("{} does not fit in an {}.", shown(), target));
        return set_null(field, record);
    }
    if parsed.consumed == 0 {
        field.report_with(|| format!("{} is not a number.", shown()));
        return set_null(field, record);
    }
    if parsed.consumed != text.len() {
        if text[parsed.consumed] == b',' {
            field.report_with(|| {
                format!("{} stopped converting at a comma. It might be invalid.", shown())
            });
        } else {
            field.report_with(|| format!("{} was not fully converted", shown()));
        }
    }

    let (min, max) = int_bounds(field_type);
    if parsed.value < min || parsed.value > max {
        report_does_not_fit(field, shown, field_type.name());
        return set_null(field, record);
    }
    write(field, record, Number::Int(parsed.value));
    Ok(())
}

fn set_float_from_text(field: &Field, record: &mut Record, text: &[u8]) -> Result<(), RecordError> {
    if text.is_empty() {
        return set_null(field, record);
    }
    let shown = || latin1_to_string(text);
    let (value, consumed) = convert_to_double(text, b'.');
    if consumed == 0 || value.is_nan() {
        field.report_with(|| format!("{} is not a valid number.", shown()));
        return set_null(field, record);
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
    write(field, record, Number::Float(value));
    Ok(())
}
